//! 二值掩膜的精化操作. 每个操作都消费一个掩膜的引用并产生新的掩膜,
//! 对任意合法输入都会终止且不会出错.

use std::collections::VecDeque;

use ndarray::{Array3, Axis};

use super::{is_at_border, label, neighbours, shift, Ball, Connectivity};
use crate::{Areas3d, Idx3d, Mask, VoxelGrid};

/// 以半径为 `radius` 的球形结构元膨胀. 网格外视为背景.
pub fn dilate(mask: &Mask, radius: usize) -> Mask {
    if radius == 0 {
        return mask.clone();
    }
    let ball = Ball::new(radius);
    let shape = mask.shape();
    Mask::from_fn(mask, |pos| {
        mask[pos]
            || ball
                .offsets()
                .iter()
                .any(|off| shift(pos, *off, shape).is_some_and(|p| mask[p]))
    })
}

/// 以半径为 `radius` 的球形结构元腐蚀.
///
/// 落在网格外的结构元部分被忽略 (不会导致腐蚀), 因此 [`dilate`] 与本函数在有限网格上互为伴随,
/// 由它们组成的 [`closing`] 是幂等的.
pub fn erode(mask: &Mask, radius: usize) -> Mask {
    if radius == 0 {
        return mask.clone();
    }
    let ball = Ball::new(radius);
    let shape = mask.shape();
    Mask::from_fn(mask, |pos| {
        mask[pos]
            && ball
                .offsets()
                .iter()
                .all(|off| shift(pos, *off, shape).map_or(true, |p| mask[p]))
    })
}

/// 闭运算: 先膨胀后腐蚀. 填补小于结构元的缝隙, 而不会使掩膜整体变胖.
#[inline]
pub fn closing(mask: &Mask, radius: usize) -> Mask {
    erode(&dilate(mask, radius), radius)
}

/// 填充被前景完全包围的背景空洞.
///
/// 从网格六个表面上的背景体素出发, 按 6-邻接规则在背景中扩散.
/// 无法到达的背景体素被改为前景, 可到达的外部背景保持不变.
pub fn fill_holes(mask: &Mask) -> Mask {
    let shape = mask.shape();
    let mut reached = Array3::from_elem(shape, false);
    let mut bfs_q: VecDeque<Idx3d> = mask
        .data()
        .indexed_iter()
        .filter_map(|(pos, &fg)| (!fg && is_at_border(pos, shape)).then_some(pos))
        .collect();
    for pos in bfs_q.iter() {
        reached[*pos] = true;
    }

    while let Some(cur) = bfs_q.pop_front() {
        for neigh in neighbours(cur, Connectivity::Face6, shape) {
            if !mask[neigh] && !reached[neigh] {
                reached[neigh] = true;
                bfs_q.push_back(neigh);
            }
        }
    }

    Mask::from_fn(mask, |pos| mask[pos] || !reached[pos])
}

/// 去除体素个数小于 `min_voxels` 的连通域.
#[inline]
pub fn remove_small_objects(mask: &Mask, min_voxels: usize, conn: Connectivity) -> Mask {
    split_small_objects(mask, min_voxels, conn).0
}

/// 同 [`remove_small_objects`], 但同时返回被去除的连通域, 按编号顺序排列.
pub fn split_small_objects(mask: &Mask, min_voxels: usize, conn: Connectivity) -> (Mask, Areas3d) {
    let (kept, rejected): (Areas3d, Areas3d) = label(mask, conn)
        .into_areas()
        .into_iter()
        .partition(|area| area.len() >= min_voxels);
    let kept = Mask::from_positions(mask, kept.into_iter().flatten());
    (kept, rejected)
}

/// 将头侧前 `top` 张和足侧后 `bottom` 张水平切片全部置为背景.
///
/// 两者之和超过切片数时, 结果为空掩膜.
pub fn trim_slices(mask: &Mask, top: usize, bottom: usize) -> Mask {
    let len_z = mask.len_z();
    let mut ans = mask.clone();
    let mut data = ans.data_mut();
    for z in (0..top.min(len_z)).chain(len_z.saturating_sub(bottom)..len_z) {
        data.index_axis_mut(Axis(0), z).fill(false);
    }
    ans
}

/// 只保留体素个数最多的 `n` 个连通域. 体积相同时, 首体素行优先序靠前者优先.
pub fn keep_largest(mask: &Mask, n: usize, conn: Connectivity) -> Mask {
    let lv = label(mask, conn);
    let keep = lv.ranked().into_iter().take(n);
    Mask::from_positions(
        mask,
        keep.filter_map(|id| lv.area(id))
            .flat_map(|area| area.iter().copied()),
    )
}

/// 去除与水平切片边缘 (高/宽方向的四个表面) 26-相连的前景连通域, 例如体外空气.
///
/// 头足方向的两个表面不参与判断, 因为扫描范围本身就可能截断解剖结构.
pub fn clear_border(mask: &Mask) -> Mask {
    let (_, lh, lw) = mask.shape();
    let touches = |&(_, h, w): &Idx3d| h == 0 || w == 0 || h + 1 == lh || w + 1 == lw;
    let lv = label(mask, Connectivity::Full26);
    Mask::from_positions(
        mask,
        lv.areas()
            .iter()
            .filter(|area| !area.iter().any(touches))
            .flat_map(|area| area.iter().copied()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Spacing;

    fn blank(shape: Idx3d) -> Mask {
        Mask::new(Array3::from_elem(shape, false), Spacing::isotropic(1.0).unwrap())
    }

    /// 线性同余伪随机掩膜, 前景比例约为 `percent`%.
    fn noisy(shape: Idx3d, seed: u64, percent: u64) -> Mask {
        let mut state = seed;
        let data = Array3::from_shape_fn(shape, |_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) % 100 < percent
        });
        Mask::new(data, Spacing::isotropic(1.0).unwrap())
    }

    fn hollow_cube(shape: Idx3d, lo: usize, hi: usize) -> Mask {
        let mut m = blank(shape);
        for (pos, v) in m.data_mut().indexed_iter_mut() {
            let (z, h, w) = pos;
            let inside = |c: usize| (lo..=hi).contains(&c);
            let on_face = [z, h, w].iter().any(|&c| c == lo || c == hi);
            *v = inside(z) && inside(h) && inside(w) && on_face;
        }
        m
    }

    #[test]
    fn test_closing_idempotent() {
        for seed in 1..=4 {
            let m = noisy((12, 12, 12), seed, 35);
            for r in 1..=2 {
                let once = closing(&m, r);
                assert_eq!(closing(&once, r), once, "seed {seed}, radius {r}");
                assert!(m.is_subset_of(&once));
            }
        }
    }

    #[test]
    fn test_fill_holes_idempotent() {
        for seed in 1..=4 {
            let m = noisy((10, 10, 10), seed, 55);
            let once = fill_holes(&m);
            assert_eq!(fill_holes(&once), once);
            assert!(m.is_subset_of(&once));
        }
    }

    #[test]
    fn test_remove_small_objects_idempotent() {
        for seed in 1..=4 {
            let m = noisy((10, 10, 10), seed, 20);
            for conn in [Connectivity::Face6, Connectivity::Full26] {
                let once = remove_small_objects(&m, 4, conn);
                assert_eq!(remove_small_objects(&once, 4, conn), once);
                assert!(once.is_subset_of(&m));
            }
        }
    }

    #[test]
    fn test_fill_holes_cavity_only() {
        let shell = hollow_cube((9, 9, 9), 2, 6);
        let filled = fill_holes(&shell);
        // 内部 3x3x3 空腔被填满, 外部背景不变.
        assert_eq!(filled.count(), 5 * 5 * 5);
        assert!(filled[(4, 4, 4)]);
        assert!(!filled[(0, 0, 0)]);
        assert!(!filled[(1, 4, 4)]);

        // 打开一个面上的孔后, 空腔与外部连通, 不再被填充.
        let mut open = shell.clone();
        open[(2, 4, 4)] = false;
        assert_eq!(fill_holes(&open), open);
    }

    #[test]
    fn test_closing_bridges_gap() {
        // 两根 3x3 截面的方柱, 沿 w 方向相隔一个体素.
        let mut m = blank((7, 7, 11));
        for (z, h, w) in itertools::iproduct!(2..5, 2..5, (1..5).chain(6..10)) {
            m[(z, h, w)] = true;
        }
        let closed = closing(&m, 1);
        assert!(closed[(3, 3, 5)]);
        assert_eq!(closed.count(), m.count() + 1);
    }

    #[test]
    fn test_dilate_erode_radius_zero_is_identity() {
        let m = noisy((5, 5, 5), 9, 50);
        assert_eq!(dilate(&m, 0), m);
        assert_eq!(erode(&m, 0), m);
        assert!(erode(&m, 1).is_subset_of(&m));
        assert!(m.is_subset_of(&dilate(&m, 1)));
    }

    #[test]
    fn test_split_small_objects() {
        let mut m = blank((6, 6, 6));
        m.fill_batch([(0, 0, 0), (0, 0, 1), (0, 0, 2), (5, 5, 5)], true);
        let (kept, rejected) = split_small_objects(&m, 2, Connectivity::Full26);
        assert_eq!(kept.count(), 3);
        assert_eq!(rejected, vec![vec![(5, 5, 5)]]);
    }

    #[test]
    fn test_trim_slices() {
        let mut m = blank((6, 2, 2));
        m.data_mut().fill(true);
        let t = trim_slices(&m, 1, 2);
        assert_eq!(t.count(), 3 * 4);
        assert!(!t[(0, 0, 0)] && t[(1, 0, 0)] && t[(3, 1, 1)] && !t[(4, 1, 1)]);
        assert!(trim_slices(&m, 4, 4).is_empty());
        assert_eq!(trim_slices(&t, 1, 2), t);
    }

    #[test]
    fn test_keep_largest_and_clear_border() {
        let mut m = blank((5, 8, 8));
        // 三个连通域: 5 体素 (触碰 h = 0), 3 体素, 2 体素.
        m.fill_batch((0..5).map(|z| (z, 0, 3)), true);
        m.fill_batch([(2, 4, 2), (2, 4, 3), (2, 4, 4)], true);
        m.fill_batch([(1, 6, 6), (2, 6, 6)], true);

        assert_eq!(keep_largest(&m, 1, Connectivity::Full26).count(), 5);
        assert_eq!(keep_largest(&m, 2, Connectivity::Full26).count(), 8);
        assert_eq!(keep_largest(&m, 9, Connectivity::Full26), m);

        let cleared = clear_border(&m);
        assert_eq!(cleared.count(), 5);
        assert!(!cleared[(2, 0, 3)]);
    }
}
