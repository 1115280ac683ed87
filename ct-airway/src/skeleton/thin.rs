//! (26, 6) 简单点的方向性顺序细化.
//!
//! 每一轮依次处理六个方向. 在方向 `d` 的子轮中, 候选点是在 `d` 方向上的 6-邻居为背景的前景点,
//! 候选点按行优先顺序逐个复查, 仍是简单点且不是曲线端点的即被删除.
//! 某一轮没有删除任何点时结束.
//!
//! 删除简单点不改变前景的 26-连通性和背景的 6-连通性, 因此连通域、隧道与空腔个数都保持不变.

use itertools::iproduct;
use ndarray::Array3;
use once_cell::sync::Lazy;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::morph::{shift, Offset3d};
use crate::{Idx3d, Mask};

/// 3x3x3 邻域在 [`Cube`] 中的顺序. 下标 `(dz + 1) * 9 + (dh + 1) * 3 + (dw + 1)`.
static CUBE: Lazy<Vec<Offset3d>> =
    Lazy::new(|| iproduct!(-1isize..=1, -1isize..=1, -1isize..=1).collect());

/// 中心点下标.
const CENTER: usize = 13;

/// 3x3x3 邻域 (中心除外) 内每个位置的 26-邻居.
static ADJ26: Lazy<Vec<Vec<usize>>> = Lazy::new(|| adjacency(|d| d >= 1, |_| true));

/// 18-邻域 (中心除外) 内每个位置在 18-邻域内的 6-邻居.
static ADJ6_IN18: Lazy<Vec<Vec<usize>>> = Lazy::new(|| adjacency(|d| d == 1, |m| m <= 2));

/// 中心的 6 个面邻居下标.
const FACES: [usize; 6] = [4, 10, 12, 14, 16, 22];

/// 六个细化方向, 依次为上下北南西东.
const DIRECTIONS: [Offset3d; 6] = [
    (-1, 0, 0),
    (1, 0, 0),
    (0, -1, 0),
    (0, 1, 0),
    (0, 0, -1),
    (0, 0, 1),
];

type Cube = [bool; 27];

/// 切比雪夫距离为 1 的两个位置之间, 按曼哈顿距离 `d` 满足 `link` 的建立邻接;
/// 只考虑到中心曼哈顿距离满足 `within` 的非中心位置.
fn adjacency(link: impl Fn(usize) -> bool, within: impl Fn(usize) -> bool) -> Vec<Vec<usize>> {
    let manhattan = |(z, h, w): Offset3d| z.unsigned_abs() + h.unsigned_abs() + w.unsigned_abs();
    let chebyshev = |(z, h, w): Offset3d| z.abs().max(h.abs()).max(w.abs());
    let member = |i: usize| i != CENTER && within(manhattan(CUBE[i]));

    (0..27)
        .map(|i| {
            if !member(i) {
                return Vec::new();
            }
            (0..27)
                .filter(|&j| j != i && member(j))
                .filter(|&j| {
                    let (a, b) = (CUBE[i], CUBE[j]);
                    let diff = (a.0 - b.0, a.1 - b.1, a.2 - b.2);
                    chebyshev(diff) == 1 && link(manhattan(diff))
                })
                .collect()
        })
        .collect()
}

/// 读取 `pos` 的 3x3x3 邻域. 网格外视为背景.
fn cube(data: &Array3<bool>, pos: Idx3d) -> Cube {
    let shape = data.dim();
    let mut ans = [false; 27];
    for (v, off) in ans.iter_mut().zip(CUBE.iter()) {
        *v = shift(pos, *off, shape).is_some_and(|p| data[p]);
    }
    ans
}

/// 在 `adj` 邻接下, 从 `seeds` 中属于 `set` 的位置出发, 统计可达的连通分量个数.
fn components(set: &Cube, adj: &[Vec<usize>], seeds: impl IntoIterator<Item = usize>) -> usize {
    let mut seen = [false; 27];
    let mut stack = Vec::with_capacity(27);
    let mut count = 0;
    for s in seeds {
        if !set[s] || seen[s] {
            continue;
        }
        count += 1;
        seen[s] = true;
        stack.push(s);
        while let Some(cur) = stack.pop() {
            for &n in adj[cur].iter() {
                if set[n] && !seen[n] {
                    seen[n] = true;
                    stack.push(n);
                }
            }
        }
    }
    count
}

/// 中心点是否为 (26, 6) 简单点.
///
/// 1. 26-邻域内的前景恰好构成一个 26-连通分量;
/// 2. 18-邻域内的背景中, 与中心 6-相邻的部分恰好构成一个 6-连通分量.
pub(crate) fn is_simple(c: &Cube) -> bool {
    let fg = {
        let mut s = *c;
        s[CENTER] = false;
        s
    };
    if components(&fg, &ADJ26, 0..27) != 1 {
        return false;
    }
    let bg = c.map(|v| !v);
    components(&bg, &ADJ6_IN18, FACES) == 1
}

/// 中心点是否为曲线端点 (恰有一个 26-邻居).
#[inline]
pub(crate) fn is_end_point(c: &Cube) -> bool {
    c.iter().enumerate().filter(|&(i, v)| i != CENTER && *v).count() == 1
}

#[inline]
fn removable(c: &Cube) -> bool {
    !is_end_point(c) && is_simple(c)
}

/// 对 `mask` 做细化. 结果是 `mask` 的子集, 且拓扑不变.
pub fn thin(mask: &Mask) -> Mask {
    let mut data = mask.data().to_owned();
    let shape = data.dim();
    let mut fg = mask.positions();

    loop {
        let mut removed = 0;
        for dir in DIRECTIONS {
            let candidates: Vec<Idx3d> = {
                let data = &data;
                let pick = |&pos: &Idx3d| {
                    let open = shift(pos, dir, shape).map_or(true, |p| !data[p]);
                    open && removable(&cube(data, pos))
                };
                cfg_if::cfg_if! {
                    if #[cfg(feature = "rayon")] {
                        fg.par_iter().copied().filter(|p| pick(p)).collect()
                    } else {
                        fg.iter().copied().filter(|p| pick(p)).collect()
                    }
                }
            };
            for pos in candidates {
                if removable(&cube(&data, pos)) {
                    data[pos] = false;
                    removed += 1;
                }
            }
            fg.retain(|p| data[*p]);
        }
        if removed == 0 {
            break;
        }
    }

    Mask::from_positions(mask, fg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Spacing;

    fn cube_of(offsets: &[Offset3d]) -> Cube {
        let mut c = [false; 27];
        c[CENTER] = true;
        for off in offsets {
            let i = CUBE.iter().position(|o| o == off).unwrap();
            c[i] = true;
        }
        c
    }

    #[test]
    fn test_tables() {
        assert_eq!(CUBE[CENTER], (0, 0, 0));
        assert!(FACES.iter().all(|&i| {
            let (z, h, w) = CUBE[i];
            z.abs() + h.abs() + w.abs() == 1
        }));
        // 26-邻域 (去中心) 内, 面邻居有 16 个 26-邻居, 顶点邻居有 6 个.
        assert_eq!(ADJ26[4].len(), 16);
        assert_eq!(ADJ26[0].len(), 6);
        // 18-邻域内, 面邻居有 4 个 6-邻居 (棱邻居), 棱邻居有 2 个, 顶点不在其中.
        assert_eq!(ADJ6_IN18[4].len(), 4);
        assert_eq!(ADJ6_IN18[1].len(), 2);
        assert!(ADJ6_IN18[0].is_empty());
    }

    #[test]
    fn test_simple_points() {
        // 孤立点: 不是简单点.
        assert!(!is_simple(&cube_of(&[])));
        // 曲线内部点: 删除会断开曲线.
        assert!(!is_simple(&cube_of(&[(-1, 0, 0), (1, 0, 0)])));
        // 曲线端点是简单点, 但要保留.
        let end = cube_of(&[(1, 0, 0)]);
        assert!(is_simple(&end) && is_end_point(&end));
        // 平面上的边缘点是简单点.
        assert!(is_simple(&cube_of(&[(0, 0, 1), (0, 1, 0), (0, 1, 1)])));
        // 全前景邻域的中心: 删除会产生空腔.
        let full = [true; 27];
        assert!(!is_simple(&full));
    }

    #[test]
    fn test_thin_box_to_curve() {
        let mut m = Mask::new(
            Array3::from_elem((20, 7, 7), false),
            Spacing::isotropic(1.0).unwrap(),
        );
        for (z, h, w) in iproduct!(2..18, 2..5, 2..5) {
            m[(z, h, w)] = true;
        }
        let t = thin(&m);
        assert!(t.is_subset_of(&m));
        assert!(t.count() >= 2 && t.count() < 20);
        assert_eq!(crate::morph::label(&t, crate::morph::Connectivity::Full26).count(), 1);
        // 细化结果中没有可以继续删除的点.
        let data = t.data().to_owned();
        assert!(t.positions().iter().all(|&p| !removable(&cube(&data, p))));
    }
}
