//! 二值掩膜的拓扑度量.
//!
//! 把每个前景体素看作闭单位立方体, 它们的并构成一个立方复形.
//! 复形的欧拉示性数为 `χ = b0 - b1 + b2`, 其中 `b0` 为 26-连通域个数,
//! `b2` 为被前景包围的 6-连通背景区域 (空腔) 个数, 从而得到隧道个数 `b1`.

use itertools::iproduct;
use ndarray::Array3;

use crate::morph::{is_at_border, label, Connectivity};
use crate::{Mask, VoxelGrid};

/// 拓扑不变量.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Betti {
    /// 连通域个数 (26-邻接).
    pub components: usize,

    /// 隧道 (环柄) 个数.
    pub tunnels: usize,

    /// 空腔个数 (6-邻接背景).
    pub cavities: usize,
}

/// 闭立方复形的欧拉示性数.
///
/// 在两倍分辨率的网格上, 体素 `(z, h, w)` 的闭立方体由坐标 `(2z + a, 2h + b, 2w + c)`,
/// `a, b, c ∈ {0, 1, 2}` 的 27 个胞腔组成, 胞腔的维数等于其奇数坐标的个数.
pub fn euler_characteristic(mask: &Mask) -> i64 {
    let (lz, lh, lw) = mask.shape();
    let mut cells = Array3::from_elem((2 * lz + 1, 2 * lh + 1, 2 * lw + 1), false);
    for (z, h, w) in mask.positions() {
        for (a, b, c) in iproduct!(0..3, 0..3, 0..3) {
            cells[(2 * z + a, 2 * h + b, 2 * w + c)] = true;
        }
    }
    cells
        .indexed_iter()
        .filter(|&(_, &v)| v)
        .map(|((z, h, w), _)| match (z % 2) + (h % 2) + (w % 2) {
            0 | 2 => 1,
            _ => -1,
        })
        .sum()
}

/// 计算 `mask` 的拓扑不变量. 空掩膜的结果全为 0.
pub fn betti(mask: &Mask) -> Betti {
    let components = label(mask, Connectivity::Full26).count();
    if components == 0 {
        return Betti::default();
    }

    let shape = mask.shape();
    let background = Mask::from_fn(mask, |pos| !mask[pos]);
    let cavities = label(&background, Connectivity::Face6)
        .areas()
        .iter()
        .filter(|area| !area.iter().any(|&p| is_at_border(p, shape)))
        .count();

    let chi = euler_characteristic(mask);
    let tunnels = (components + cavities) as i64 - chi;
    Betti {
        components,
        tunnels: tunnels.max(0) as usize,
        cavities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Spacing;

    fn mask_from(shape: (usize, usize, usize), f: impl Fn(f64, f64, f64) -> bool) -> Mask {
        let data = Array3::from_shape_fn(shape, |(z, h, w)| f(z as f64, h as f64, w as f64));
        Mask::new(data, Spacing::isotropic(1.0).unwrap())
    }

    #[test]
    fn test_single_voxel_and_empty() {
        let empty = mask_from((3, 3, 3), |_, _, _| false);
        assert_eq!(betti(&empty), Betti::default());
        let dot = mask_from((3, 3, 3), |z, h, w| (z, h, w) == (1.0, 1.0, 1.0));
        assert_eq!(euler_characteristic(&dot), 1);
        assert_eq!(
            betti(&dot),
            Betti {
                components: 1,
                tunnels: 0,
                cavities: 0
            }
        );
    }

    #[test]
    fn test_ring_and_hollow_cube() {
        // 3x3 方环: 一个隧道.
        let ring = mask_from((3, 5, 5), |z, h, w| {
            z == 1.0 && (1.0..=3.0).contains(&h) && (1.0..=3.0).contains(&w) && (h, w) != (2.0, 2.0)
        });
        assert_eq!(betti(&ring).tunnels, 1);
        assert_eq!(betti(&ring).components, 1);

        // 空心立方体: 一个空腔.
        let hollow = mask_from((7, 7, 7), |z, h, w| {
            let inside = |c: f64| (1.0..=5.0).contains(&c);
            let face = [z, h, w].iter().any(|&c| c == 1.0 || c == 5.0);
            inside(z) && inside(h) && inside(w) && face
        });
        let b = betti(&hollow);
        assert_eq!((b.components, b.tunnels, b.cavities), (1, 0, 1));
    }

    #[test]
    fn test_diagonal_voxels_are_one_component() {
        let m = mask_from((3, 3, 3), |z, h, w| z == h && h == w && z < 2.0);
        assert_eq!(euler_characteristic(&m), 1);
        assert_eq!(betti(&m).components, 1);
    }
}
