//! 骨架化: 将二值掩膜约简为单体素宽、拓扑不变的中轴.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::{debug, warn};

use crate::config::SkeletonConfig;
use crate::morph::{keep_largest, Connectivity};
use crate::{Idx3d, Idx3dF, Mask, Result, Spacing, VoxelGrid};

mod thin;
pub mod topology;

pub use thin::thin;
pub use topology::{betti, Betti};

/// 骨架: 一组有序的体素索引, 以及来源掩膜的网格.
///
/// 骨架中的每个体素在来源掩膜中都是前景.
#[derive(Clone, Debug, PartialEq)]
pub struct Skeleton {
    points: Vec<Idx3d>,
    spacing: Spacing,
    shape: Idx3d,
    edge_trimmed: usize,
}

impl VoxelGrid for Skeleton {
    #[inline]
    fn shape(&self) -> Idx3d {
        self.shape
    }

    #[inline]
    fn spacing(&self) -> Spacing {
        self.spacing
    }
}

/// 对 `mask` 做骨架化.
///
/// 依次执行: 细化, 边缘裁剪, 保留最大 26-连通域. 空掩膜得到空骨架.
pub fn skeletonize(mask: &Mask, cfg: &SkeletonConfig) -> Skeleton {
    if mask.is_empty() {
        return Skeleton::empty_like(mask);
    }
    if margin_covers_grid(mask.shape(), cfg.edge_margin) {
        warn!(
            "edge margin {:?} covers the whole {:?} grid, skeleton will be empty",
            cfg.edge_margin,
            mask.shape()
        );
    }
    let thinned = thin(mask);
    let (trimmed, edge_trimmed) = trim_edges(&thinned, cfg.edge_margin);
    let kept = keep_largest(&trimmed, 1, Connectivity::Full26);
    debug!(
        "skeleton: {} -> {} voxels ({} trimmed at edges)",
        mask.count(),
        kept.count(),
        edge_trimmed
    );

    Skeleton {
        points: kept.positions(),
        spacing: mask.spacing(),
        shape: mask.shape(),
        edge_trimmed,
    }
}

/// 位置 `pos` 沿每个轴 `a` 到网格两侧表面的较近距离是否都不小于 `margin[a]`?
#[inline]
pub fn within_margin(pos: Idx3d, shape: Idx3d, margin: [usize; 3]) -> bool {
    let dist = |c: usize, len: usize| c.min(len.saturating_sub(c + 1));
    dist(pos.0, shape.0) >= margin[0]
        && dist(pos.1, shape.1) >= margin[1]
        && dist(pos.2, shape.2) >= margin[2]
}

/// 是否没有任何位置满足 [`within_margin`]? 即某个轴的长度不超过 `2 * margin`.
#[inline]
pub fn margin_covers_grid(shape: Idx3d, margin: [usize; 3]) -> bool {
    let covers = |len: usize, m: usize| len <= m.saturating_mul(2);
    covers(shape.0, margin[0]) || covers(shape.1, margin[1]) || covers(shape.2, margin[2])
}

/// 去掉距离网格表面过近的前景体素. 返回新掩膜与被去掉的体素个数.
pub fn trim_edges(mask: &Mask, margin: [usize; 3]) -> (Mask, usize) {
    let shape = mask.shape();
    let ans = Mask::from_fn(mask, |pos| mask[pos] && within_margin(pos, shape, margin));
    let trimmed = mask.count() - ans.count();
    (ans, trimmed)
}

impl Skeleton {
    /// 与 `grid` 同网格的空骨架.
    pub fn empty_like<G: VoxelGrid + ?Sized>(grid: &G) -> Self {
        Self {
            points: Vec::new(),
            spacing: grid.spacing(),
            shape: grid.shape(),
            edge_trimmed: 0,
        }
    }

    /// 全部骨架点, 按行优先顺序排列.
    #[inline]
    pub fn points(&self) -> &[Idx3d] {
        &self.points
    }

    /// 骨架点个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// 是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 边缘裁剪去掉的体素个数.
    #[inline]
    pub fn edge_trimmed(&self) -> usize {
        self.edge_trimmed
    }

    /// `pos` 是否为骨架点.
    #[inline]
    pub fn contains(&self, pos: &Idx3d) -> bool {
        self.points.binary_search(pos).is_ok()
    }

    /// 全部骨架点的物理坐标 (毫米), 即索引逐分量乘以分辨率.
    pub fn physical_points(&self) -> Vec<Idx3dF> {
        self.points.iter().map(|&p| self.physical(p)).collect()
    }

    /// 转换为同网格的掩膜.
    pub fn to_mask(&self) -> Mask {
        let mut ans = Mask::new(ndarray::Array3::from_elem(self.shape, false), self.spacing);
        ans.fill_batch(self.points.iter().copied(), true);
        ans
    }

    /// 将物理坐标以 `z,h,w` 文本格式写入 `w`, 每行一个点, 首行为表头.
    pub fn write_points_to<W: Write>(&self, mut w: W) -> Result<()> {
        writeln!(w, "z_mm,h_mm,w_mm")?;
        for [z, h, x] in self.physical_points() {
            writeln!(w, "{z:.4},{h:.4},{x:.4}")?;
        }
        w.flush()?;
        Ok(())
    }

    /// 同 [`Self::write_points_to`], 写入 `path` 指定的文件.
    pub fn write_points<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_points_to(BufWriter::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::iproduct;
    use ndarray::Array3;

    fn blank(shape: Idx3d) -> Mask {
        Mask::new(Array3::from_elem(shape, false), Spacing::isotropic(1.0).unwrap())
    }

    #[test]
    fn test_empty_mask_gives_empty_skeleton() {
        let m = blank((4, 4, 4));
        let s = skeletonize(&m, &SkeletonConfig::default());
        assert!(s.is_empty());
        assert_eq!(s.shape(), (4, 4, 4));
        assert_eq!(s.edge_trimmed(), 0);
    }

    #[test]
    fn test_edge_trim_at_default_margin() {
        let shape = (300, 300, 300);
        let margin = SkeletonConfig::default().edge_margin;
        assert!(!within_margin((119, 150, 150), shape, margin));
        assert!(within_margin((120, 150, 150), shape, margin));
        assert!(within_margin((179, 120, 179), shape, margin));
        assert!(!within_margin((180, 150, 150), shape, margin));
        assert!(!within_margin((150, 150, 299), shape, margin));

        // 沿 z 的一条线, 只有 120..=139 保留.
        let mut line = blank((260, 1, 1));
        line.fill_batch((0..260).map(|z| (z, 0, 0)), true);
        let (kept, trimmed) = trim_edges(&line, [120, 0, 0]);
        assert_eq!(kept.count(), 20);
        assert_eq!(trimmed, 240);
        assert!(kept[(120, 0, 0)] && kept[(139, 0, 0)]);
        assert!(!kept[(119, 0, 0)] && !kept[(140, 0, 0)]);
    }

    #[test]
    fn test_margin_covering_the_grid() {
        let margin = SkeletonConfig::default().edge_margin;
        assert!(margin_covers_grid((200, 512, 512), margin));
        assert!(margin_covers_grid((240, 512, 512), margin));
        assert!(!margin_covers_grid((241, 512, 512), margin));
        assert!(!margin_covers_grid((4, 4, 4), [0; 3]));
        assert!(margin_covers_grid((4, 4, 4), [0, 2, 0]));

        // 与 within_margin 一致: 覆盖时没有任何位置保留.
        let mut m = blank((9, 9, 9));
        for (z, h, w) in iproduct!(2..7, 2..7, 2..7) {
            m[(z, h, w)] = true;
        }
        let s = skeletonize(&m, &SkeletonConfig::with_margin(5));
        assert!(margin_covers_grid(m.shape(), [5; 3]));
        assert!(s.is_empty());
        assert!(s.edge_trimmed() > 0);
    }

    #[test]
    fn test_skeleton_is_subset_and_keeps_largest() {
        let mut m = blank((16, 16, 16));
        for (z, h, w) in iproduct!(2..14, 3..6, 3..6) {
            m[(z, h, w)] = true;
        }
        for (z, h, w) in iproduct!(4..7, 10..13, 10..13) {
            m[(z, h, w)] = true;
        }
        let s = skeletonize(&m, &SkeletonConfig::with_margin(0));
        assert!(!s.is_empty());
        assert!(s.to_mask().is_subset_of(&m));
        assert!(s.points().iter().all(|&(_, h, _)| h < 6));
        assert!(s.points().windows(2).all(|p| p[0] < p[1]));
        assert!(s.contains(&s.points()[0]));
    }

    #[test]
    fn test_topology_is_preserved() {
        let ball = Mask::new(
            Array3::from_shape_fn((16, 16, 16), |(z, h, w)| {
                let d = |c: usize| (c as f64 - 8.0).powi(2);
                d(z) + d(h) + d(w) <= 25.0
            }),
            Spacing::isotropic(1.0).unwrap(),
        );
        let torus = Mask::new(
            Array3::from_shape_fn((32, 32, 32), |(z, h, w)| {
                let rho = ((h as f64 - 16.0).powi(2) + (w as f64 - 16.0).powi(2)).sqrt();
                (rho - 8.0).powi(2) + (z as f64 - 16.0).powi(2) <= 9.0
            }),
            Spacing::isotropic(1.0).unwrap(),
        );
        let cfg = SkeletonConfig::with_margin(0);

        let b = betti(&ball);
        assert_eq!((b.components, b.tunnels), (1, 0));
        let s = skeletonize(&ball, &cfg);
        assert_eq!(betti(&s.to_mask()), b);
        assert!(s.len() < ball.count() / 10);

        let b = betti(&torus);
        assert_eq!((b.components, b.tunnels, b.cavities), (1, 1, 0));
        let s = skeletonize(&torus, &cfg);
        assert_eq!(betti(&s.to_mask()), b);
        assert!(s.len() < torus.count() / 10);
    }

    #[test]
    fn test_write_points() {
        let mut m = Mask::new(
            Array3::from_elem((3, 3, 3), false),
            Spacing::new(2.5, 0.5, 0.5).unwrap(),
        );
        m[(1, 1, 1)] = true;
        let s = skeletonize(&m, &SkeletonConfig::with_margin(0));
        assert_eq!(s.physical_points(), vec![[2.5, 0.5, 0.5]]);

        let mut buf = Vec::new();
        s.write_points_to(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "z_mm,h_mm,w_mm\n2.5000,0.5000,0.5000\n");
    }
}
