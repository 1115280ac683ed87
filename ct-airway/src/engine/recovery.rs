//! 细分支回收.
//!
//! 被 "去除小连通域" 丢掉的碎片里有一部分是远端细支气管: 它们只是因为部分容积效应
//! 与主气道断开. 这里把与主气道足够近的碎片整体并回主气道.

use log::debug;
use ordered_float::OrderedFloat;
use rstar::primitives::GeomWithData;
use rstar::RTree;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::config::RecoveryConfig;
use crate::morph::{neighbours, Connectivity};
use crate::{Area3d, Areas3d, Error, Idx3d, Idx3dF, Mask, Result, VoxelGrid};

/// R 树中的点: 物理坐标 + 体素索引.
type IndexedPoint = GeomWithData<Idx3dF, Idx3d>;

/// 回收候选碎片: 一个被丢弃的连通域.
#[derive(Clone, Debug)]
pub struct Fragment {
    voxels: Area3d,
    centroid: Idx3dF,
}

impl Fragment {
    /// 由 `grid` 上的体素列表构建碎片. 列表为空时返回 `None`.
    pub fn new<G: VoxelGrid + ?Sized>(grid: &G, voxels: Area3d) -> Option<Self> {
        if voxels.is_empty() {
            return None;
        }
        let n = voxels.len() as f64;
        let mut centroid = [0.0; 3];
        for p in voxels.iter().map(|&v| grid.physical(v)) {
            centroid.iter_mut().zip(p).for_each(|(c, x)| *c += x / n);
        }
        Some(Self { voxels, centroid })
    }

    /// 全部体素.
    #[inline]
    pub fn voxels(&self) -> &[Idx3d] {
        &self.voxels
    }

    /// 物理质心 (毫米).
    #[inline]
    pub fn centroid(&self) -> Idx3dF {
        self.centroid
    }

    /// 体素个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    /// 是否不含体素. 由 [`Fragment::new`] 创建的碎片总是非空的.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }
}

/// 一个被合并的碎片.
#[derive(Clone, Debug, PartialEq)]
pub struct MergedFragment {
    /// 在第几轮 (从 0 开始) 被合并.
    pub pass: usize,

    /// 体素个数.
    pub size: usize,

    /// 物理质心 (毫米).
    pub centroid: Idx3dF,

    /// 合并时到主气道的最小物理距离 (毫米).
    pub distance_mm: f64,
}

/// 细分支回收报告.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecoveryReport {
    /// 实际执行的合并轮次.
    pub passes: usize,

    /// 被合并的碎片, 按合并顺序排列.
    pub merged: Vec<MergedFragment>,

    /// 最终仍未合并的碎片个数.
    pub rejected: usize,

    /// 主气道新增的体素个数 (包括桥接体素).
    pub voxels_added: usize,
}

/// 某碎片到主气道的最近体素对.
#[derive(Copy, Clone, Debug)]
struct Nearest {
    dist2: f64,
    from: Idx3d,
    to: Idx3d,
}

/// 把 `candidates` 中与 `main` 足够近的碎片并入 `main`.
///
/// 每一轮对所有待定碎片计算其任一体素到当前主气道的最小物理距离,
/// 距离严格小于 `cfg.proximity_mm` 的碎片整体并入, 新体素随即加入空间索引,
/// 因此下一轮中离新并入碎片足够近的碎片也会被并入. 某一轮没有任何合并时收敛.
///
/// 前景体素数在每一轮中单调不减, 且不会超过 `main` 与全部碎片 (及桥接体素) 之和.
/// 若执行 `cfg.max_passes` 轮合并后仍有碎片在门限内, 返回 [`Error::RecoveryDiverged`].
pub fn recover_thin_branches(
    main: &Mask,
    candidates: Areas3d,
    cfg: &RecoveryConfig,
) -> Result<(Mask, RecoveryReport)> {
    let mut mask = main.clone();
    let mut report = RecoveryReport::default();
    let mut pending: Vec<Fragment> = candidates
        .into_iter()
        .filter_map(|area| Fragment::new(main, area))
        .collect();
    let mut tree = RTree::bulk_load(surface_points(main));
    let threshold2 = cfg.proximity_mm * cfg.proximity_mm;

    let mut pass = 0;
    loop {
        let nearest = nearest_all(&tree, &pending, main);
        let (near, far): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .zip(nearest)
            .partition(|(_, n)| n.is_some_and(|n| n.dist2 < threshold2));

        if near.is_empty() {
            report.passes = pass;
            report.rejected = far.len();
            report.voxels_added = mask.count() - main.count();
            debug!(
                "thin-branch recovery converged after {pass} passes: {} merged, {} rejected",
                report.merged.len(),
                report.rejected
            );
            return Ok((mask, report));
        }
        if pass == cfg.max_passes {
            return Err(Error::RecoveryDiverged {
                passes: pass,
                pending: near.len(),
            });
        }

        for (frag, n) in near {
            let Some(n) = n else { continue };
            let bridge: Vec<Idx3d> = if cfg.bridge_gaps {
                voxel_line(n.from, n.to).collect()
            } else {
                Vec::new()
            };
            for &pos in frag.voxels().iter().chain(bridge.iter()) {
                if !mask[pos] {
                    mask[pos] = true;
                    tree.insert(IndexedPoint::new(main.physical(pos), pos));
                }
            }
            report.merged.push(MergedFragment {
                pass,
                size: frag.len(),
                centroid: frag.centroid(),
                distance_mm: n.dist2.sqrt(),
            });
        }
        pending = far.into_iter().map(|(frag, _)| frag).collect();
        pass += 1;
    }
}

/// 收集前景表面体素 (在网格边缘, 或至少有一个 6-邻居为背景) 的物理坐标.
///
/// 对于掩膜外的任意点, 最近的前景体素必定是表面体素.
fn surface_points(mask: &Mask) -> Vec<IndexedPoint> {
    let shape = mask.shape();
    mask.positions()
        .into_iter()
        .filter(|&pos| {
            neighbours(pos, Connectivity::Face6, shape).count() < 6
                || neighbours(pos, Connectivity::Face6, shape).any(|p| !mask[p])
        })
        .map(|pos| IndexedPoint::new(mask.physical(pos), pos))
        .collect()
}

/// 逐个碎片计算最近体素对. 空间索引为空时结果为 `None`.
fn nearest_all<G: VoxelGrid + Sync>(
    tree: &RTree<IndexedPoint>,
    pending: &[Fragment],
    grid: &G,
) -> Vec<Option<Nearest>> {
    let one = |frag: &Fragment| -> Option<Nearest> {
        frag.voxels()
            .iter()
            .filter_map(|&from| {
                let q = grid.physical(from);
                let hit = tree.nearest_neighbor(&q)?;
                Some(Nearest {
                    dist2: dist2(&q, hit.geom()),
                    from,
                    to: hit.data,
                })
            })
            .min_by_key(|n| OrderedFloat(n.dist2))
    };
    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            pending.par_iter().map(one).collect()
        } else {
            pending.iter().map(one).collect()
        }
    }
}

#[inline]
fn dist2(a: &Idx3dF, b: &Idx3dF) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// 从 `a` 到 `b` (均包含) 的 26-连通数字直线段.
fn voxel_line(a: Idx3d, b: Idx3d) -> impl Iterator<Item = Idx3d> {
    let a = [a.0 as f64, a.1 as f64, a.2 as f64];
    let b = [b.0 as f64, b.1 as f64, b.2 as f64];
    let steps = (0..3).map(|i| (b[i] - a[i]).abs()).fold(0.0, f64::max) as usize;
    (0..=steps).map(move |i| {
        let t = if steps == 0 { 0.0 } else { i as f64 / steps as f64 };
        let at = |k: usize| (a[k] + (b[k] - a[k]) * t).round() as usize;
        (at(0), at(1), at(2))
    })
}
