use log::{debug, warn};

use super::{add_shell, recover_thin_branches, RecoveryReport};
use crate::config::{AirwayConfig, RecoveryConfig};
use crate::morph::{
    clear_border, dilate, fill_holes, keep_largest, split_small_objects, trim_slices,
    Connectivity,
};
use crate::segment::threshold_band;
use crate::{Area3d, Mask, Result, Volume, VoxelGrid};

/// 气道分割结果.
#[derive(Clone, Debug)]
pub struct AirwaySegmentation {
    /// 最终气道掩膜. 至多一个 26-连通域.
    pub mask: Mask,

    /// 气道壁掩膜, 即空气掩膜的膨胀. 外壳补偿只从这里取体素.
    pub wall: Mask,

    /// 细分支回收报告.
    pub recovery: RecoveryReport,

    /// 分叉处外壳新增的体素个数.
    pub shell_voxels: usize,
}

/// 从 `volume` 中分割气道树.
///
/// 1. 以气道 HU 区间做阈值分割, 并按需去除体外空气;
/// 2. 以 `cfg.wall_radius` 膨胀得到气道壁掩膜;
/// 3. 填充空洞, 头足方向裁剪, 然后把小连通域分离出来作为回收候选;
/// 4. 细分支回收. 若给出 `lungs`, 只保留至少有一个体素落在肺掩膜水平包围盒内的候选;
/// 5. 在分叉处补充外壳;
/// 6. 保留最大的 26-连通域.
///
/// `lungs` 与 `volume` 网格不一致时返回 [`crate::Error::GridMismatch`],
/// 回收不收敛时返回 [`crate::Error::RecoveryDiverged`].
pub fn segment_airway(
    volume: &Volume,
    cfg: &AirwayConfig,
    recovery: &RecoveryConfig,
    lungs: Option<&Mask>,
) -> Result<AirwaySegmentation> {
    if let Some(lungs) = lungs {
        volume.ensure_same_grid(lungs)?;
    }

    let mut air = threshold_band(volume, &cfg.band);
    if cfg.clear_border {
        air = clear_border(&air);
    }
    debug!("airway threshold: {} voxels", air.count());

    let wall = dilate(&air, cfg.wall_radius);
    let filled = fill_holes(&air);
    let trimmed = trim_slices(&filled, cfg.trim_top, cfg.trim_bottom);
    let (main, mut candidates) = split_small_objects(&trimmed, cfg.min_voxels, Connectivity::Full26);
    debug!(
        "airway main mask: {} voxels, {} candidate fragments",
        main.count(),
        candidates.len()
    );

    if let Some(lungs) = lungs {
        let bbox = InPlaneBox::of(lungs);
        candidates.retain(|area| bbox.is_some_and(|b| b.touches(area)));
        debug!("{} candidate fragments inside the lung box", candidates.len());
    }

    let (recovered, report) = recover_thin_branches(&main, candidates, recovery)?;
    let (shelled, shell_voxels) =
        add_shell(&recovered, &wall, cfg.shell_radius, cfg.branch_trigger);
    debug!("airway shell: {shell_voxels} voxels added");

    let mask = keep_largest(&shelled, 1, Connectivity::Full26);
    if mask.is_empty() {
        warn!("airway mask is empty");
    } else {
        debug!("airway mask: {} voxels", mask.count());
    }

    Ok(AirwaySegmentation {
        mask,
        wall,
        recovery: report,
        shell_voxels,
    })
}

/// 掩膜在水平面 (`h`, `w`) 上的闭包围盒.
#[derive(Copy, Clone, Debug)]
struct InPlaneBox {
    h: (usize, usize),
    w: (usize, usize),
}

impl InPlaneBox {
    /// 掩膜为空时返回 `None`.
    fn of(mask: &Mask) -> Option<Self> {
        mask.positions().into_iter().fold(None, |acc, (_, h, w)| {
            Some(match acc {
                None => Self { h: (h, h), w: (w, w) },
                Some(b) => Self {
                    h: (b.h.0.min(h), b.h.1.max(h)),
                    w: (b.w.0.min(w), b.w.1.max(w)),
                },
            })
        })
    }

    fn touches(&self, area: &Area3d) -> bool {
        area.iter().any(|&(_, h, w)| {
            (self.h.0..=self.h.1).contains(&h) && (self.w.0..=self.w.1).contains(&w)
        })
    }
}
