//! 完整流水线: 体数据 → 肺/气道掩膜 → 两组骨架.

use log::{info, warn};

use crate::config::PipelineConfig;
use crate::consts::hu::{HISTOGRAM_HIGH, HISTOGRAM_LOW};
use crate::engine::{segment_airway, segment_lungs, AirwaySegmentation, RecoveryReport};
use crate::segment::{band_census, HuHistogram};
use crate::skeleton::skeletonize;
use crate::{HuBand, Mask, Result, Skeleton, Volume, VoxelGrid};

/// 诊断统计. 不参与掩膜计算.
#[derive(Clone, Debug)]
pub struct Diagnostics {
    /// 各诊断区间及其体素个数.
    pub census: Vec<(HuBand, usize)>,

    /// 全体数据的 HU 直方图.
    pub histogram: Option<HuHistogram>,
}

impl Diagnostics {
    /// 按 `bands` 与 `bin_width` 统计 `volume`.
    pub fn of(volume: &Volume, bands: &[HuBand], bin_width: f32) -> Self {
        let counts = band_census(volume, bands);
        Self {
            census: bands.iter().copied().zip(counts).collect(),
            histogram: HuHistogram::new(volume, HISTOGRAM_LOW, HISTOGRAM_HIGH, bin_width),
        }
    }
}

/// 流水线输出.
#[derive(Clone, Debug)]
pub struct PipelineOutput {
    /// 肺掩膜.
    pub lungs: Mask,

    /// 气道掩膜.
    pub airway: Mask,

    /// 肺骨架.
    pub lung_skeleton: Skeleton,

    /// 气道骨架.
    pub airway_skeleton: Skeleton,

    /// 细分支回收报告.
    pub recovery: RecoveryReport,

    /// 分叉处外壳新增的体素个数.
    pub shell_voxels: usize,

    /// 诊断统计. 配置关闭时为 `None`.
    pub diagnostics: Option<Diagnostics>,
}

impl PipelineOutput {
    /// 为空的输出项名称, 依次检查 `lungs`, `airway`, `lung_skeleton`, `airway_skeleton`.
    pub fn empty_outputs(&self) -> Vec<&'static str> {
        [
            ("lungs", self.lungs.is_empty()),
            ("airway", self.airway.is_empty()),
            ("lung_skeleton", self.lung_skeleton.is_empty()),
            ("airway_skeleton", self.airway_skeleton.is_empty()),
        ]
        .into_iter()
        .filter_map(|(name, empty)| empty.then_some(name))
        .collect()
    }
}

/// 执行完整流水线.
///
/// 配置不合法时返回 [`crate::Error::InvalidConfig`], 细分支回收不收敛时返回
/// [`crate::Error::RecoveryDiverged`]. 空结果不是错误, 只会记录警告.
///
/// 启用 `rayon` 时, 若气道不受肺掩膜约束, 肺与气道两条分支并行执行; 两组骨架化同样并行.
pub fn run(volume: &Volume, config: &PipelineConfig) -> Result<PipelineOutput> {
    config.validate()?;
    let (lz, lh, lw) = volume.shape();
    info!(
        "running pipeline on {lz}x{lh}x{lw} volume, spacing {:?} mm",
        volume.spacing().as_array()
    );

    let diagnostics = config.diagnostics.enabled.then(|| {
        let d = Diagnostics::of(volume, &config.diagnostics.bands, config.diagnostics.bin_width);
        info!("HU census: {:?}", d.census);
        d
    });

    let (lungs, airway) = if config.airway.bound_by_lungs {
        let lungs = segment_lungs(volume, &config.lung);
        let airway = segment_airway(volume, &config.airway, &config.recovery, Some(&lungs))?;
        (lungs, airway)
    } else {
        let (lungs, airway) = join(
            || segment_lungs(volume, &config.lung),
            || segment_airway(volume, &config.airway, &config.recovery, None),
        );
        (lungs, airway?)
    };
    let AirwaySegmentation {
        mask: airway,
        recovery,
        shell_voxels,
        ..
    } = airway;

    let (lung_skeleton, airway_skeleton) = join(
        || skeletonize(&lungs, &config.skeleton),
        || skeletonize(&airway, &config.skeleton),
    );

    let out = PipelineOutput {
        lungs,
        airway,
        lung_skeleton,
        airway_skeleton,
        recovery,
        shell_voxels,
        diagnostics,
    };
    let empty = out.empty_outputs();
    if !empty.is_empty() {
        warn!("empty outputs: {}", empty.join(", "));
    }
    info!(
        "pipeline finished: lung skeleton {} voxels, airway skeleton {} voxels, {} fragments recovered",
        out.lung_skeleton.len(),
        out.airway_skeleton.len(),
        out.recovery.merged.len()
    );
    Ok(out)
}

/// 在启用 `rayon` 时并行执行两个闭包, 否则顺序执行.
fn join<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            rayon::join(a, b)
        } else {
            (a(), b())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SkeletonConfig;
    use crate::morph::{label, Connectivity};
    use crate::skeleton::betti;
    use crate::Error;
    use ndarray::Array3;

    /// 64³ 软组织中沿头足方向的气管: 半径 5, 中心 (32, 32), z 12..52.
    fn cylinder() -> Volume {
        let data = Array3::from_shape_fn((64, 64, 64), |(z, h, w)| {
            let r2 = (h as f64 - 32.0).powi(2) + (w as f64 - 32.0).powi(2);
            if (12..52).contains(&z) && r2 <= 25.0 {
                -900.0
            } else {
                -200.0
            }
        });
        Volume::new(data, [1.0, 1.0, 1.0]).unwrap()
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            skeleton: SkeletonConfig::with_margin(4),
            ..Default::default()
        }
    }

    #[test]
    fn test_cylinder_end_to_end() {
        let out = run(&cylinder(), &config()).unwrap();

        let mask_count = out.airway.count();
        assert!(mask_count > 3000);
        let sk = &out.airway_skeleton;
        assert!(!sk.is_empty());
        assert!(sk.len() * 10 <= mask_count);
        assert_eq!(sk.edge_trimmed(), 0);
        assert!(sk.to_mask().is_subset_of(&out.airway));
        assert_eq!(label(&sk.to_mask(), Connectivity::Full26).count(), 1);
        assert_eq!(betti(&sk.to_mask()).tunnels, 0);
        // 骨架沿轴线分布.
        assert!(sk.points().iter().all(|&(_, h, w)| {
            let r2 = (h as f64 - 32.0).powi(2) + (w as f64 - 32.0).powi(2);
            r2 <= 9.0
        }));
        let zs: Vec<usize> = sk.points().iter().map(|p| p.0).collect();
        assert!(zs.iter().max().unwrap() - zs.iter().min().unwrap() >= 20);

        let diag = out.diagnostics.as_ref().unwrap();
        assert_eq!(diag.census.len(), 2);
        assert_eq!(diag.census[0].1, 0);
        assert!(out.recovery.merged.is_empty());
    }

    #[test]
    fn test_lung_bounded_run_and_empty_outputs() {
        let mut cfg = config();
        cfg.airway.bound_by_lungs = true;
        cfg.diagnostics.enabled = false;
        let volume = Volume::new(Array3::from_elem((8, 8, 8), 40.0), [1.0, 1.0, 1.0]).unwrap();
        let out = run(&volume, &cfg).unwrap();
        assert!(out.diagnostics.is_none());
        assert_eq!(
            out.empty_outputs(),
            vec!["lungs", "airway", "lung_skeleton", "airway_skeleton"]
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut cfg = config();
        cfg.lung.components = 0;
        let volume = Volume::new(Array3::from_elem((2, 2, 2), 0.0), [1.0, 1.0, 1.0]).unwrap();
        assert!(matches!(run(&volume, &cfg), Err(Error::InvalidConfig(_))));
    }
}
