//! 流水线配置. 所有参数都通过这些结构显式传入, 不存在全局状态.
//!
//! 各默认值见 [`crate::consts::defaults`]. 它们是在有限数据上经验标定的,
//! 用于新数据集之前应当重新实验.

use crate::consts::defaults::*;
use crate::consts::hu::{HISTOGRAM_HIGH, HISTOGRAM_LOW};
use crate::segment::HuHistogram;
use crate::{Error, HuBand, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 肺分割参数.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LungConfig {
    /// 肺实质 HU 区间.
    pub band: HuBand,

    /// 是否去除与水平切片边缘相连的连通域 (体外空气).
    pub clear_border: bool,

    /// 闭运算半径 (体素). 越大越能弥合血管造成的缺口, 但也越容易粘连左右肺.
    pub closing_radius: usize,

    /// 体素个数少于该值的连通域被丢弃.
    pub min_voxels: usize,

    /// 头侧裁剪切片数.
    pub trim_top: usize,

    /// 足侧裁剪切片数. 用于去掉横膈以下的腹部内容.
    pub trim_bottom: usize,

    /// 最终保留的最大连通域个数. 只能为 1 (左右肺粘连) 或 2.
    pub components: usize,
}

impl Default for LungConfig {
    fn default() -> Self {
        Self {
            band: HuBand::lung(),
            clear_border: true,
            closing_radius: LUNG_CLOSING_RADIUS,
            min_voxels: LUNG_MIN_VOXELS,
            trim_top: LUNG_TRIM_TOP,
            trim_bottom: LUNG_TRIM_BOTTOM,
            components: LUNG_COMPONENTS,
        }
    }
}

/// 气道分割参数.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AirwayConfig {
    /// 气道 (空气) HU 区间.
    pub band: HuBand,

    /// 是否在阈值分割后去除与水平切片边缘相连的连通域 (体外空气).
    /// 体外空气通常远大于气道, 不去除时会在最终的最大连通域筛选中胜出.
    pub clear_border: bool,

    /// 由空气掩膜膨胀得到气道壁掩膜的半径 (体素).
    pub wall_radius: usize,

    /// 体素个数少于该值的连通域不属于主气道, 而是进入细分支回收的候选池.
    pub min_voxels: usize,

    /// 头侧裁剪切片数.
    pub trim_top: usize,

    /// 足侧裁剪切片数.
    pub trim_bottom: usize,

    /// 分叉处外壳的膨胀半径 (体素). 为 0 时外壳只包含分叉体素本身.
    pub shell_radius: usize,

    /// 一个切片内连通域与相邻切片中至少这么多个不同连通域重叠时, 视为分叉.
    pub branch_trigger: usize,

    /// 是否只回收落在肺掩膜水平包围盒内的候选碎片.
    /// 打开时气道分割必须等待肺分割完成.
    pub bound_by_lungs: bool,
}

impl Default for AirwayConfig {
    fn default() -> Self {
        Self {
            band: HuBand::airway(),
            clear_border: true,
            wall_radius: AIRWAY_WALL_RADIUS,
            min_voxels: AIRWAY_MIN_VOXELS,
            trim_top: AIRWAY_TRIM_TOP,
            trim_bottom: AIRWAY_TRIM_BOTTOM,
            shell_radius: SHELL_RADIUS,
            branch_trigger: BRANCH_TRIGGER,
            bound_by_lungs: false,
        }
    }
}

/// 细分支回收参数.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RecoveryConfig {
    /// 候选碎片到主气道的最小物理距离严格小于该值 (毫米) 时被合并.
    pub proximity_mm: f64,

    /// 最大合并轮次. 超过后仍有碎片可合并时返回 [`Error::RecoveryDiverged`].
    pub max_passes: usize,

    /// 合并时是否在最近体素对之间补一条 26-连通的体素线段,
    /// 使碎片在最终的最大连通域筛选中得以保留.
    pub bridge_gaps: bool,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            proximity_mm: PROXIMITY_MM,
            max_passes: MAX_RECOVERY_PASSES,
            bridge_gaps: true,
        }
    }
}

/// 骨架化参数.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SkeletonConfig {
    /// 沿 `[z, h, w]` 各轴到网格表面的距离严格小于该值的骨架体素会被裁掉.
    pub edge_margin: [usize; 3],
}

impl Default for SkeletonConfig {
    fn default() -> Self {
        Self {
            edge_margin: [EDGE_MARGIN; 3],
        }
    }
}

impl SkeletonConfig {
    /// 三个轴使用同一裁剪宽度.
    #[inline]
    pub fn with_margin(margin: usize) -> Self {
        Self {
            edge_margin: [margin; 3],
        }
    }
}

/// 诊断统计参数. 诊断结果只写入日志与输出, 从不影响掩膜.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiagnosticsConfig {
    /// 是否计算诊断统计.
    pub enabled: bool,

    /// 需要计数的 HU 区间. 默认为软组织与骨骼.
    pub bands: Vec<HuBand>,

    /// HU 直方图的分箱宽度.
    pub bin_width: f32,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bands: vec![HuBand::soft_tissue(), HuBand::bone()],
            bin_width: HISTOGRAM_BIN_WIDTH,
        }
    }
}

/// 完整流水线配置.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PipelineConfig {
    /// 肺分割参数.
    pub lung: LungConfig,

    /// 气道分割参数.
    pub airway: AirwayConfig,

    /// 细分支回收参数.
    pub recovery: RecoveryConfig,

    /// 骨架化参数. 肺与气道共用.
    pub skeleton: SkeletonConfig,

    /// 诊断统计参数.
    pub diagnostics: DiagnosticsConfig,
}

impl PipelineConfig {
    /// 检查参数是否合法. 不合法时返回 [`Error::InvalidConfig`].
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(Error::InvalidConfig(msg.to_string()));

        if !(1..=2).contains(&self.lung.components) {
            return invalid("肺连通域个数只能为 1 或 2");
        }
        if self.lung.band.is_empty() {
            return invalid("肺 HU 区间为空");
        }
        if self.airway.band.is_empty() {
            return invalid("气道 HU 区间为空");
        }
        if self.airway.branch_trigger < 2 {
            return invalid("分叉触发分支数至少为 2");
        }
        let p = self.recovery.proximity_mm;
        if !(p.is_finite() && p >= 0.0) {
            return invalid("邻近门限必须为有限非负数");
        }
        let w = self.diagnostics.bin_width;
        if self.diagnostics.enabled
            && HuHistogram::bin_count(HISTOGRAM_LOW, HISTOGRAM_HIGH, w).is_none()
        {
            return invalid("直方图分箱宽度必须为有限正数, 且分箱个数不能过多");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = PipelineConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.lung.components, 2);
        assert_eq!(cfg.skeleton.edge_margin, [120; 3]);
        assert!(cfg.airway.band.contains(-851.0));
        assert!(!cfg.airway.band.contains(-850.0));
    }

    #[test]
    fn test_validate_rejects_nonsense() {
        let mut cfg = PipelineConfig::default();
        cfg.lung.components = 3;
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));

        let mut cfg = PipelineConfig::default();
        cfg.recovery.proximity_mm = f64::NAN;
        assert!(cfg.validate().is_err());

        let mut cfg = PipelineConfig::default();
        cfg.airway.branch_trigger = 1;
        assert!(cfg.validate().is_err());

        let mut cfg = PipelineConfig::default();
        cfg.lung.band = HuBand::closed(-400.0, -1000.0);
        assert!(cfg.validate().is_err());

        let mut cfg = PipelineConfig::default();
        cfg.lung.band = HuBand::closed(f32::INFINITY, 0.0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_tiny_bin_width() {
        let mut cfg = PipelineConfig::default();
        for w in [1e-30, 1e-6, 0.0, f32::NAN] {
            cfg.diagnostics.bin_width = w;
            assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))), "{w}");
        }
        cfg.diagnostics.bin_width = 1.0;
        assert!(cfg.validate().is_ok());
        cfg.diagnostics.enabled = false;
        cfg.diagnostics.bin_width = 1e-30;
        assert!(cfg.validate().is_ok());
    }
}
