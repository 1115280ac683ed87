//! HU 阈值分割, 以及用于诊断的 HU 统计.
//!
//! 统计部分 ([`band_census`], [`HuHistogram`]) 只用于观察扫描的组织构成,
//! 不参与任何掩膜的生成.

use crate::consts::defaults::MAX_HISTOGRAM_BINS;
use crate::{HuBand, Mask, Volume, VoxelGrid};

/// 生成 `low <= value <= high` 的体素掩膜. 任一边界可以为 `±inf` (无界).
///
/// 纯函数, 输出网格与 `volume` 一致.
#[inline]
pub fn threshold(volume: &Volume, low: f32, high: f32) -> Mask {
    threshold_band(volume, &HuBand::closed(low, high))
}

/// 生成 HU 落在 `band` 内的体素掩膜.
pub fn threshold_band(volume: &Volume, band: &HuBand) -> Mask {
    let data = volume.data().map(|&hu| band.contains(hu));
    Mask::new(data, volume.spacing())
}

/// 统计每个区间内的体素个数. 区间之间可以重叠.
pub fn band_census(volume: &Volume, bands: &[HuBand]) -> Vec<usize> {
    let mut ans = vec![0usize; bands.len()];
    for &hu in volume.data().iter() {
        for (cnt, band) in ans.iter_mut().zip(bands) {
            if band.contains(hu) {
                *cnt += 1;
            }
        }
    }
    ans
}

/// 固定宽度分箱的 HU 直方图.
///
/// 落在 `[lower, upper)` 之外的有限值被计入首/尾分箱, 非有限值被单独计数.
#[derive(Clone, Debug)]
pub struct HuHistogram {
    lower: f32,
    bin_width: f32,
    bins: Vec<u64>,
    non_finite: u64,
}

impl HuHistogram {
    /// 以 `[lower, upper)` 范围和 `bin_width` 统计 `volume`.
    ///
    /// 参数不满足 [`Self::bin_count`] 的要求时返回 `None`.
    pub fn new(volume: &Volume, lower: f32, upper: f32, bin_width: f32) -> Option<Self> {
        let len = Self::bin_count(lower, upper, bin_width)?;
        let mut ans = Self {
            lower,
            bin_width,
            bins: vec![0; len],
            non_finite: 0,
        };
        for &hu in volume.data().iter() {
            ans.push(hu);
        }
        Some(ans)
    }

    /// `[lower, upper)` 以 `bin_width` 分箱所需的分箱个数.
    ///
    /// 要求上下界有限, `upper > lower`, `bin_width` 为正, 且分箱个数不超过
    /// [`MAX_HISTOGRAM_BINS`]; 否则返回 `None`.
    pub fn bin_count(lower: f32, upper: f32, bin_width: f32) -> Option<usize> {
        if !(bin_width > 0.0 && upper > lower && lower.is_finite() && upper.is_finite()) {
            return None;
        }
        let len = ((upper - lower) / bin_width).ceil();
        (len <= MAX_HISTOGRAM_BINS as f32).then(|| (len as usize).max(1))
    }

    fn push(&mut self, hu: f32) {
        if !hu.is_finite() {
            self.non_finite += 1;
            return;
        }
        let last = self.bins.len() - 1;
        let idx = ((hu - self.lower) / self.bin_width).floor();
        let idx = if idx < 0.0 {
            0
        } else {
            (idx as usize).min(last)
        };
        self.bins[idx] += 1;
    }

    /// 各分箱计数.
    #[inline]
    pub fn bins(&self) -> &[u64] {
        &self.bins
    }

    /// 第 `index` 个分箱的下界 HU.
    #[inline]
    pub fn bin_lower(&self, index: usize) -> f32 {
        self.lower + index as f32 * self.bin_width
    }

    /// 非有限值 (inf, NaN) 的个数.
    #[inline]
    pub fn non_finite(&self) -> u64 {
        self.non_finite
    }

    /// 计数最多的分箱下界 HU. 若有多个, 取 HU 最低者.
    pub fn mode(&self) -> f32 {
        let (idx, _) = self
            .bins
            .iter()
            .enumerate()
            .fold((0, 0), |best, (i, &c)| if c > best.1 { (i, c) } else { best });
        self.bin_lower(idx)
    }
}
