use std::ops::Bound;

use crate::consts::hu::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// CT HU 区间, 用于决定一个体素属于某种组织 (前景) 还是背景.
///
/// 上下界分别可以是闭的、开的或无界的. 该区间是只读的.
/// 若要修改区间参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HuBand {
    low: Bound<f32>,
    high: Bound<f32>,
}

impl HuBand {
    /// 由任意上下界构建.
    #[inline]
    pub const fn new(low: Bound<f32>, high: Bound<f32>) -> Self {
        Self { low, high }
    }

    /// \[low, high\] 闭区间. 只有 `low == -inf` 与 `high == +inf` 代表无界;
    /// 其余无穷值按闭边界处理, 例如 `closed(+inf, +inf)` 只包含 `+inf`.
    pub fn closed(low: f32, high: f32) -> Self {
        let low = if low == f32::NEG_INFINITY {
            Bound::Unbounded
        } else {
            Bound::Included(low)
        };
        let high = if high == f32::INFINITY {
            Bound::Unbounded
        } else {
            Bound::Included(high)
        };
        Self::new(low, high)
    }

    /// (-inf, cutoff) 开区间.
    #[inline]
    pub const fn below(cutoff: f32) -> Self {
        Self::new(Bound::Unbounded, Bound::Excluded(cutoff))
    }

    /// \[low, +inf) 左闭右开区间.
    #[inline]
    pub const fn at_least(low: f32) -> Self {
        Self::new(Bound::Included(low), Bound::Unbounded)
    }

    /// 气道 (空气) 区间: `v < -850`.
    #[inline]
    pub const fn airway() -> Self {
        Self::below(AIRWAY_CUTOFF)
    }

    /// 肺实质区间: `-1000 <= v <= -400`.
    #[inline]
    pub const fn lung() -> Self {
        Self::new(Bound::Included(LUNG_LOW), Bound::Included(LUNG_HIGH))
    }

    /// 软组织区间: `-100 <= v <= 300`. 仅用于诊断.
    #[inline]
    pub const fn soft_tissue() -> Self {
        Self::new(
            Bound::Included(SOFT_TISSUE_LOW),
            Bound::Included(SOFT_TISSUE_HIGH),
        )
    }

    /// 骨骼区间: `v >= 300`. 仅用于诊断.
    #[inline]
    pub const fn bone() -> Self {
        Self::at_least(BONE_LOW)
    }

    /// 下界.
    #[inline]
    pub fn low(&self) -> Bound<f32> {
        self.low
    }

    /// 上界.
    #[inline]
    pub fn high(&self) -> Bound<f32> {
        self.high
    }

    /// 判断 `hu` 是否落在区间内. `NaN` 不属于任何区间.
    #[inline]
    pub fn contains(&self, hu: f32) -> bool {
        if hu.is_nan() {
            return false;
        }
        let above_low = match self.low {
            Bound::Included(l) => hu >= l,
            Bound::Excluded(l) => hu > l,
            Bound::Unbounded => true,
        };
        let below_high = match self.high {
            Bound::Included(h) => hu <= h,
            Bound::Excluded(h) => hu < h,
            Bound::Unbounded => true,
        };
        above_low && below_high
    }

    /// 区间是否可能包含任何值?
    pub fn is_empty(&self) -> bool {
        match (self.low, self.high) {
            (Bound::Included(l), Bound::Included(h)) => l > h,
            (Bound::Included(l) | Bound::Excluded(l), Bound::Excluded(h))
            | (Bound::Excluded(l), Bound::Included(h)) => l >= h,
            _ => false,
        }
    }
}
