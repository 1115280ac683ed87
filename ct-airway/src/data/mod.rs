//! 3D CT 体数据与二值掩膜的基础数据结构.

use crate::{Error, Idx3d, Idx3dF, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod band;
mod mask;
mod volume;

pub use band::HuBand;
pub use mask::Mask;
pub use volume::Volume;

/// 体素分辨率, 以毫米为单位, 按 `[z, h, w]` 顺序存储.
///
/// 该结构是只读的, 且保证三个分量均为有限正数.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Spacing([f64; 3]);

impl Spacing {
    /// 构建体素分辨率. 任一分量不是有限正数时返回 [`Error::InvalidSpacing`].
    pub fn new(z_mm: f64, height_mm: f64, width_mm: f64) -> Result<Self> {
        Self::try_from([z_mm, height_mm, width_mm])
    }

    /// 各向同性的体素分辨率.
    #[inline]
    pub fn isotropic(mm: f64) -> Result<Self> {
        Self::new(mm, mm, mm)
    }

    /// 以 `[z, h, w]` 数组形式获取.
    #[inline]
    pub fn as_array(&self) -> [f64; 3] {
        self.0
    }

    /// 空间方向 (相邻切片方向) 分辨率.
    #[inline]
    pub fn z_mm(&self) -> f64 {
        self.0[0]
    }

    /// 高方向 (自然 2D 图像的垂直方向) 分辨率.
    #[inline]
    pub fn height_mm(&self) -> f64 {
        self.0[1]
    }

    /// 宽方向 (自然 2D 图像的水平方向) 分辨率.
    #[inline]
    pub fn width_mm(&self) -> f64 {
        self.0[2]
    }
}

impl TryFrom<[f64; 3]> for Spacing {
    type Error = Error;

    fn try_from(value: [f64; 3]) -> Result<Self> {
        if value.iter().all(|v| v.is_finite() && *v > 0.0) {
            Ok(Self(value))
        } else {
            Err(Error::InvalidSpacing(value))
        }
    }
}

/// 体素网格 (体数据, 掩膜) 的共用属性和部分通用操作.
pub trait VoxelGrid {
    /// 获取数据形状大小 `(z, h, w)`.
    fn shape(&self) -> Idx3d;

    /// 获取体素分辨率.
    fn spacing(&self) -> Spacing;

    /// 获取水平切片个数.
    #[inline]
    fn len_z(&self) -> usize {
        self.shape().0
    }

    /// 获取数据体素个数.
    #[inline]
    fn size(&self) -> usize {
        let (z, h, w) = self.shape();
        z * h * w
    }

    /// 检查索引是否合法.
    #[inline]
    fn check(&self, (z0, h0, w0): &Idx3d) -> bool {
        let (z, h, w) = self.shape();
        *z0 < z && *h0 < h && *w0 < w
    }

    /// 体素分辨率在三个维度上是否是各向同的?
    #[inline]
    fn is_isotropic(&self) -> bool {
        let [z, h, w] = self.spacing().as_array();
        z == h && z == w
    }

    /// 获取体素的实际体积值, 以立方毫米为单位.
    #[inline]
    fn voxel(&self) -> f64 {
        self.spacing().as_array().iter().product()
    }

    /// 将整数索引按分辨率逐分量缩放为物理坐标 (毫米). 不做任何旋转或重定向.
    #[inline]
    fn physical(&self, (z, h, w): Idx3d) -> Idx3dF {
        let [sz, sh, sw] = self.spacing().as_array();
        [z as f64 * sz, h as f64 * sh, w as f64 * sw]
    }

    /// 判断两个网格的形状与分辨率是否完全一致.
    #[inline]
    fn same_grid<G: VoxelGrid + ?Sized>(&self, other: &G) -> bool {
        self.shape() == other.shape() && self.spacing() == other.spacing()
    }

    /// 同 [`Self::same_grid`], 但不一致时返回 [`Error::GridMismatch`].
    fn ensure_same_grid<G: VoxelGrid + ?Sized>(&self, other: &G) -> Result<()> {
        if self.same_grid(other) {
            Ok(())
        } else {
            Err(Error::GridMismatch {
                left: self.shape(),
                right: other.shape(),
            })
        }
    }
}
