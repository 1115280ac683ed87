use std::ops::Index;
use std::path::Path;

use ndarray::{Array3, ArrayView3};
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};

use super::{Spacing, VoxelGrid};
use crate::{Error, Idx3d, Result};

/// 3D CT 扫描体数据, HU 值以 `f32` 保存, 按 `(z, h, w)` 组织.
///
/// 构造后不可变. 肺与气道两条流水线可以在不加锁的情况下共享同一份 `Volume`.
#[derive(Debug, Clone)]
pub struct Volume {
    data: Array3<f32>,
    spacing: Spacing,
}

impl VoxelGrid for Volume {
    #[inline]
    fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    #[inline]
    fn spacing(&self) -> Spacing {
        self.spacing
    }
}

impl Index<Idx3d> for Volume {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl Volume {
    /// 以 `(z, h, w)` 布局的 HU 数组和 `[z, h, w]` 分辨率 (毫米) 构建体数据.
    ///
    /// 分辨率非法时返回 [`Error::InvalidSpacing`], 数组为空时返回 [`Error::EmptyVolume`].
    pub fn new(data: Array3<f32>, spacing: [f64; 3]) -> Result<Self> {
        let spacing = Spacing::try_from(spacing)?;
        if data.is_empty() {
            return Err(Error::EmptyVolume);
        }
        Ok(Self { data, spacing })
    }

    /// 以行优先的扁平 HU 序列构建体数据. 长度与 `shape` 不符时返回 [`Error::ShapeMismatch`].
    pub fn from_shape_vec(shape: Idx3d, values: Vec<f32>, spacing: [f64; 3]) -> Result<Self> {
        let len = values.len();
        let data = Array3::from_shape_vec(shape, values)
            .map_err(|_| Error::ShapeMismatch { shape, len })?;
        Self::new(data, spacing)
    }

    /// 打开 nii 文件格式的 3D CT 扫描. `path` 为 nii 文件的本地路径.
    ///
    /// 文件中的 `[W, H, z]` 会被转换成 `(z, H, W)`. 我们假设文件内容已是 HU 值.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let header = obj.header();
        let [_, w, h, z, ..] = header.dim;
        let shape = (z as usize, h as usize, w as usize);
        let [_, pw, ph, pz, ..] = header.pixdim;
        let spacing = [pz as f64, ph as f64, pw as f64];

        // [W, H, z] -> [z, H, W].
        let data = obj
            .into_volume()
            .into_ndarray::<f32>()?
            .permuted_axes([2, 1, 0].as_slice());
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        Self::from_shape_vec(shape, data.into_raw_vec(), spacing)
    }

    /// 获取给定位置的 HU 值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx3d) -> Option<f32> {
        self.data.get(pos).copied()
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }
}
