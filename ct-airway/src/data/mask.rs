use std::ops::{Index, IndexMut};
use std::path::Path;

use ndarray::{Array3, ArrayView3, ArrayViewMut3, Zip};

use super::{Spacing, VoxelGrid};
use crate::{Idx3d, Result};

/// 与来源体数据同形同分辨率的三维二值掩膜. `true` 代表前景.
///
/// 掩膜不会被重采样: 所有由它派生的掩膜都继承同样的形状和分辨率.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    data: Array3<bool>,
    spacing: Spacing,
}

impl VoxelGrid for Mask {
    #[inline]
    fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    #[inline]
    fn spacing(&self) -> Spacing {
        self.spacing
    }
}

impl Index<Idx3d> for Mask {
    type Output = bool;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx3d> for Mask {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl Mask {
    /// 直接以 `(z, h, w)` 布局的布尔数组创建掩膜.
    #[inline]
    pub fn new(data: Array3<bool>, spacing: Spacing) -> Self {
        Self { data, spacing }
    }

    /// 创建与 `grid` 同形同分辨率的全背景掩膜.
    pub fn empty_like<G: VoxelGrid + ?Sized>(grid: &G) -> Self {
        Self {
            data: Array3::from_elem(grid.shape(), false),
            spacing: grid.spacing(),
        }
    }

    /// 创建与 `grid` 同形同分辨率的掩膜, 仅 `it` 给出的位置为前景.
    ///
    /// 如果存在越界索引, 则程序 panic.
    pub fn from_positions<G, I>(grid: &G, it: I) -> Self
    where
        G: VoxelGrid + ?Sized,
        I: IntoIterator<Item = Idx3d>,
    {
        let mut ans = Self::empty_like(grid);
        ans.fill_batch(it, true);
        ans
    }

    /// 以同一网格上 "每个位置是否为前景" 的规则创建掩膜.
    pub(crate) fn from_fn<F>(grid: &Mask, f: F) -> Self
    where
        F: Fn(Idx3d) -> bool + Sync + Send,
    {
        let mut ans = Self::empty_like(grid);
        cfg_if::cfg_if! {
            if #[cfg(feature = "rayon")] {
                Zip::indexed(&mut ans.data).par_for_each(|pos, v| *v = f(pos));
            } else {
                Zip::indexed(&mut ans.data).for_each(|pos, v| *v = f(pos));
            }
        }
        ans
    }

    /// 获取给定位置是否为前景. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx3d) -> Option<bool> {
        self.data.get(pos).copied()
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, bool> {
        self.data.view()
    }

    /// 获得数据的一份可变 shallow copy.
    #[inline]
    pub(crate) fn data_mut(&mut self) -> ArrayViewMut3<'_, bool> {
        self.data.view_mut()
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array3<bool> {
        self.data
    }

    /// 前景体素个数.
    #[inline]
    pub fn count(&self) -> usize {
        self.data.iter().filter(|v| **v).count()
    }

    /// 是否不含任何前景.
    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.data.iter().any(|v| *v)
    }

    /// 收集所有前景体素的下标. 结果按行优先存储.
    pub fn positions(&self) -> Vec<Idx3d> {
        self.data
            .indexed_iter()
            .filter_map(|(pos, v)| v.then_some(pos))
            .collect()
    }

    /// 前景物理体积, 以立方毫米为单位.
    #[inline]
    pub fn volume_mm3(&self) -> f64 {
        self.count() as f64 * self.voxel()
    }

    /// 将 `it` 给出的所有位置设为 `value`. 如果存在越界索引, 则程序 panic.
    pub fn fill_batch<I: IntoIterator<Item = Idx3d>>(&mut self, it: I, value: bool) {
        for pos in it {
            self.data[pos] = value;
        }
    }

    /// 并集. 两个掩膜形状不一致时 panic.
    pub fn union(&self, other: &Mask) -> Mask {
        self.combine(other, |a, b| a || b)
    }

    /// 交集. 两个掩膜形状不一致时 panic.
    pub fn intersection(&self, other: &Mask) -> Mask {
        self.combine(other, |a, b| a && b)
    }

    /// 差集 `self \ other`. 两个掩膜形状不一致时 panic.
    pub fn difference(&self, other: &Mask) -> Mask {
        self.combine(other, |a, b| a && !b)
    }

    /// `self` 的每个前景体素是否都是 `other` 的前景体素?
    pub fn is_subset_of(&self, other: &Mask) -> bool {
        assert_eq!(self.shape(), other.shape(), "掩膜形状不一致");
        self.data
            .iter()
            .zip(other.data.iter())
            .all(|(&a, &b)| !a || b)
    }

    /// 将掩膜以 `u8` (0/1) 数组的形式写入 `.npy` 文件, 供下游体数据写出器使用.
    pub fn write_npy<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let raw = self.data.mapv(u8::from);
        ndarray_npy::write_npy(path, &raw)?;
        Ok(())
    }

    fn combine(&self, other: &Mask, op: impl Fn(bool, bool) -> bool) -> Mask {
        assert_eq!(self.shape(), other.shape(), "掩膜形状不一致");
        let data = Zip::from(&self.data)
            .and(&other.data)
            .map_collect(|&a, &b| op(a, b));
        Mask {
            data,
            spacing: self.spacing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Mask;
    use crate::{Spacing, VoxelGrid};
    use ndarray::Array3;

    fn grid() -> Mask {
        Mask::new(
            Array3::from_elem((3, 3, 3), false),
            Spacing::new(2.0, 1.0, 1.0).unwrap(),
        )
    }

    #[test]
    fn test_mask_set_algebra() {
        let g = grid();
        let a = Mask::from_positions(&g, [(0, 0, 0), (1, 1, 1)]);
        let b = Mask::from_positions(&g, [(1, 1, 1), (2, 2, 2)]);

        assert_eq!(a.union(&b).count(), 3);
        assert_eq!(a.intersection(&b).positions(), vec![(1, 1, 1)]);
        assert_eq!(a.difference(&b).positions(), vec![(0, 0, 0)]);
        assert!(a.intersection(&b).is_subset_of(&a));
        assert!(!a.is_subset_of(&b));
        assert!(g.is_empty());
        assert!((a.volume_mm3() - 4.0).abs() < 1e-12);
        assert!(a.same_grid(&b));
    }
}
