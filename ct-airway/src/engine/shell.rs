//! 分叉处外壳补偿.
//!
//! 阈值分割得到的是管腔 (空气), 在支气管分叉处管腔常被部分容积效应截断.
//! 这里在分叉所在的切片截面周围补上一层来自气道壁掩膜的体素.

use std::collections::HashSet;

use crate::morph::{dilate, label, Connectivity};
use crate::{Idx3d, Mask, VoxelGrid};

/// 找出 `mask` 中的分叉截面.
///
/// 以切片内 8-邻接标记后, 一个位于切片 `z` 的截面若在切片 `z - 1` 或 `z + 1`
/// 的同一水平位置上与至少 `trigger` 个不同截面重叠, 则它的全部体素构成分叉.
pub fn bifurcations(mask: &Mask, trigger: usize) -> Mask {
    let lv = label(mask, Connectivity::Planar8);
    let len_z = mask.len_z();
    let labels = lv.labels();

    let overlaps = |area: &[Idx3d], z: usize| -> usize {
        area.iter()
            .map(|&(_, h, w)| labels[(z, h, w)])
            .filter(|&id| id != 0)
            .collect::<HashSet<u32>>()
            .len()
    };

    let seeds = lv.areas().iter().filter(|area| {
        let z = area[0].0;
        let above = z.checked_sub(1).map_or(0, |zz| overlaps(area.as_slice(), zz));
        let below = (z + 1 < len_z).then(|| overlaps(area.as_slice(), z + 1)).unwrap_or(0);
        above.max(below) >= trigger
    });
    Mask::from_positions(mask, seeds.flat_map(|area| area.iter().copied()))
}

/// 在 `mask` 的分叉处补充外壳, 返回新掩膜以及新增体素个数.
///
/// 外壳为分叉体素以 `radius` 膨胀后与 `wall` 的交集, 因此新增体素都来自气道壁掩膜.
/// 若 `wall` 包含 `mask`, 则结果同样被 `wall` 包含.
pub fn add_shell(mask: &Mask, wall: &Mask, radius: usize, trigger: usize) -> (Mask, usize) {
    let seeds = bifurcations(mask, trigger);
    if seeds.is_empty() {
        return (mask.clone(), 0);
    }
    let shell = dilate(&seeds, radius).intersection(wall);
    let ans = mask.union(&shell);
    let added = ans.count() - mask.count();
    (ans, added)
}
