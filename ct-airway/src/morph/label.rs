use std::collections::VecDeque;

use ndarray::{Array3, ArrayView3};

use super::{neighbours, Connectivity};
use crate::{Area3d, Areas3d, Idx3d, Mask, VoxelGrid};

/// 连通域标记结果. 每个体素对应一个非负整数编号, 0 代表背景.
///
/// 编号从 1 开始, 按各连通域首个体素的行优先顺序分配, 因此对同一输入总是稳定的.
/// 该结构只在单个处理步骤内部存在, 不会被持久化.
#[derive(Clone, Debug)]
pub struct LabelVolume {
    labels: Array3<u32>,
    areas: Areas3d,
}

/// 按照 `conn` 邻接规则对 `mask` 的前景做连通域标记.
///
/// 两个体素 `p1` 和 `p2` 属于同一个区域, 当且仅当存在一条从 `p1` 到 `p2`
/// 的 `conn`-相邻路径, 且路径上的所有体素 (包括 `p1` 和 `p2`) 都是前景.
pub fn label(mask: &Mask, conn: Connectivity) -> LabelVolume {
    let shape = mask.shape();
    let mut labels = Array3::<u32>::zeros(shape);
    let mut areas = Areas3d::with_capacity(4);
    let mut bfs_q: VecDeque<Idx3d> = VecDeque::with_capacity(64);

    for (pos, &fg) in mask.data().indexed_iter() {
        if !fg || labels[pos] != 0 {
            continue;
        }
        let id = areas.len() as u32 + 1;
        let mut this_area = Area3d::with_capacity(16);
        labels[pos] = id;
        bfs_q.push_back(pos);

        while let Some(cur) = bfs_q.pop_front() {
            this_area.push(cur);
            for neigh in neighbours(cur, conn, shape) {
                if mask[neigh] && labels[neigh] == 0 {
                    labels[neigh] = id;
                    bfs_q.push_back(neigh);
                }
            }
        }
        areas.push(this_area);
    }

    LabelVolume { labels, areas }
}

impl LabelVolume {
    /// 连通域个数.
    #[inline]
    pub fn count(&self) -> usize {
        self.areas.len()
    }

    /// 获得编号数组的一份不可变 shallow copy.
    #[inline]
    pub fn labels(&self) -> ArrayView3<'_, u32> {
        self.labels.view()
    }

    /// 获取给定位置的编号. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx3d) -> Option<u32> {
        self.labels.get(pos).copied()
    }

    /// 获取编号为 `id` 的连通域全部体素. 编号不存在 (包括背景 0) 时返回 `None`.
    #[inline]
    pub fn area(&self, id: u32) -> Option<&Area3d> {
        (id as usize).checked_sub(1).and_then(|i| self.areas.get(i))
    }

    /// 全部连通域. 第 `i` 个元素对应编号 `i + 1`.
    #[inline]
    pub fn areas(&self) -> &Areas3d {
        &self.areas
    }

    /// 消费自我, 直接获得全部连通域.
    #[inline]
    pub fn into_areas(self) -> Areas3d {
        self.areas
    }

    /// 各连通域的体素个数. 第 `i` 个元素对应编号 `i + 1`.
    pub fn sizes(&self) -> Vec<usize> {
        self.areas.iter().map(Vec::len).collect()
    }

    /// 按体素个数从大到小排列的编号. 体积相同时编号小者在前.
    pub fn ranked(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = (1..=self.areas.len() as u32).collect();
        ids.sort_by_key(|&id| std::cmp::Reverse(self.areas[id as usize - 1].len()));
        ids
    }

    /// 最大连通域的编号. 不存在前景时返回 `None`.
    #[inline]
    pub fn largest(&self) -> Option<u32> {
        self.ranked().first().copied()
    }
}
