//! 3D 形态学操作.

use itertools::iproduct;
use once_cell::sync::Lazy;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Idx3d;

mod label;
mod refine;
mod selem;

pub use label::{label, LabelVolume};
pub use refine::{
    clear_border, closing, dilate, erode, fill_holes, keep_largest, remove_small_objects,
    split_small_objects, trim_slices,
};
pub use selem::Ball;

/// 三维索引偏移量 `(dz, dh, dw)`.
pub(crate) type Offset3d = (isize, isize, isize);

/// 体素邻接规则.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Connectivity {
    /// 仅共面 (前后上下左右) 的 6 个邻居. 钻石型.
    Face6,

    /// 共面、共棱、共顶点的全部 26 个邻居.
    Full26,

    /// 同一水平切片内的 8 个邻居, 不跨切片.
    Planar8,
}

static FACE6: Lazy<Vec<Offset3d>> = Lazy::new(|| offsets_where(|d| d == 1));

static FULL26: Lazy<Vec<Offset3d>> = Lazy::new(|| offsets_where(|d| d >= 1));

static PLANAR8: Lazy<Vec<Offset3d>> = Lazy::new(|| {
    iproduct!(-1isize..=1, -1isize..=1)
        .filter(|&(dh, dw)| (dh, dw) != (0, 0))
        .map(|(dh, dw)| (0, dh, dw))
        .collect()
});

/// 收集 3x3x3 邻域内曼哈顿距离满足 `pred` 的全部偏移量.
fn offsets_where(pred: impl Fn(usize) -> bool) -> Vec<Offset3d> {
    iproduct!(-1isize..=1, -1isize..=1, -1isize..=1)
        .filter(|&(z, h, w)| pred(z.unsigned_abs() + h.unsigned_abs() + w.unsigned_abs()))
        .collect()
}

impl Connectivity {
    /// 该邻接规则下的全部邻居偏移量.
    #[inline]
    pub fn offsets(&self) -> &'static [Offset3d] {
        match self {
            Connectivity::Face6 => &FACE6,
            Connectivity::Full26 => &FULL26,
            Connectivity::Planar8 => &PLANAR8,
        }
    }
}

/// `pos + offset`. 结果越界 (包括小于 0) 时返回 `None`.
#[inline]
pub(crate) fn shift((z, h, w): Idx3d, (dz, dh, dw): Offset3d, shape: Idx3d) -> Option<Idx3d> {
    let z = z.checked_add_signed(dz).filter(|v| *v < shape.0)?;
    let h = h.checked_add_signed(dh).filter(|v| *v < shape.1)?;
    let w = w.checked_add_signed(dw).filter(|v| *v < shape.2)?;
    Some((z, h, w))
}

/// 获取 `pos` 在 `conn` 规则下的全部邻居索引. 保证返回的索引都不越界.
#[inline]
pub(crate) fn neighbours(
    pos: Idx3d,
    conn: Connectivity,
    shape: Idx3d,
) -> impl Iterator<Item = Idx3d> {
    conn.offsets()
        .iter()
        .filter_map(move |off| shift(pos, *off, shape))
}

/// 判断一个索引是否位于网格的某个表面上.
#[inline]
pub(crate) fn is_at_border((z, h, w): Idx3d, (lz, lh, lw): Idx3d) -> bool {
    z == 0
        || z.saturating_add(1) == lz
        || h == 0
        || h.saturating_add(1) == lh
        || w == 0
        || w.saturating_add(1) == lw
}
