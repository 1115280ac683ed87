use log::{debug, warn};

use crate::config::LungConfig;
use crate::morph::{
    clear_border, closing, fill_holes, keep_largest, remove_small_objects, trim_slices,
    Connectivity,
};
use crate::segment::threshold_band;
use crate::{Mask, Volume};

/// 从 `volume` 中分割左右肺.
///
/// 依次执行: HU 阈值, 去除体外空气 (可选), 闭运算, 空洞填充, 去除小连通域,
/// 头足方向裁剪, 最后保留最大的 `cfg.components` 个 26-连通域.
///
/// 本函数是全函数. 扫描中不存在肺时返回空掩膜, 并记录一条警告.
pub fn segment_lungs(volume: &Volume, cfg: &LungConfig) -> Mask {
    let mut mask = threshold_band(volume, &cfg.band);
    debug!("lung threshold: {} voxels", mask.count());

    if cfg.clear_border {
        mask = clear_border(&mask);
        debug!("lung after border clearing: {} voxels", mask.count());
    }

    let mask = closing(&mask, cfg.closing_radius);
    let mask = fill_holes(&mask);
    debug!("lung after closing and filling: {} voxels", mask.count());

    let mask = remove_small_objects(&mask, cfg.min_voxels, Connectivity::Full26);
    let mask = trim_slices(&mask, cfg.trim_top, cfg.trim_bottom);
    let mask = keep_largest(&mask, cfg.components, Connectivity::Full26);

    if mask.is_empty() {
        warn!("lung mask is empty");
    } else {
        debug!("lung mask: {} voxels, {:.1} ml", mask.count(), mask.volume_mm3() / 1000.0);
    }
    mask
}
