//! 对 `ct-airway::dataset` 的更一层封装. 提供更直接的路径与扫描加载.

use ct_airway::{dataset, Volume};
use std::env;
use std::path::PathBuf;

/// 获取输入扫描路径.
///
/// 1. 若环境变量 `$CT_SCAN_PATH` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/lung/scan.nii`.
pub fn scan_path_from_env_or_home() -> PathBuf {
    match env::var("CT_SCAN_PATH") {
        Ok(p) if !p.is_empty() => PathBuf::from(p),
        _ => dataset::default_scan_path().expect("Cannot locate home directory"),
    }
}

/// 获取输出目录.
///
/// 1. 若环境变量 `$CT_OUTPUT_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/lung/out`.
pub fn output_dir_from_env_or_home() -> PathBuf {
    match env::var("CT_OUTPUT_DIR") {
        Ok(p) if !p.is_empty() => PathBuf::from(p),
        _ => dataset::default_output_dir().expect("Cannot locate home directory"),
    }
}

/// 从 `$CT_SCAN_PATH` 或者 `$HOME/dataset/lung/scan.nii` 加载扫描.
#[inline]
pub fn scan_from_env_or_home() -> ct_airway::Result<Volume> {
    Volume::open(scan_path_from_env_or_home())
}
