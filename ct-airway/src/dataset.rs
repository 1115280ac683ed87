//! 数据集路径约定.
//!
//! 默认布局为 `{用户主目录}/dataset/lung/`, 其中 `scan.nii` 为输入扫描,
//! `out/` 为输出目录.

use std::path::{Path, PathBuf};

/// 肺部数据集在 `{用户主目录}/dataset` 下的子目录名.
pub const LUNG_DIRNAME: &str = "lung";

/// 默认输入扫描文件名.
pub const SCAN_FILENAME: &str = "scan.nii";

/// 默认输出子目录名.
pub const OUTPUT_DIRNAME: &str = "out";

/// 获取 `{用户主目录}/dataset` 目录.
pub fn home_dataset_dir() -> Option<PathBuf> {
    home_dataset_dir_with::<&str, _>([])
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    ans.extend(it);
    Some(ans)
}

/// 获取默认输入扫描路径 `{用户主目录}/dataset/lung/scan.nii`.
#[inline]
pub fn default_scan_path() -> Option<PathBuf> {
    home_dataset_dir_with([LUNG_DIRNAME, SCAN_FILENAME])
}

/// 获取默认输出目录 `{用户主目录}/dataset/lung/out`.
#[inline]
pub fn default_output_dir() -> Option<PathBuf> {
    home_dataset_dir_with([LUNG_DIRNAME, OUTPUT_DIRNAME])
}
