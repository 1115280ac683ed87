//! 运行时错误.

use crate::Idx3d;
use thiserror::Error;

/// 体数据构造、配置校验、细分支回收以及 I/O 的错误.
#[derive(Debug, Error)]
pub enum Error {
    /// 体素分辨率必须为有限正数. 参数顺序为 `[z, h, w]`.
    #[error("体素分辨率必须为有限正数, 实际为 {0:?}")]
    InvalidSpacing([f64; 3]),

    /// 数据长度与声明的形状不符.
    #[error("数据长度 {len} 与形状 {shape:?} 不符")]
    ShapeMismatch {
        /// 声明的形状.
        shape: Idx3d,

        /// 实际数据长度.
        len: usize,
    },

    /// 体数据不含任何体素.
    #[error("体数据为空")]
    EmptyVolume,

    /// 两个网格的形状或分辨率不一致.
    #[error("网格不一致: {left:?} 与 {right:?}")]
    GridMismatch {
        /// 左侧网格形状.
        left: Idx3d,

        /// 右侧网格形状.
        right: Idx3d,
    },

    /// 配置参数非法.
    #[error("配置非法: {0}")]
    InvalidConfig(String),

    /// 细分支回收在允许的轮次内未收敛. 通常意味着邻近门限配置过大.
    #[error("细分支回收在 {passes} 轮后仍有 {pending} 个候选碎片可合并")]
    RecoveryDiverged {
        /// 已执行的合并轮次.
        passes: usize,

        /// 仍处于门限内的候选碎片数.
        pending: usize,
    },

    /// 读取 nifti 文件错误.
    #[error(transparent)]
    Nifti(#[from] nifti::NiftiError),

    /// 写出 npy 文件错误.
    #[error(transparent)]
    WriteNpy(#[from] ndarray_npy::WriteNpyError),

    /// 其他底层 I/O 错误.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// 本 crate 的结果类型.
pub type Result<T> = std::result::Result<T, Error>;
