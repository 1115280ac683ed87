#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 从已校准 (HU) 的 3D 胸部 CT 扫描中分割肺与气道, 并将两者分别约简为单体素宽的拓扑骨架.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 原始扫描的读取与 HU 转换不是本 crate 的职责. 我们只提供一个基于 `nifti`
//!   的薄适配层 ([`Volume::open`]), 以及把结果交给下游的 `.npy` / 点云文本写出器.
//! 2. 数据一律按 `(z, h, w)` 组织, 其中 `z` (第 0 轴) 为头足方向,
//!   切片索引朝足侧增长. 体素分辨率也按 `[z, h, w]` 顺序给出, 单位为毫米.
//! 3. 在输入合法的前提下, 流水线的每一步都是全函数: 不会 panic, 也不会返回错误.
//!   唯一的运行期错误是细分支回收超出迭代上限 (见 [`Error::RecoveryDiverged`]).
//!
//! # 开发计划
//!
//! ### 体数据与掩膜模型 ✅
//!
//! 不可变 CT 体数据 [`Volume`] 与同形二值掩膜 [`Mask`], 共享 [`VoxelGrid`] 属性.
//!
//! 实现位于 `ct-airway/src/data`.
//!
//! ### HU 阈值分割与诊断直方图 ✅
//!
//! 实现位于 `ct-airway/src/segment.rs`.
//!
//! ### 三维形态学工具箱 ✅
//!
//! 球形结构元的膨胀/腐蚀/闭运算, 空洞填充, 小连通域去除, 切片裁剪,
//! 以及 6-/26-/切片内 8-邻接的连通域标记.
//!
//! 实现位于 `ct-airway/src/morph`.
//!
//! ### 肺分割与气道分割 ✅
//!
//! 气道部分额外包括细分支回收 (R 树最近邻) 与分叉处外壳补偿.
//!
//! 实现位于 `ct-airway/src/engine`.
//!
//! ### 骨架化 ✅
//!
//! (26, 6) 简单点的方向性顺序细化, 边缘裁剪, 最大连通域提取,
//! 以及基于欧拉示性数的拓扑度量.
//!
//! 实现位于 `ct-airway/src/skeleton`.
//!
//! ### 分支级图结构 (节点/边/分叉语义) ❌
//!
//! 不在计划内.

/// 三维索引 `(z, h, w)`, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 物理坐标 (毫米), 顺序与 [`Idx3d`] 相同.
pub type Idx3dF = [f64; 3];

/// 一个连通区域的全部体素索引.
pub type Area3d = Vec<Idx3d>;

/// 若干连通区域.
pub type Areas3d = Vec<Area3d>;

pub mod config;
pub mod consts;
mod data;
pub mod dataset;
pub mod engine;
mod error;
pub mod morph;
pub mod pipeline;
pub mod prelude;
pub mod segment;
pub mod skeleton;

pub use data::{HuBand, Mask, Spacing, Volume, VoxelGrid};
pub use error::{Error, Result};
pub use skeleton::Skeleton;
