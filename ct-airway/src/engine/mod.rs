//! 肺与气道分割引擎.
//!
//! 两个引擎彼此独立, 都只依赖 [`crate::segment`] 与 [`crate::morph`] 提供的纯函数.
//! 气道引擎在默认配置下额外执行细分支回收与分叉处外壳补偿.

mod airway;
mod lung;
mod recovery;
mod shell;

pub use airway::{segment_airway, AirwaySegmentation};
pub use lung::segment_lungs;
pub use recovery::{recover_thin_branches, Fragment, MergedFragment, RecoveryReport};
pub use shell::{add_shell, bifurcations};
