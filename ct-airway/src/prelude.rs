//! 🫁欢迎光临🌳
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Area3d, Areas3d, Idx3d, Idx3dF};

pub use crate::{Error, HuBand, Mask, Result, Spacing, Volume, VoxelGrid};

pub use crate::config::{
    AirwayConfig, DiagnosticsConfig, LungConfig, PipelineConfig, RecoveryConfig, SkeletonConfig,
};

pub use crate::engine::{segment_airway, segment_lungs, AirwaySegmentation, RecoveryReport};
pub use crate::morph::Connectivity;
pub use crate::pipeline::{run, Diagnostics, PipelineOutput};
pub use crate::segment::{threshold, threshold_band};
pub use crate::skeleton::{betti, skeletonize, Betti, Skeleton};

pub use crate::dataset::{self, home_dataset_dir_with};
