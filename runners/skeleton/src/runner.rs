//! 程序运行函数.

use crate::result::SkeletonResult;
use ct_airway::config::PipelineConfig;
use ct_airway::pipeline;
use log::info;
use std::fs;
use std::time::Instant;
use utils::loader;

/// 实际运行.
pub fn run() -> ct_airway::Result<SkeletonResult> {
    let scan_path = loader::scan_path_from_env_or_home();
    let out_dir = loader::output_dir_from_env_or_home();
    info!("Loading {}", scan_path.display());
    let volume = loader::scan_from_env_or_home()?;

    println!("Running pipeline on {} cores...", utils::cpus());
    let config = PipelineConfig::default();
    let start = Instant::now();
    let out = pipeline::run(&volume, &config)?;
    let elapsed = start.elapsed();

    fs::create_dir_all(&out_dir)?;
    out.lungs.write_npy(out_dir.join("lungs.npy"))?;
    out.airway.write_npy(out_dir.join("airway.npy"))?;
    out.lung_skeleton.write_points(out_dir.join("lung_skeleton.csv"))?;
    out.airway_skeleton.write_points(out_dir.join("airway_skeleton.csv"))?;
    info!("Results written to {}", out_dir.display());

    Ok(SkeletonResult::new(out, elapsed))
}
