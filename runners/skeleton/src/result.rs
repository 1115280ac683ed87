//! 运行结果.

use ct_airway::pipeline::PipelineOutput;
use ct_airway::{Mask, Skeleton};
use std::io::{self, Write};
use std::time::Duration;

const S4: &str = "    ";

/// 将一组掩膜与骨架的结果写进 `w` 中.
fn describe_into<W: Write>(name: &str, mask: &Mask, skeleton: &Skeleton, w: &mut W) -> io::Result<()> {
    writeln!(w, "Output `{name}`:")?;
    writeln!(w, "{S4}Mask voxels: {}", mask.count())?;
    writeln!(w, "{S4}Mask volume: {}", utils::ml(mask.volume_mm3()))?;
    writeln!(w, "{S4}Skeleton voxels: {}", skeleton.len())?;
    write!(w, "{S4}Trimmed at edges: {}", skeleton.edge_trimmed())?;
    Ok(())
}

/// 一次运行的最终结果.
pub struct SkeletonResult {
    out: PipelineOutput,
    elapsed: Duration,
}

impl SkeletonResult {
    pub fn new(out: PipelineOutput, elapsed: Duration) -> Self {
        Self { out, elapsed }
    }

    /// 分析运行结果.
    pub fn analyze(&self) {
        utils::sep();
        let mut buf = Vec::with_capacity(512);
        let out = &self.out;

        for (key, mask, skeleton) in [
            ("lungs", &out.lungs, &out.lung_skeleton),
            ("airway", &out.airway, &out.airway_skeleton),
        ] {
            describe_into(key, mask, skeleton, &mut buf).unwrap();
            println!("{}", String::from_utf8_lossy(&buf));
            buf.clear();

            utils::sep();
        }

        let r = &out.recovery;
        println!("Thin-branch recovery:");
        println!("{S4}Passes: {}", r.passes);
        println!("{S4}Fragments merged: {}", r.merged.len());
        println!("{S4}Fragments rejected: {}", r.rejected);
        println!("{S4}Voxels added: {}", r.voxels_added);
        println!("{S4}Shell voxels added: {}", out.shell_voxels);
        for m in r.merged.iter() {
            let [z, h, w] = m.centroid;
            println!(
                "{S4}{S4}pass {}: {} voxels at ({z:.1}, {h:.1}, {w:.1}) mm, {:.2} mm away",
                m.pass, m.size, m.distance_mm
            );
        }
        utils::sep();

        if let Some(d) = out.diagnostics.as_ref() {
            println!("HU census:");
            for (band, count) in d.census.iter() {
                println!("{S4}{:?}..{:?}: {count}", band.low(), band.high());
            }
            if let Some(hist) = d.histogram.as_ref() {
                println!("{S4}Histogram mode: {} HU", hist.mode());
            }
            utils::sep();
        }

        let empty = out.empty_outputs();
        if !empty.is_empty() {
            println!("Empty outputs: {}", empty.join(", "));
        }
        println!("Total machine time: {} ms", self.elapsed.as_millis());
    }
}
