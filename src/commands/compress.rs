//! Compress command handler.

use std::path::PathBuf;

use crate::bench::compress_footprint;
use crate::config::load_effective_config;
use crate::error::Result;
use crate::output::{GREEN, RESET};

/// Convert `footprint.bin` into `footprint.bin.z` and report how long it took.
pub fn compress_command(intensity_bins: u32, static_dir: Option<PathBuf>) -> Result<()> {
    let static_dir = match static_dir {
        Some(dir) => dir,
        None => load_effective_config()?.static_dir,
    };

    let elapsed = compress_footprint(&static_dir, intensity_bins)?;
    println!(
        "{GREEN}Compressed footprint in {} in {:.2}s{RESET}",
        static_dir.display(),
        elapsed.as_secs_f64()
    );
    Ok(())
}
