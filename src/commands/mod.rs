//! CLI command handlers for modelbench.
//!
//! Each command has its own module with handler functions.
//!
//! # Commands
//!
//! - [`profile`] - Sample memory of arbitrary shell commands
//! - [`formats`] - Compare footprint formats
//! - [`server`] - Compare runs with and without the data server
//! - [`stash`] - Move footprint formats in and out of the stash
//! - [`compress`] - Build the compressed binary footprint
//! - [`diff`] - Compare the output CSVs of two model runs
//! - [`oasis`] - Run oasislmf with two configs and compare the outputs
//! - [`config`] - Show or initialise the configuration

mod compress;
mod config;
mod diff;
mod formats;
mod oasis;
mod profile;
mod server;
mod stash;

pub use compress::compress_command;
pub use config::{config_display_command, config_init_command};
pub use diff::diff_runs_command;
pub use formats::formats_command;
pub use oasis::{oasis_compare_command, OasisCompareOptions};
pub use profile::profile_command;
pub use server::server_command;
pub use stash::{restore_command, stash_command};

use std::path::PathBuf;

use crate::bench::BenchContext;
use crate::config::{validate_config, Config};
use crate::error::{ModelbenchError, Result};
use crate::footprint::FootprintFormat;
use crate::signal::SignalHandler;

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct BenchOverrides {
    pub poll_interval_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub static_dir: Option<PathBuf>,
    pub session_dir: Option<PathBuf>,
    pub partitions: Option<u32>,
    pub keep_samples: bool,
}

impl BenchOverrides {
    /// Applies the overrides and re-validates the result.
    pub fn apply(&self, mut config: Config) -> Result<Config> {
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval_ms = ms;
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = Some(secs);
        }
        if let Some(dir) = &self.static_dir {
            config.static_dir = dir.clone();
        }
        if let Some(dir) = &self.session_dir {
            config.session_dir = dir.clone();
        }
        if let Some(partitions) = self.partitions {
            config.partitions = partitions;
        }
        config.keep_samples |= self.keep_samples;

        validate_config(&config).map_err(|e| ModelbenchError::Config(e.to_string()))?;
        Ok(config)
    }
}

/// Builds the context for a benchmark command and installs the Ctrl+C handler.
fn bench_context(config: &Config) -> Result<BenchContext> {
    let signal = SignalHandler::install()?;
    Ok(BenchContext::new(&config.session_dir, config.sampler_options())
        .with_signal(signal)
        .with_keep_samples(config.keep_samples))
}

/// Resolves format names given on the command line.
pub fn parse_formats(names: &[String]) -> Result<Vec<FootprintFormat>> {
    names
        .iter()
        .map(|name| {
            FootprintFormat::from_name(name).ok_or_else(|| {
                ModelbenchError::Config(format!(
                    "Unknown footprint format '{}'. Expected one of: binary, compressed-binary, csv, parquet",
                    name
                ))
            })
        })
        .collect()
}
