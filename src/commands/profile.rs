//! Profile command handler.
//!
//! Samples the resident memory of arbitrary shell commands run side by side.

use crate::bench::profile_commands;
use crate::config::load_effective_config;
use crate::error::{ModelbenchError, Result};
use crate::output::{
    print_interrupted, print_phase_banner, print_phase_footer, print_profile_report, BannerColor,
};
use crate::progress::SpinnerProgress;

use super::{bench_context, BenchOverrides};

/// Run `commands` concurrently and report their memory usage.
///
/// # Arguments
///
/// * `commands` - Shell commands to fire together, one process each
/// * `label` - Name shown in the report, defaults to `profile`
/// * `overrides` - Command-line values taking precedence over the config
pub fn profile_command(
    commands: Vec<String>,
    label: Option<String>,
    overrides: &BenchOverrides,
) -> Result<()> {
    if commands.is_empty() {
        return Err(ModelbenchError::InvalidTargetSet);
    }

    let config = overrides.apply(load_effective_config()?)?;
    let ctx = bench_context(&config)?;
    let label = label.unwrap_or_else(|| "profile".to_string());

    print_phase_banner(&label.to_uppercase(), BannerColor::Cyan);
    let mut progress = SpinnerProgress::new(ctx.signal.clone());
    let result = profile_commands(&label, commands, &ctx, |event| progress.handle(event));

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            progress.abort(&e.to_string());
            print_phase_footer(BannerColor::Red);
            return Err(e);
        }
    };

    print_profile_report(&report);
    let color = if ctx.signal.is_interrupted() || report.series.timed_out {
        BannerColor::Yellow
    } else if report.all_succeeded() {
        BannerColor::Green
    } else {
        BannerColor::Red
    };
    print_phase_footer(color);

    if ctx.signal.is_interrupted() {
        print_interrupted();
    }
    Ok(())
}
