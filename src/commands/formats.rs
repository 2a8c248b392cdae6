//! Formats command handler.
//!
//! Runs the eve/modelpy partitions once per footprint format with every
//! other format stashed away.

use crate::bench::compare_formats;
use crate::config::load_effective_config;
use crate::error::Result;
use crate::output::{
    print_format_comparison, print_interrupted, print_phase_banner, print_phase_footer,
    print_profile_report, BannerColor,
};
use crate::progress::SpinnerProgress;
use crate::stash::ModelRunFileManager;

use super::{bench_context, parse_formats, BenchOverrides};

/// Compare footprint formats.
///
/// `formats` falls back to the configured list when empty.
pub fn formats_command(formats: &[String], overrides: &BenchOverrides) -> Result<()> {
    let config = overrides.apply(load_effective_config()?)?;
    let formats = if formats.is_empty() {
        config.formats.clone()
    } else {
        parse_formats(formats)?
    };

    let ctx = bench_context(&config)?;
    let manager = ModelRunFileManager::new(&config.static_dir)?;

    print_phase_banner("FOOTPRINT FORMATS", BannerColor::Cyan);
    let mut progress = SpinnerProgress::new(ctx.signal.clone());
    let result = compare_formats(&manager, &formats, config.partitions, &ctx, |event| {
        progress.handle(event)
    });

    let reports = match result {
        Ok(reports) => reports,
        Err(e) => {
            progress.abort(&e.to_string());
            print_phase_footer(BannerColor::Red);
            return Err(e);
        }
    };

    for report in &reports {
        print_profile_report(report);
    }
    print_format_comparison(&reports);

    if ctx.signal.is_interrupted() {
        print_phase_footer(BannerColor::Yellow);
        print_interrupted();
    } else {
        print_phase_footer(BannerColor::Green);
    }
    Ok(())
}
