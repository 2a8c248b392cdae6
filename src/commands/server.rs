//! Server command handler.

use crate::bench::compare_data_server;
use crate::config::load_effective_config;
use crate::error::Result;
use crate::output::{
    print_interrupted, print_phase_banner, print_phase_footer, print_profile_report,
    print_server_comparison, BannerColor,
};
use crate::progress::SpinnerProgress;

use super::{bench_context, BenchOverrides};

/// Profile the partitions reading footprints directly, then through `servedata`.
pub fn server_command(overrides: &BenchOverrides) -> Result<()> {
    let config = overrides.apply(load_effective_config()?)?;
    let ctx = bench_context(&config)?;

    print_phase_banner("DATA SERVER", BannerColor::Cyan);
    let mut progress = SpinnerProgress::new(ctx.signal.clone());
    let result = compare_data_server(&config.static_dir, config.partitions, &ctx, |event| {
        progress.handle(event)
    });

    let comparison = match result {
        Ok(comparison) => comparison,
        Err(e) => {
            progress.abort(&e.to_string());
            print_phase_footer(BannerColor::Red);
            return Err(e);
        }
    };

    print_profile_report(&comparison.baseline);
    if let Some(with_server) = &comparison.with_server {
        print_profile_report(with_server);
    }
    print_server_comparison(&comparison);

    if ctx.signal.is_interrupted() {
        print_phase_footer(BannerColor::Yellow);
        print_interrupted();
    } else {
        print_phase_footer(BannerColor::Green);
    }
    Ok(())
}
