//! Timing and memory reports.

use std::path::Path;
use std::time::Duration;

use crate::bench::{ProfileReport, ServerComparison};
use crate::runs::{CsvDiff, RunDiff};
use crate::sampler::TargetSummary;

use super::colors::*;
use super::messages::print_warning;

const KIB: f64 = 1024.0;
const MIB: f64 = KIB * 1024.0;
const GIB: f64 = MIB * 1024.0;

/// Human-readable byte count, e.g. `512 B`, `1.50 MiB`.
pub fn format_bytes(bytes: u64) -> String {
    let value = bytes as f64;
    if value >= GIB {
        format!("{:.2} GiB", value / GIB)
    } else if value >= MIB {
        format!("{:.2} MiB", value / MIB)
    } else if value >= KIB {
        format!("{:.2} KiB", value / KIB)
    } else {
        format!("{} B", bytes)
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs >= 60.0 {
        let whole = elapsed.as_secs();
        format!("{}m {:.1}s", whole / 60, secs - (whole / 60 * 60) as f64)
    } else {
        format!("{:.2}s", secs)
    }
}

fn format_summary(summary: &TargetSummary, role: &str) -> String {
    match (summary.peak, summary.average) {
        (Some(peak), Some(average)) => format!(
            "  {BLUE}pid {:<8}{RESET} {:<8} peak {:>12}  avg {:>12}  {GRAY}({} samples){RESET}",
            summary.pid,
            role,
            format_bytes(peak),
            format_bytes(average.round() as u64),
            summary.samples
        ),
        _ => format!(
            "  {BLUE}pid {:<8}{RESET} {:<8} {YELLOW}no data{RESET} {GRAY}(exited before the first sample){RESET}",
            summary.pid, role
        ),
    }
}

/// Print elapsed time and per-process memory for one profiled run.
pub fn print_profile_report(report: &ProfileReport) {
    println!("{BOLD}{}{RESET}", report.label);
    println!(
        "  {CYAN}Elapsed:{RESET} {}   {GRAY}{} sampling passes{RESET}",
        format_elapsed(report.elapsed),
        report.series.passes
    );

    for summary in report.series.summaries() {
        let role = if report.helper_pids.contains(&summary.pid) {
            "helper"
        } else {
            "model"
        };
        println!("{}", format_summary(&summary, role));
    }

    for (command, code) in report.commands.iter().zip(&report.exit_codes) {
        match code {
            Some(0) => {}
            Some(code) => println!("  {RED}exit {}{RESET} {GRAY}{}{RESET}", code, command),
            None => println!("  {YELLOW}killed{RESET} {GRAY}{}{RESET}", command),
        }
    }

    if report.series.timed_out {
        println!("  {YELLOW}Sampling stopped at the configured timeout{RESET}");
    }
    if let Some(path) = &report.samples_path {
        println!("  {GRAY}Samples kept in {}{RESET}", path.display());
    }
    println!();
}

/// Print a side-by-side summary of footprint format runs.
pub fn print_format_comparison(reports: &[ProfileReport]) {
    if reports.is_empty() {
        return;
    }

    println!("{BOLD}Summary{RESET}");
    for report in reports {
        println!(
            "  {:<28} {:>10}   total peak {:>12}",
            report.label,
            format_elapsed(report.elapsed),
            format_bytes(report.series.total_peak())
        );
    }
    println!();
}

pub fn print_server_comparison(comparison: &ServerComparison) {
    let mut reports = vec![comparison.baseline.clone()];
    reports.extend(comparison.with_server.clone());
    print_format_comparison(&reports);
}

/// Print the row difference for one output file.
pub fn print_csv_diff(name: &str, diff: &CsvDiff) {
    println!(
        "{BOLD}{}{RESET} {GRAY}left {} rows, right {} rows{RESET}",
        name, diff.left_rows, diff.right_rows
    );
    if diff.is_identical() {
        println!("  {GREEN}no difference{RESET}");
        return;
    }

    println!("  {YELLOW}{} differing rows{RESET}", diff.differing.len());
    for row in diff.differing.iter().take(5) {
        println!("    {}", row.join(","));
    }
    if diff.differing.len() > 5 {
        println!("    {GRAY}...{RESET}");
    }
}

/// Print every output file diff of two runs and an overall verdict.
///
/// Returns the number of files that differ.
pub fn print_run_diff(left: &Path, right: &Path, diffs: &RunDiff) -> usize {
    println!(
        "{BOLD}Comparing{RESET} {} {BOLD}with{RESET} {}",
        left.display(),
        right.display()
    );
    println!();

    let mut differing_files = 0;
    for (name, diff) in diffs {
        match diff {
            Some(diff) => {
                if !diff.is_identical() {
                    differing_files += 1;
                }
                print_csv_diff(name, diff);
            }
            None => print_warning(&format!("{} is missing from one of the runs", name)),
        }
    }

    println!();
    if differing_files == 0 {
        println!("{GREEN}All output files match{RESET}");
    } else {
        println!("{YELLOW}{} output files differ{RESET}", differing_files);
    }
    differing_files
}
