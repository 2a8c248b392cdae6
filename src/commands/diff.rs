//! Diff-runs command handler.
//!
//! Compares the standard output CSVs of two oasislmf runs, typically one run
//! per footprint format, to check the formats produce the same losses.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::output::print_run_diff;
use crate::runs::{compare_runs, find_recent_run, rename_run};

/// Diff two runs.
///
/// When `right` is omitted the most recent `losses-*` run in `runs_dir` is
/// used, renamed to `rename` first when one is given.
pub fn diff_runs_command(
    left: PathBuf,
    right: Option<PathBuf>,
    runs_dir: &Path,
    rename: Option<&str>,
) -> Result<()> {
    let right = match right {
        Some(path) => path,
        None => {
            let recent = find_recent_run(runs_dir)?;
            match rename {
                Some(name) => rename_run(&recent, name)?,
                None => recent,
            }
        }
    };

    let diffs = compare_runs(&left, &right)?;
    print_run_diff(&left, &right, &diffs);
    Ok(())
}
