//! Helpers for oasislmf run directories and their output CSVs.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ModelbenchError, Result};

const LOSSES_MARKER: &str = "losses";
const OUTPUT_SUBDIR: &str = "output";

/// Output files every `oasislmf model run` writes under `<run>/output/`.
pub const OUTPUT_FILES: [&str; 10] = [
    "gul_S1_aalcalc.csv",
    "gul_S1_eltcalc.csv",
    "gul_S1_leccalc_full_uncertainty_aep.csv",
    "gul_S1_leccalc_full_uncertainty_oep.csv",
    "gul_S1_summary-info.csv",
    "il_S1_aalcalc.csv",
    "il_S1_eltcalc.csv",
    "il_S1_leccalc_full_uncertainty_aep.csv",
    "il_S1_leccalc_full_uncertainty_oep.csv",
    "il_S1_summary-info.csv",
];

/// Finds the run directory oasislmf just wrote, the one named `losses-*`.
///
/// Directories that were already renamed by an earlier comparison no longer
/// match, so the newest unrenamed run is always the one returned.
pub fn find_recent_run(runs_dir: &Path) -> Result<PathBuf> {
    if !runs_dir.is_dir() {
        return Err(ModelbenchError::RunNotFound(runs_dir.to_path_buf()));
    }

    let mut candidates: Vec<PathBuf> = fs::read_dir(runs_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.contains(LOSSES_MARKER))
        })
        .collect();
    candidates.sort();

    candidates
        .pop()
        .ok_or_else(|| ModelbenchError::RunNotFound(runs_dir.to_path_buf()))
}

/// Renames the last component of `run_dir`, keeping it in the same parent.
pub fn rename_run(run_dir: &Path, new_name: &str) -> Result<PathBuf> {
    let new_path = run_dir.with_file_name(new_name);
    fs::rename(run_dir, &new_path)?;
    log::debug!("renamed {} -> {}", run_dir.display(), new_path.display());
    Ok(new_path)
}

/// Paths of the standard output CSVs for `run_dir`, in `OUTPUT_FILES` order.
pub fn output_files(run_dir: &Path) -> Vec<(&'static str, PathBuf)> {
    let output = run_dir.join(OUTPUT_SUBDIR);
    OUTPUT_FILES
        .iter()
        .map(|name| (*name, output.join(name)))
        .collect()
}

/// Record-level difference between two CSV files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvDiff {
    pub left_rows: usize,
    pub right_rows: usize,
    /// Records not matched by an identical record on the other side
    pub differing: Vec<Vec<String>>,
}

impl CsvDiff {
    pub fn is_identical(&self) -> bool {
        self.differing.is_empty()
    }
}

/// Compares two CSV files record by record, ignoring their header rows.
///
/// Records are compared by their parsed fields, so quoting does not matter
/// and quoted fields may span lines. Matching is one-for-one: a record left
/// over on either side is reported, in file order, left side first.
pub fn diff_csv(left: &Path, right: &Path) -> Result<CsvDiff> {
    let left_rows = read_records(left)?;
    let right_rows = read_records(right)?;

    let mut right_counts: HashMap<&[String], usize> = HashMap::new();
    for row in &right_rows {
        *right_counts.entry(row.as_slice()).or_insert(0) += 1;
    }

    let mut differing = Vec::new();
    for row in &left_rows {
        match right_counts.get_mut(row.as_slice()) {
            Some(count) if *count > 0 => *count -= 1,
            _ => differing.push(row.clone()),
        }
    }
    for row in &right_rows {
        if let Some(count) = right_counts.get_mut(row.as_slice()) {
            if *count > 0 {
                *count -= 1;
                differing.push(row.clone());
            }
        }
    }

    Ok(CsvDiff {
        left_rows: left_rows.len(),
        right_rows: right_rows.len(),
        differing,
    })
}

/// Per-file diffs of two runs, in `OUTPUT_FILES` order.
///
/// A file missing from either run is reported as `None`.
pub type RunDiff = Vec<(&'static str, Option<CsvDiff>)>;

/// Diffs each standard output file of two run directories.
pub fn compare_runs(left: &Path, right: &Path) -> Result<RunDiff> {
    let mut results = Vec::new();
    let pairs = output_files(left).into_iter().zip(output_files(right));
    for ((name, left_path), (_, right_path)) in pairs {
        let diff = if left_path.is_file() && right_path.is_file() {
            Some(diff_csv(&left_path, &right_path)?)
        } else {
            None
        };
        results.push((name, diff));
    }
    Ok(results)
}

fn read_records(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        records.push(record.iter().map(str::to_string).collect());
    }
    Ok(records)
}
