//! End-to-end comparison of two oasislmf model runs.
//!
//! Each side writes an MDK config, runs `oasislmf model run --config` on it,
//! and renames the `losses-*` run directory it produced. The standard output
//! CSVs of both runs are then diffed. Config files are removed once their run
//! has finished, whether or not it succeeded.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ModelbenchError, Result};
use crate::process::CommandRun;
use crate::runs::{compare_runs, find_recent_run, rename_run, RunDiff};

/// The MDK configuration handed to `oasislmf model run`.
///
/// Keys this struct does not know about are kept in `extra` and written back
/// unchanged, so any base config can be reused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MdkConfig {
    pub analysis_settings_json: String,
    pub lookup_data_dir: String,
    pub lookup_module_path: String,
    pub model_data_dir: String,
    pub model_version_csv: String,
    pub oed_accounts_csv: String,
    pub oed_location_csv: String,
    pub hashed_group_id: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for MdkConfig {
    fn default() -> Self {
        Self {
            analysis_settings_json: "analysis_settings.json".to_string(),
            lookup_data_dir: "keys_data".to_string(),
            lookup_module_path: "src/keys_server/ParisWindstormKeysLookup.py".to_string(),
            model_data_dir: "model_data".to_string(),
            model_version_csv: "keys_data/ModelVersion.csv".to_string(),
            oed_accounts_csv: "tests/account.csv".to_string(),
            oed_location_csv: "tests/location.csv".to_string(),
            hashed_group_id: true,
            extra: Map::new(),
        }
    }
}

impl MdkConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn with_location_csv(mut self, location_csv: impl Into<String>) -> Self {
        self.oed_location_csv = location_csv.into();
        self
    }
}

/// One side of the comparison: the name its run directory is renamed to,
/// and the config it runs with.
#[derive(Debug, Clone)]
pub struct OasisRun {
    pub name: String,
    pub config: MdkConfig,
}

/// Where the comparison writes and looks for things.
#[derive(Debug, Clone)]
pub struct OasisWorkspace {
    /// Directory the MDK config files are written to
    pub work_dir: PathBuf,
    /// Directory oasislmf writes its `losses-*` runs into
    pub runs_dir: PathBuf,
    /// Remove `runs_dir` before the first run
    pub clean_runs: bool,
}

#[derive(Debug, Clone)]
pub struct OasisComparison {
    pub left_run: PathBuf,
    pub right_run: PathBuf,
    pub diffs: RunDiff,
}

/// Runs both configs through oasislmf and diffs their outputs.
pub fn compare_oasis_runs(
    workspace: &OasisWorkspace,
    left: &OasisRun,
    right: &OasisRun,
) -> Result<OasisComparison> {
    compare_oasis_runs_with(workspace, left, right, run_oasislmf)
}

/// Same as [`compare_oasis_runs`], with the model invocation supplied by the caller.
///
/// `run_model` receives the path of the config file for one side and must
/// leave a new `losses-*` directory in the runs directory.
pub fn compare_oasis_runs_with<R>(
    workspace: &OasisWorkspace,
    left: &OasisRun,
    right: &OasisRun,
    mut run_model: R,
) -> Result<OasisComparison>
where
    R: FnMut(&Path) -> Result<()>,
{
    if workspace.clean_runs && workspace.runs_dir.exists() {
        log::debug!("removing previous runs in {}", workspace.runs_dir.display());
        fs::remove_dir_all(&workspace.runs_dir)?;
    }

    let left_run = execute(workspace, left, &mut run_model)?;
    let right_run = execute(workspace, right, &mut run_model)?;
    let diffs = compare_runs(&left_run, &right_run)?;

    Ok(OasisComparison {
        left_run,
        right_run,
        diffs,
    })
}

fn execute<R>(workspace: &OasisWorkspace, run: &OasisRun, run_model: &mut R) -> Result<PathBuf>
where
    R: FnMut(&Path) -> Result<()>,
{
    fs::create_dir_all(&workspace.work_dir)?;
    let config_path = workspace.work_dir.join(format!("{}_mdk.json", run.name));
    fs::write(&config_path, serde_json::to_string_pretty(&run.config)?)?;

    let result = run_model(&config_path);
    if let Err(e) = fs::remove_file(&config_path) {
        log::warn!("failed to remove {}: {}", config_path.display(), e);
    }
    result?;

    let recent = find_recent_run(&workspace.runs_dir)?;
    rename_run(&recent, &run.name)
}

fn run_oasislmf(config_path: &Path) -> Result<()> {
    let command = format!("oasislmf model run --config {}", config_path.display());
    let mut run = CommandRun::new([command.clone()]);
    run.fire()?;

    match run.wait()?.first() {
        Some(status) if status.success() => Ok(()),
        Some(status) => Err(ModelbenchError::CommandFailed(format!(
            "`{}` exited with {}",
            command, status
        ))),
        None => Err(ModelbenchError::CommandFailed(command)),
    }
}
