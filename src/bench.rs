//! Benchmark scenarios built from the launcher, sampler and stash.
//!
//! Every scenario follows the same session order: fire the commands, start
//! the sampler on their pids, wait for every command, then stop and join the
//! sampler before loading its series.

use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::{Duration, Instant};

use crate::error::{ModelbenchError, Result};
use crate::footprint::{compress_command, FootprintFormat};
use crate::process::{eve_commands, CommandRun};
use crate::sampler::{ProcessMemorySampler, SampleSeries, SamplerOptions, SessionStore};
use crate::signal::SignalHandler;
use crate::stash::{EntryKind, ModelRunFileManager};

/// Settings shared by every profiled run.
#[derive(Clone)]
pub struct BenchContext {
    pub options: SamplerOptions,
    pub session_root: PathBuf,
    pub keep_samples: bool,
    pub signal: SignalHandler,
}

impl BenchContext {
    pub fn new(session_root: impl Into<PathBuf>, options: SamplerOptions) -> Self {
        Self {
            options,
            session_root: session_root.into(),
            keep_samples: false,
            signal: SignalHandler::detached(),
        }
    }

    pub fn with_signal(mut self, signal: SignalHandler) -> Self {
        self.signal = signal;
        self
    }

    pub fn with_keep_samples(mut self, keep: bool) -> Self {
        self.keep_samples = keep;
        self
    }
}

/// Timing and memory for one batch of commands.
#[derive(Debug, Clone)]
pub struct ProfileReport {
    pub label: String,
    pub commands: Vec<String>,
    /// Pids of the profiled commands, in command order
    pub pids: Vec<u32>,
    /// Pids sampled alongside the commands (e.g. the data server)
    pub helper_pids: Vec<u32>,
    /// Exit codes in command order; `None` when killed by a signal
    pub exit_codes: Vec<Option<i32>>,
    /// Wall time from firing the commands until the last one exited
    pub elapsed: Duration,
    pub series: SampleSeries,
    /// Where the samples were left, when `keep_samples` is set
    pub samples_path: Option<PathBuf>,
}

impl ProfileReport {
    pub fn all_succeeded(&self) -> bool {
        self.exit_codes.iter().all(|code| *code == Some(0))
    }
}

/// Progress notifications for the caller's display.
#[derive(Debug)]
pub enum BenchEvent<'a> {
    RunStarted { label: &'a str, processes: usize },
    RunFinished(&'a ProfileReport),
}

/// Profiles an arbitrary batch of shell commands.
pub fn profile_commands<F>(
    label: &str,
    commands: Vec<String>,
    ctx: &BenchContext,
    mut on_progress: F,
) -> Result<ProfileReport>
where
    F: FnMut(BenchEvent<'_>),
{
    on_progress(BenchEvent::RunStarted {
        label,
        processes: commands.len(),
    });
    let report = run_profiled(label, commands, &[], ctx)?;
    on_progress(BenchEvent::RunFinished(&report));
    Ok(report)
}

fn run_profiled(
    label: &str,
    commands: Vec<String>,
    helper_pids: &[u32],
    ctx: &BenchContext,
) -> Result<ProfileReport> {
    let mut run = CommandRun::new(commands);
    let start = Instant::now();
    run.fire()?;

    let pids = run.pids();
    let targets = pids.iter().chain(helper_pids).copied();
    let store = SessionStore::new(&ctx.session_root);

    let handle = match ProcessMemorySampler::new(targets, store.clone())
        .and_then(|sampler| sampler.with_options(ctx.options).start())
    {
        Ok(handle) => handle,
        Err(e) => {
            run.kill();
            return Err(e);
        }
    };

    // Dropping `handle` on an early return still stops and joins the sampler
    let statuses = run.wait()?;
    let elapsed = start.elapsed();
    if ctx.signal.is_interrupted() {
        log::debug!("interrupted while running `{}`", label);
    }

    let series = handle.finish()?;
    let samples_path = if ctx.keep_samples {
        Some(store.session_dir().to_path_buf())
    } else {
        store.cleanup()?;
        None
    };

    log::debug!(
        "{} finished in {:.2}s over {} sampling passes",
        label,
        elapsed.as_secs_f64(),
        series.passes
    );

    Ok(ProfileReport {
        label: label.to_string(),
        commands: run.commands().to_vec(),
        pids,
        helper_pids: helper_pids.to_vec(),
        exit_codes: statuses.iter().map(ExitStatus::code).collect(),
        elapsed,
        series,
        samples_path,
    })
}

/// Runs the eve/modelpy partitions once per footprint format.
///
/// Before each run every other format is moved into the stash so modelpy can
/// only read the one under test; the stash is restored afterwards even if
/// the run fails.
pub fn compare_formats<F>(
    manager: &ModelRunFileManager,
    formats: &[FootprintFormat],
    partitions: u32,
    ctx: &BenchContext,
    on_progress: F,
) -> Result<Vec<ProfileReport>>
where
    F: FnMut(BenchEvent<'_>),
{
    compare_formats_with(
        manager,
        formats,
        ctx,
        |format| eve_commands(partitions, &format.isolation_args()),
        on_progress,
    )
}

/// Same as [`compare_formats`], with the commands for each format supplied by the caller.
pub fn compare_formats_with<C, F>(
    manager: &ModelRunFileManager,
    formats: &[FootprintFormat],
    ctx: &BenchContext,
    mut commands_for: C,
    mut on_progress: F,
) -> Result<Vec<ProfileReport>>
where
    C: FnMut(FootprintFormat) -> Vec<String>,
    F: FnMut(BenchEvent<'_>),
{
    let mut reports = Vec::with_capacity(formats.len());

    for &format in formats {
        if ctx.signal.is_interrupted() {
            log::warn!("skipping remaining formats after interrupt");
            break;
        }

        if !format_present(manager.static_path(), format) {
            log::warn!(
                "no {} footprint files found in {}",
                format,
                manager.static_path().display()
            );
        }

        let stashed = stash_other_formats(manager, format)?;
        let label = format!("{} footprint", format);
        let result = profile_commands(&label, commands_for(format), ctx, &mut on_progress);
        let restored = restore(manager, &stashed);

        reports.push(result?);
        restored?;
    }

    Ok(reports)
}

fn format_present(static_path: &Path, format: FootprintFormat) -> bool {
    format
        .entries()
        .iter()
        .any(|(name, _)| static_path.join(name).exists())
}

/// Stashes every format but `keep`.
///
/// On failure the entries already moved are put back before the error is
/// returned, so the static directory is never left half-stashed.
fn stash_other_formats(
    manager: &ModelRunFileManager,
    keep: FootprintFormat,
) -> Result<Vec<(&'static str, EntryKind)>> {
    let mut stashed = Vec::new();
    for format in FootprintFormat::ALL.iter().filter(|f| **f != keep) {
        for &(name, kind) in format.entries() {
            match manager.move_to_stash(name, kind) {
                Ok(true) => stashed.push((name, kind)),
                Ok(false) => {}
                Err(e) => {
                    if let Err(restore_err) = restore(manager, &stashed) {
                        log::warn!("failed to restore stashed files: {}", restore_err);
                    }
                    return Err(e);
                }
            }
        }
    }
    Ok(stashed)
}

fn restore(
    manager: &ModelRunFileManager,
    stashed: &[(&'static str, EntryKind)],
) -> Result<()> {
    for &(name, kind) in stashed {
        manager.get_from_stash(name, kind)?;
    }
    Ok(())
}

/// Baseline and data-server runs of the same partitions.
#[derive(Debug, Clone)]
pub struct ServerComparison {
    pub baseline: ProfileReport,
    /// `None` when the run was interrupted before the data-server run started
    pub with_server: Option<ProfileReport>,
}

/// Profiles the partitions reading files directly, then through `servedata`.
///
/// The data server is sampled alongside the partitions and killed once the
/// sampler has been joined, since it never exits on its own.
pub fn compare_data_server<F>(
    static_dir: &Path,
    partitions: u32,
    ctx: &BenchContext,
    mut on_progress: F,
) -> Result<ServerComparison>
where
    F: FnMut(BenchEvent<'_>),
{
    let baseline = profile_commands(
        "without data server",
        eve_commands(partitions, ""),
        ctx,
        &mut on_progress,
    )?;

    if ctx.signal.is_interrupted() {
        log::warn!("skipping the data server run after interrupt");
        return Ok(ServerComparison {
            baseline,
            with_server: None,
        });
    }

    let server_command = format!("servedata {} {}", static_dir.display(), partitions);
    let with_server = profile_with_helper(
        "with data server",
        eve_commands(partitions, "--data-server"),
        server_command,
        ctx,
        &mut on_progress,
    )?;

    Ok(ServerComparison {
        baseline,
        with_server: Some(with_server),
    })
}

/// Profiles `commands` while also sampling a long-lived helper command.
pub fn profile_with_helper<F>(
    label: &str,
    commands: Vec<String>,
    helper_command: String,
    ctx: &BenchContext,
    mut on_progress: F,
) -> Result<ProfileReport>
where
    F: FnMut(BenchEvent<'_>),
{
    let mut helper = CommandRun::new([helper_command]);
    helper.fire()?;

    on_progress(BenchEvent::RunStarted {
        label,
        processes: commands.len() + 1,
    });
    let result = run_profiled(label, commands, &helper.pids(), ctx);
    helper.kill();

    let report = result?;
    on_progress(BenchEvent::RunFinished(&report));
    Ok(report)
}

/// Runs the footprint compression pipeline and waits for it.
pub fn compress_footprint(static_dir: &Path, intensity_bins: u32) -> Result<Duration> {
    let command = compress_command(static_dir, intensity_bins);
    log::debug!("compressing footprint: {}", command);

    let mut run = CommandRun::new([command.clone()]);
    let start = Instant::now();
    run.fire()?;
    let statuses = run.wait()?;

    match statuses.first() {
        Some(status) if status.success() => Ok(start.elapsed()),
        Some(status) => Err(ModelbenchError::CommandFailed(format!(
            "`{}` exited with {}",
            command, status
        ))),
        None => Err(ModelbenchError::CommandFailed(command)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn context(temp_dir: &TempDir) -> BenchContext {
        BenchContext::new(
            temp_dir.path().join("sessions"),
            SamplerOptions {
                poll_interval: Duration::from_millis(2),
                timeout: Some(Duration::from_secs(30)),
            },
        )
    }

    #[test]
    fn test_profile_commands_reports_every_target() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = context(&temp_dir);
        let commands = vec!["sleep 0.3".to_string(), "sleep 0.3".to_string()];

        let mut events = Vec::new();
        let report = profile_commands("sleepers", commands, &ctx, |event| {
            events.push(match event {
                BenchEvent::RunStarted { processes, .. } => format!("started {}", processes),
                BenchEvent::RunFinished(r) => format!("finished {}", r.label),
            })
        })
        .unwrap();

        assert_eq!(events, vec!["started 2", "finished sleepers"]);
        assert_eq!(report.pids.len(), 2);
        assert!(report.all_succeeded());
        assert!(report.elapsed >= Duration::from_millis(300));
        for pid in &report.pids {
            assert!(report.series.peak(*pid).unwrap() > 0);
        }
        assert!(!report.series.timed_out);
    }

    #[test]
    fn test_profile_commands_cleans_up_session() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = context(&temp_dir);

        let report = profile_commands("quick", vec!["true".to_string()], &ctx, |_| {}).unwrap();

        assert!(report.samples_path.is_none());
        let sessions = temp_dir.path().join("sessions");
        assert_eq!(fs::read_dir(sessions).unwrap().count(), 0);
    }

    #[test]
    fn test_profile_commands_keeps_samples_when_asked() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = context(&temp_dir).with_keep_samples(true);

        let report = profile_commands("kept", vec!["true".to_string()], &ctx, |_| {}).unwrap();

        let dir = report.samples_path.unwrap();
        let store = SessionStore::for_session(dir.parent().unwrap(), &report.series.session_id);
        assert_eq!(store.load().unwrap(), report.series);
    }

    #[test]
    fn test_profile_commands_records_failures() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = context(&temp_dir);

        let report = profile_commands("fails", vec!["exit 2".to_string()], &ctx, |_| {}).unwrap();

        assert!(!report.all_succeeded());
        assert_eq!(report.exit_codes, vec![Some(2)]);
    }

    #[test]
    fn test_profile_with_helper_samples_and_kills_helper() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = context(&temp_dir);

        let report = profile_with_helper(
            "helper",
            vec!["sleep 0.2".to_string()],
            "sleep 30".to_string(),
            &ctx,
            |_| {},
        )
        .unwrap();

        assert_eq!(report.helper_pids.len(), 1);
        let helper = report.helper_pids[0];
        assert!(report.series.peak(helper).unwrap() > 0);
    }

    #[test]
    fn test_compare_formats_isolates_each_format() {
        let temp_dir = TempDir::new().unwrap();
        let static_dir = temp_dir.path().join("static");
        fs::create_dir_all(static_dir.join("footprint.parquet")).unwrap();
        for name in ["footprint.bin", "footprint.idx", "footprint.csv"] {
            fs::write(static_dir.join(name), name).unwrap();
        }
        let manager = ModelRunFileManager::new(&static_dir).unwrap();
        let ctx = context(&temp_dir);
        let dir = static_dir.display().to_string();

        let reports = compare_formats_with(
            &manager,
            &[FootprintFormat::Binary, FootprintFormat::Parquet],
            &ctx,
            |format| match format {
                FootprintFormat::Binary => vec![format!(
                    "test -f {dir}/footprint.bin && test ! -e {dir}/footprint.parquet && test ! -e {dir}/footprint.csv"
                )],
                _ => vec![format!(
                    "test -d {dir}/footprint.parquet && test ! -e {dir}/footprint.bin"
                )],
            },
            |_| {},
        )
        .unwrap();

        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(ProfileReport::all_succeeded));
        assert_eq!(reports[0].label, "binary footprint");

        // Everything is back where it started
        for name in ["footprint.bin", "footprint.idx", "footprint.csv"] {
            assert!(static_dir.join(name).is_file());
        }
        assert!(static_dir.join("footprint.parquet").is_dir());
        assert_eq!(fs::read_dir(manager.stash_path()).unwrap().count(), 0);
    }

    #[test]
    fn test_compare_formats_stops_after_interrupt() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ModelRunFileManager::new(temp_dir.path().join("static")).unwrap();
        let ctx = context(&temp_dir);
        ctx.signal.trigger();

        let reports =
            compare_formats_with(&manager, &FootprintFormat::ALL, &ctx, |_| vec![], |_| {})
                .unwrap();
        assert!(reports.is_empty());
    }

    #[test]
    fn test_exited_command_stops_collecting_readings() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = context(&temp_dir);
        let commands = vec!["sleep 0.5".to_string(), "exit 0".to_string()];

        let report = profile_commands("fast and slow", commands, &ctx, |_| {}).unwrap();

        let slow = report.series.readings(report.pids[0]).unwrap();
        let fast = report.series.readings(report.pids[1]).unwrap();
        assert!(slow.len() > fast.len());
        assert!(fast.iter().all(|bytes| *bytes > 0));
        if fast.is_empty() {
            assert!(matches!(
                report.series.average(report.pids[1]),
                Err(ModelbenchError::EmptySeries(_))
            ));
        }
    }

    #[test]
    fn test_failed_stash_restores_moved_files() {
        let temp_dir = TempDir::new().unwrap();
        let static_dir = temp_dir.path().join("static");
        fs::create_dir_all(&static_dir).unwrap();
        for name in ["footprint.bin", "footprint.idx", "footprint.bin.z", "footprint.csv"] {
            fs::write(static_dir.join(name), name).unwrap();
        }
        let manager = ModelRunFileManager::new(&static_dir).unwrap();
        // A leftover csv in the stash makes the csv move fail after the binaries moved
        fs::write(manager.stash_path().join("footprint.csv"), "old").unwrap();
        let ctx = context(&temp_dir);

        let mut started = 0;
        let result = compare_formats_with(
            &manager,
            &[FootprintFormat::Parquet],
            &ctx,
            |_| vec!["true".to_string()],
            |_| started += 1,
        );

        assert!(matches!(result, Err(ModelbenchError::StashConflict(_))));
        assert_eq!(started, 0);
        for name in ["footprint.bin", "footprint.idx", "footprint.bin.z", "footprint.csv"] {
            assert!(static_dir.join(name).is_file(), "{} was not restored", name);
        }
        assert!(!manager.stash_path().join("footprint.bin").exists());
        assert_eq!(fs::read_to_string(manager.stash_path().join("footprint.csv")).unwrap(), "old");
    }

    #[test]
    fn test_compare_data_server_skips_server_after_interrupt() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = context(&temp_dir);
        ctx.signal.trigger();

        let mut labels = Vec::new();
        let comparison = compare_data_server(temp_dir.path(), 1, &ctx, |event| {
            if let BenchEvent::RunStarted { label, .. } = event {
                labels.push(label.to_string());
            }
        })
        .unwrap();

        assert_eq!(labels, vec!["without data server"]);
        assert!(comparison.with_server.is_none());
    }

    #[test]
    fn test_compress_footprint_reports_failure() {
        let temp_dir = TempDir::new().unwrap();
        // No footprint files in an empty directory
        let result = compress_footprint(temp_dir.path(), 10);
        assert!(matches!(result, Err(ModelbenchError::CommandFailed(_))));
    }
}
