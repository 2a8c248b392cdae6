use crate::bench::{BenchEvent, ProfileReport};
use crate::output::{GREEN, RED, RESET, YELLOW};
use crate::signal::SignalHandler;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use terminal_size::{terminal_size, Width};

const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";
const DEFAULT_TERMINAL_WIDTH: u16 = 80;
// Spinner (2) + " Profiling " (11) + " [HH:MM:SS]" (11) = 24 chars overhead
const SPINNER_OVERHEAD: usize = 24;

/// Get the current terminal width, falling back to a default if unavailable
fn get_terminal_width() -> usize {
    terminal_size()
        .map(|(Width(w), _)| w as usize)
        .unwrap_or(DEFAULT_TERMINAL_WIDTH as usize)
}

fn format_clock(elapsed: Duration) -> String {
    let hours = elapsed.as_secs() / 3600;
    let mins = (elapsed.as_secs() % 3600) / 60;
    let secs = elapsed.as_secs() % 60;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}

// ============================================================================
// RunSpinner: one line per profiled run while its commands execute
// ============================================================================

pub struct RunSpinner {
    spinner: Arc<ProgressBar>,
    label: String,
    stop_flag: Arc<AtomicBool>,
    timer_thread: Option<JoinHandle<()>>,
}

impl RunSpinner {
    pub fn new(label: &str, processes: usize) -> Self {
        let spinner = Arc::new(ProgressBar::new_spinner());
        let style = ProgressStyle::default_spinner()
            .tick_chars(SPINNER_CHARS)
            .template("{spinner:.cyan} Profiling {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);

        let status = truncate_label(
            &format!("{} | {} processes", label, processes),
            get_terminal_width().saturating_sub(SPINNER_OVERHEAD).max(10),
        );
        spinner.set_message(format!("{} [00:00:00]", status));
        spinner.enable_steady_tick(Duration::from_millis(80));

        let stop_flag = Arc::new(AtomicBool::new(false));
        let start_time = Instant::now();

        let spinner_clone = Arc::clone(&spinner);
        let stop_flag_clone = Arc::clone(&stop_flag);

        let timer_thread = thread::spawn(move || {
            while !stop_flag_clone.load(Ordering::Relaxed) {
                thread::sleep(Duration::from_millis(250));
                if stop_flag_clone.load(Ordering::Relaxed) {
                    break;
                }
                spinner_clone.set_message(format!(
                    "{} [{}]",
                    status,
                    format_clock(start_time.elapsed())
                ));
            }
        });

        Self {
            spinner,
            label: label.to_string(),
            stop_flag,
            timer_thread: Some(timer_thread),
        }
    }

    fn stop_timer(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.timer_thread.take() {
            let _ = handle.join();
        }
    }

    pub fn finish_success(&mut self, elapsed: Duration) {
        self.stop_timer();
        self.spinner.finish_and_clear();
        println!(
            "{GREEN}\u{2714} {} finished in {:.2}s{RESET}",
            self.label,
            elapsed.as_secs_f64()
        );
    }

    pub fn finish_error(&mut self, error: &str) {
        self.stop_timer();
        let available = get_terminal_width().saturating_sub(self.label.chars().count() + 15);
        self.spinner.finish_and_clear();
        println!(
            "{RED}\u{2718} {} failed: {}{RESET}",
            self.label,
            truncate_label(error, available.max(20))
        );
    }

    pub fn finish_interrupted(&mut self) {
        self.stop_timer();
        self.spinner.finish_and_clear();
        println!("{YELLOW}\u{2718} {} interrupted{RESET}", self.label);
    }
}

impl Drop for RunSpinner {
    fn drop(&mut self) {
        self.stop_timer();
        self.spinner.finish_and_clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunOutcome {
    Succeeded,
    Failed,
    Interrupted,
}

/// Drives a [`RunSpinner`] from benchmark progress events.
///
/// A spinner is shown from `RunStarted` until the matching `RunFinished`.
/// Runs that fail with an error never send `RunFinished`; the next event or
/// [`SpinnerProgress::abort`] clears the stale spinner. A run that finishes
/// after Ctrl+C is shown as interrupted.
pub struct SpinnerProgress {
    current: Option<RunSpinner>,
    signal: SignalHandler,
}

impl SpinnerProgress {
    pub fn new(signal: SignalHandler) -> Self {
        Self {
            current: None,
            signal,
        }
    }

    pub fn handle(&mut self, event: BenchEvent<'_>) {
        match event {
            BenchEvent::RunStarted { label, processes } => {
                self.current = Some(RunSpinner::new(label, processes));
            }
            BenchEvent::RunFinished(report) => {
                let outcome = self.outcome(report);
                if let Some(mut spinner) = self.current.take() {
                    match outcome {
                        RunOutcome::Succeeded => spinner.finish_success(report.elapsed),
                        RunOutcome::Failed => {
                            spinner.finish_error("a command exited with a non-zero status")
                        }
                        RunOutcome::Interrupted => spinner.finish_interrupted(),
                    }
                }
            }
        }
    }

    fn outcome(&self, report: &ProfileReport) -> RunOutcome {
        if self.signal.is_interrupted() {
            RunOutcome::Interrupted
        } else if report.all_succeeded() {
            RunOutcome::Succeeded
        } else {
            RunOutcome::Failed
        }
    }

    /// Clears a spinner left behind by a run that returned an error.
    pub fn abort(&mut self, error: &str) {
        if let Some(mut spinner) = self.current.take() {
            spinner.finish_error(error);
        }
    }

    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }
}

fn truncate_label(text: &str, max_len: usize) -> String {
    let first_line = text.lines().next().unwrap_or(text).trim();

    if first_line.chars().count() <= max_len {
        first_line.to_string()
    } else if max_len < 4 {
        "...".to_string()
    } else {
        let truncated: String = first_line.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}
