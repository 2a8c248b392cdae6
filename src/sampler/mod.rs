//! Memory sampling for externally launched processes.
//!
//! A [`ProcessMemorySampler`] polls the resident memory of a fixed set of
//! pids on its own thread until the session's stop marker is raised, then
//! persists every reading through its [`SessionStore`].
//!
//! The caller drives termination:
//!
//! ```ignore
//! let mut run = CommandRun::new(commands);
//! run.fire()?;
//!
//! let store = SessionStore::new(".modelbench");
//! let handle = ProcessMemorySampler::new(run.pids(), store)?.start()?;
//!
//! run.wait()?;                 // every target has exited
//! let series = handle.finish()?; // raise stop, join, load
//! println!("{}", series.peak(pid)?);
//! ```
//!
//! The stop marker is checked between passes only, so a stop raised in the
//! middle of a pass lets that pass finish: sequences lag the signal by at
//! most one pass and are never cut short mid-pass.

mod series;
mod store;

pub use series::{SampleSeries, TargetSummary};
pub use store::SessionStore;

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::{ModelbenchError, Result};
use crate::process::{MemoryProbe, SysinfoProbe};

const SAMPLER_THREAD_NAME: &str = "memory-sampler";

/// Tuning for the polling loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerOptions {
    /// Delay between passes. Zero polls as fast as the scheduler allows.
    pub poll_interval: Duration,
    /// Stop on our own after this long even if the stop marker never appears.
    pub timeout: Option<Duration>,
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
            timeout: None,
        }
    }
}

/// Samples resident memory for a fixed set of processes it does not own.
pub struct ProcessMemorySampler<P = SysinfoProbe> {
    targets: Vec<u32>,
    options: SamplerOptions,
    store: SessionStore,
    probe: P,
}

impl ProcessMemorySampler<SysinfoProbe> {
    /// Creates a sampler reading memory through sysinfo.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTargetSet` if `targets` is empty.
    pub fn new<I>(targets: I, store: SessionStore) -> Result<Self>
    where
        I: IntoIterator<Item = u32>,
    {
        Self::with_probe(targets, store, SysinfoProbe::new())
    }
}

impl<P: MemoryProbe + 'static> ProcessMemorySampler<P> {
    pub fn with_probe<I>(targets: I, store: SessionStore, probe: P) -> Result<Self>
    where
        I: IntoIterator<Item = u32>,
    {
        let targets: BTreeSet<u32> = targets.into_iter().collect();
        if targets.is_empty() {
            return Err(ModelbenchError::InvalidTargetSet);
        }

        Ok(Self {
            targets: targets.into_iter().collect(),
            options: SamplerOptions::default(),
            store,
            probe,
        })
    }

    pub fn with_options(mut self, options: SamplerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn targets(&self) -> &[u32] {
        &self.targets
    }

    /// Starts the polling loop on a dedicated thread and returns immediately.
    pub fn start(self) -> Result<SamplerHandle> {
        self.store.ensure_dir()?;
        let store = self.store.clone();

        log::debug!(
            "sampling {} process(es) for session {}",
            self.targets.len(),
            store.session_id()
        );

        let thread = thread::Builder::new()
            .name(SAMPLER_THREAD_NAME.to_string())
            .spawn(move || self.run())?;

        Ok(SamplerHandle {
            store,
            thread: Some(thread),
        })
    }

    fn run(mut self) -> Result<PathBuf> {
        let started = Instant::now();
        let mut series = SampleSeries::new(self.store.session_id(), self.targets.iter().copied());

        let timed_out = loop {
            for &pid in &self.targets {
                // An exited target is skipped for this pass but kept for the next
                if let Some(bytes) = self.probe.resident_bytes(pid) {
                    series.record(pid, bytes);
                }
            }
            series.passes += 1;

            if self.store.is_stop_raised() {
                break false;
            }
            if let Some(timeout) = self.options.timeout {
                if started.elapsed() >= timeout {
                    log::debug!(
                        "session {} timed out after {:?}",
                        self.store.session_id(),
                        timeout
                    );
                    break true;
                }
            }
            if !self.options.poll_interval.is_zero() {
                thread::sleep(self.options.poll_interval);
            }
        };

        series.finish(timed_out);
        let path = self.store.save(&series)?;
        log::debug!(
            "session {} persisted {} passes to {}",
            series.session_id,
            series.passes,
            path.display()
        );
        Ok(path)
    }
}

/// Handle to a running sampler.
///
/// Dropping the handle without joining raises the stop marker and waits for
/// the thread, so a sampler never outlives its handle.
pub struct SamplerHandle {
    store: SessionStore,
    thread: Option<JoinHandle<Result<PathBuf>>>,
}

impl SamplerHandle {
    pub fn session_id(&self) -> &str {
        self.store.session_id()
    }

    /// Raises the stop marker. Call only once every target has been waited on.
    pub fn stop(&self) -> Result<()> {
        self.store.raise_stop()
    }

    /// Waits for the sampler to persist its samples and returns their path.
    pub fn join(mut self) -> Result<PathBuf> {
        self.join_thread()
    }

    /// Stops the sampler, waits for it, and loads the persisted series.
    pub fn finish(mut self) -> Result<SampleSeries> {
        self.stop()?;
        self.join_thread()?;
        self.store.load()
    }

    fn join_thread(&mut self) -> Result<PathBuf> {
        match self.thread.take() {
            Some(thread) => thread
                .join()
                .map_err(|_| ModelbenchError::SamplerPanicked)?,
            None => Err(ModelbenchError::SamplerPanicked),
        }
    }
}

impl Drop for SamplerHandle {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            if let Err(e) = self.store.raise_stop() {
                log::warn!("failed to stop sampler on drop: {}", e);
            }
            let _ = thread.join();
        }
    }
}
