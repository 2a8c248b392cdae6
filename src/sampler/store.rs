use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::series::SampleSeries;
use crate::error::{ModelbenchError, Result};

const SAMPLES_FILE: &str = "samples.json";
const STOP_FILE: &str = "stop.flag";
const STOP_MARKER: &str = "DONE";

/// Durable artifacts of one sampling session.
///
/// Everything lives under `<root>/<session_id>/`, so two sessions sharing a
/// root never see each other's stop marker or samples.
#[derive(Debug, Clone)]
pub struct SessionStore {
    session_id: String,
    session_dir: PathBuf,
}

impl SessionStore {
    /// Creates a store for a fresh session under `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self::for_session(root, Uuid::new_v4().to_string())
    }

    /// Opens the store of an existing session, e.g. from another process.
    pub fn for_session(root: impl AsRef<Path>, session_id: impl Into<String>) -> Self {
        let session_id = session_id.into();
        Self {
            session_dir: root.as_ref().join(&session_id),
            session_id,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }

    fn samples_file(&self) -> PathBuf {
        self.session_dir.join(SAMPLES_FILE)
    }

    fn stop_file(&self) -> PathBuf {
        self.session_dir.join(STOP_FILE)
    }

    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.session_dir)?;
        Ok(())
    }

    /// Writes the stop marker the polling loop watches for.
    pub fn raise_stop(&self) -> Result<()> {
        self.ensure_dir()?;
        fs::write(self.stop_file(), STOP_MARKER)?;
        Ok(())
    }

    pub fn is_stop_raised(&self) -> bool {
        self.stop_file().is_file()
    }

    pub fn save(&self, series: &SampleSeries) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.samples_file();
        let content = serde_json::to_string_pretty(series)?;
        fs::write(&path, content)?;
        Ok(path)
    }

    pub fn load(&self) -> Result<SampleSeries> {
        let path = self.samples_file();
        if !path.exists() {
            return Err(ModelbenchError::SessionNotFound(path));
        }
        let content = fs::read_to_string(&path)?;
        let series: SampleSeries = serde_json::from_str(&content)?;
        Ok(series)
    }

    /// Removes the samples, the stop marker and the session directory.
    ///
    /// Artifacts that are already gone are not an error.
    pub fn cleanup(&self) -> Result<()> {
        for path in [self.samples_file(), self.stop_file()] {
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        if self.session_dir.is_dir() && fs::read_dir(&self.session_dir)?.next().is_none() {
            fs::remove_dir(&self.session_dir)?;
        }
        log::debug!("cleaned up session {}", self.session_id);
        Ok(())
    }
}
