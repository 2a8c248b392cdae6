use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelbenchError {
    #[error("Cannot start a sampling session without any target processes")]
    InvalidTargetSet,

    #[error("No memory readings were recorded for process {0}")]
    EmptySeries(u32),

    #[error("Process {0} is not part of this sampling session")]
    UnknownTarget(u32),

    #[error("Sampler thread panicked before persisting its samples")]
    SamplerPanicked,

    #[error("Commands have already been fired")]
    AlreadyFired,

    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("No run directory found in {0}")]
    RunNotFound(PathBuf),

    #[error("Refusing to overwrite existing {0}")]
    StashConflict(PathBuf),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Session artifact not found: {0}")]
    SessionNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Signal handler error: {0}")]
    SignalHandler(String),
}

pub type Result<T> = std::result::Result<T, ModelbenchError>;
