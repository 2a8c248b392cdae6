pub mod bench;
pub mod commands;
pub mod config;
pub mod error;
pub mod footprint;
pub mod oasis;
pub mod output;
pub mod process;
pub mod progress;
pub mod runs;
pub mod sampler;
pub mod signal;
pub mod stash;

pub use error::{ModelbenchError, Result};
pub use sampler::{ProcessMemorySampler, SampleSeries, SamplerHandle, SamplerOptions, SessionStore};
