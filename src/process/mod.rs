//! Process launching and memory lookup.
//!
//! This module provides the two collaborators the sampler relies on: a
//! launcher for the external model commands and a probe for their memory.

mod launcher;
mod monitor;

pub use launcher::{eve_commands, CommandRun};
pub use monitor::{MemoryProbe, SysinfoProbe};
