//! Ctrl+C handling for benchmark runs.
//!
//! The model pipelines share our process group, so SIGINT already reaches
//! them and their `wait()` returns. Installing a handler keeps modelbench
//! itself alive long enough to stop the sampler, persist what it gathered,
//! restore stashed files, and skip any remaining scenarios.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{ModelbenchError, Result};

/// Records whether SIGINT has been received.
///
/// Clones share the same flag, so the handler can be handed to every
/// scenario without coordination.
#[derive(Clone, Default)]
pub struct SignalHandler {
    interrupted: Arc<AtomicBool>,
}

impl SignalHandler {
    /// Registers the process-wide SIGINT handler.
    ///
    /// # Errors
    ///
    /// Returns an error if a handler is already registered for this process.
    pub fn install() -> Result<Self> {
        let handler = Self::default();
        let flag = Arc::clone(&handler.interrupted);

        ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
        })
        .map_err(|e| ModelbenchError::SignalHandler(e.to_string()))?;

        Ok(handler)
    }

    /// A handler that is never triggered by a signal, for library callers and tests.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Checks if an interrupt has been received (non-blocking).
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    /// Marks the run as interrupted without a signal.
    pub fn trigger(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detached_handler_starts_clear() {
        let handler = SignalHandler::detached();
        assert!(!handler.is_interrupted());
    }

    #[test]
    fn test_trigger_sets_flag() {
        let handler = SignalHandler::detached();
        handler.trigger();
        assert!(handler.is_interrupted());
    }

    #[test]
    fn test_clone_shares_state() {
        let handler1 = SignalHandler::detached();
        let handler2 = handler1.clone();

        assert!(!handler2.is_interrupted());
        handler1.trigger();
        assert!(handler2.is_interrupted());
    }

    #[test]
    fn test_handler_is_thread_safe() {
        let handler = SignalHandler::detached();
        let remote = handler.clone();

        std::thread::spawn(move || remote.trigger()).join().unwrap();
        assert!(handler.is_interrupted());
    }
}
