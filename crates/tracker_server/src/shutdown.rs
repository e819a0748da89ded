//! Shutdown coordination state shared between server components.
//!
//! The accept loop, the status listener, and the application layer all watch
//! the same [`ShutdownState`] so that a single signal stops the whole
//! process in an orderly way.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag used to coordinate graceful shutdown across tasks.
///
/// Cloning is cheap; all clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct ShutdownState {
    initiated: Arc<AtomicBool>,
    completed: Arc<AtomicBool>,
}

impl ShutdownState {
    /// Creates a fresh shutdown state with no shutdown requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks shutdown as requested. Idempotent.
    pub fn initiate_shutdown(&self) {
        self.initiated.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once shutdown has been requested.
    pub fn is_shutdown_initiated(&self) -> bool {
        self.initiated.load(Ordering::SeqCst)
    }

    /// Marks shutdown as fully completed.
    pub fn complete_shutdown(&self) {
        self.completed.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once shutdown has fully completed.
    pub fn is_shutdown_complete(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }
}
