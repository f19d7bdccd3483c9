//! Suspension-triggered reimport.
//!
//! A batch suspension (a whole definition or a query) affects instances
//! that cannot be derived from the log entry itself. Instead of guessing,
//! the running process instance cursor is reset and the full reimport
//! picks up the new states.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::info;

use crate::engine::ImportCursor;

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Suspension entries are imported instance by instance
    Normal,
    /// The last page contained a batch operation and reset the cursor
    ResetRequested,
}

/// Tracks whether the last user operation page reset the cursor.
pub struct SuspensionController {
    cursor: Arc<dyn ImportCursor>,
    state: Mutex<ControllerState>,
    resets: AtomicU64,
}

impl SuspensionController {
    /// Controller driving `cursor`, the running process instance cursor.
    pub fn new(cursor: Arc<dyn ImportCursor>) -> Self {
        Self {
            cursor,
            state: Mutex::new(ControllerState::Normal),
            resets: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> ControllerState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enter `ResetRequested` and reset the cursor once.
    pub fn request_reset(&self, batch_operations: usize) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = ControllerState::ResetRequested;
        self.cursor.reset();
        let resets = self.resets.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            cursor = self.cursor.name(),
            batch_operations,
            resets,
            "Batch suspension detected, resetting import cursor"
        );
    }

    /// Return to `Normal` after a page without batch operations.
    pub fn mark_normal(&self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = ControllerState::Normal;
    }

    /// Number of resets requested so far.
    pub fn reset_count(&self) -> u64 {
        self.resets.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Cursor {
        resets: AtomicUsize,
    }

    impl ImportCursor for Cursor {
        fn reset(&self) {
            self.resets.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_state_transitions() {
        let cursor = Arc::new(Cursor::default());
        let controller = SuspensionController::new(cursor.clone());
        assert_eq!(controller.state(), ControllerState::Normal);

        controller.request_reset(1);
        assert_eq!(controller.state(), ControllerState::ResetRequested);
        assert_eq!(cursor.resets.load(Ordering::SeqCst), 1);
        assert_eq!(controller.reset_count(), 1);

        controller.mark_normal();
        assert_eq!(controller.state(), ControllerState::Normal);
        assert_eq!(cursor.resets.load(Ordering::SeqCst), 1);
    }
}
