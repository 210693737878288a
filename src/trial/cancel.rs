//! Cooperative cancellation shared between a caller and the workers of a run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable flag; every clone observes [`cancel`](CancelToken::cancel).
///
/// Parallel workers read it before every frame, so a run stops at the next frame
/// boundary after cancellation. Sequential runs take a `should_cancel` closure
/// instead, polled every `poll_interval`.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
