//! Cooperative cancellation.
//!
//! The relay never blocks for longer than one poll interval, so a flag that
//! is checked once per loop iteration is enough: worst-case cancellation
//! latency equals one wait timeout (200 ms while waiting for a connection,
//! 100 ms while relaying).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cloneable flag polled by the relay at its two checkpoints: once per
/// connection-wait iteration and once per relay-loop iteration.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
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
