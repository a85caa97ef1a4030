use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::battery_level::Threshold;

/// State shared between the governor loop and its front ends.
///
/// Fields are independent scalars; a reader may observe an update one tick
/// late, which the loop corrects on its next pass.
#[derive(Debug, Default)]
pub struct GovernorState {
    enabled: AtomicBool,
    threshold: AtomicU32,
    stop_requested: AtomicBool,
}

/// A point-in-time copy of [`GovernorState`] for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub enabled: bool,
    pub threshold: Threshold,
}

impl GovernorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn threshold(&self) -> Threshold {
        Threshold::from_raw(self.threshold.load(Ordering::Acquire))
    }

    pub fn status(&self) -> Status {
        Status {
            enabled: self.is_enabled(),
            threshold: self.threshold(),
        }
    }

    pub(crate) fn enable(&self, threshold: Threshold) {
        self.threshold.store(threshold.get(), Ordering::Release);
        self.enabled.store(true, Ordering::Release);
    }

    pub(crate) fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    /// Ask the loop to restore the charge limit and exit on its next tick.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }
}
