//! Interruptible sleeping

use crate::core::shutdown::Shutdown;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sleep {
    Elapsed,
    /// Shutdown was requested before the duration passed
    Interrupted,
}

/// Time source for ticks and cooldowns
pub trait Clock: Send {
    fn sleep(&self, duration: Duration) -> Sleep;

    /// Whether shutdown has been requested, without waiting
    fn interrupted(&self) -> bool;
}

/// Real clock that wakes early when shutdown is triggered
#[derive(Clone)]
pub struct ShutdownClock {
    shutdown: Shutdown,
}

impl ShutdownClock {
    pub fn new(shutdown: Shutdown) -> Self {
        Self { shutdown }
    }
}

impl Clock for ShutdownClock {
    fn sleep(&self, duration: Duration) -> Sleep {
        if self.shutdown.wait_timeout(duration) {
            Sleep::Interrupted
        } else {
            Sleep::Elapsed
        }
    }

    fn interrupted(&self) -> bool {
        self.shutdown.is_triggered()
    }
}
