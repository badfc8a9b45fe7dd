//! Keeps the host awake while a track is open.

use crate::error::CoreError;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Platform hook that acquires the wake lock
pub trait WakeLockBackend: Send + Sync {
    /// # Errors
    ///
    /// Returns `WakeLockUnavailable` when the platform refuses the lock.
    fn acquire(&self) -> Result<(), CoreError>;
}

/// Backend for hosts without a wake lock facility
#[derive(Debug, Default)]
pub struct NoopWakeLock;

impl WakeLockBackend for NoopWakeLock {
    fn acquire(&self) -> Result<(), CoreError> {
        Ok(())
    }
}

/// Acquired at most once and never released explicitly
pub struct WakeLock {
    backend: Box<dyn WakeLockBackend>,
    held: AtomicBool,
}

impl WakeLock {
    pub fn new(backend: Box<dyn WakeLockBackend>) -> Self {
        Self {
            backend,
            held: AtomicBool::new(false),
        }
    }

    /// Acquire the lock if not yet held. Failure is logged and the next call
    /// tries again. Returns whether the lock is held afterwards.
    pub fn request(&self) -> bool {
        if self.held.load(Ordering::Acquire) {
            return true;
        }
        match self.backend.acquire() {
            Ok(()) => {
                debug!("Wake lock acquired");
                self.held.store(true, Ordering::Release);
                true
            }
            Err(e) => {
                warn!("Failed to acquire wake lock: {e}");
                false
            }
        }
    }

    #[must_use]
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

impl Default for WakeLock {
    fn default() -> Self {
        Self::new(Box::new(NoopWakeLock))
    }
}
