// Cooperative cancellation shared between the Ctrl-C handler and the
// long-running upload and polling loops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::PaiError;

const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Shared flag checked between chunk uploads and status queries. Cloning
/// hands out another handle to the same flag, so a signal handler can hold
/// one while the main thread works with the other.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fails with [`PaiError::Cancelled`] once the token has been tripped.
    pub fn check(&self) -> Result<(), PaiError> {
        if self.is_cancelled() {
            Err(PaiError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Block for `duration`, waking early if the token is cancelled.
    pub fn sleep(&self, duration: Duration) -> Result<(), PaiError> {
        let deadline = Instant::now() + duration;
        loop {
            self.check()?;
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            thread::sleep(SLEEP_SLICE.min(deadline - now));
        }
    }
}
