//! Cancellation signal for long-running sessions.
//!
//! A `SignalHandler` wraps a shared flag that is set when the operator presses
//! Ctrl+C. `monitor` and `collect` hand the same handler down to the engine,
//! which checks it between samples and while waiting out the refresh interval.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{CountersError, Result};

/// Longest stretch `wait` sleeps before re-checking the flag.
const POLL_SLICE: Duration = Duration::from_millis(100);

/// Shared cancellation flag, optionally wired to SIGINT.
///
/// # Thread Safety
///
/// `SignalHandler` is thread-safe and can be cloned to share across threads.
/// The underlying flag uses atomic operations.
///
/// # Example
///
/// ```ignore
/// let handler = SignalHandler::new()?;
///
/// while !handler.is_shutdown_requested() {
///     sample_counters()?;
///     if handler.wait(interval) {
///         break;
///     }
/// }
/// ```
#[derive(Clone, Debug, Default)]
pub struct SignalHandler {
    shutdown_flag: Arc<AtomicBool>,
}

impl SignalHandler {
    /// Creates a new `SignalHandler` and registers the SIGINT handler.
    ///
    /// # Errors
    ///
    /// Returns an error if the signal handler cannot be registered.
    pub fn new() -> Result<Self> {
        let handler = Self::detached();
        let flag_clone = Arc::clone(&handler.shutdown_flag);

        ctrlc::set_handler(move || {
            flag_clone.store(true, Ordering::SeqCst);
        })
        .map_err(|e| CountersError::SignalHandler(e.to_string()))?;

        Ok(handler)
    }

    /// A handler that is only cancelled through [`SignalHandler::cancel`].
    pub fn detached() -> Self {
        Self::default()
    }

    /// Checks if a shutdown has been requested (non-blocking).
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag.load(Ordering::SeqCst)
    }

    /// Request shutdown, as if SIGINT had been received.
    pub fn cancel(&self) {
        self.shutdown_flag.store(true, Ordering::SeqCst);
    }

    /// Sleep for `duration` or until shutdown is requested.
    ///
    /// Returns `true` if shutdown was requested.
    pub fn wait(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_shutdown_requested() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep(POLL_SLICE.min(deadline - now));
        }
    }
}
