//! Log throttling utility
//!
//! Limits how often the same condition is logged. Overload and stall
//! conditions recur at frame rate, so logging them unthrottled would
//! flood the log at hundreds of lines per second.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Log throttler that limits how often the same message key is logged
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use framepacer::utils::LogThrottler;
///
/// let throttler = LogThrottler::new(Duration::from_secs(5));
///
/// // First call returns true
/// assert!(throttler.should_log("queue_overflow"));
///
/// // Subsequent calls within 5 seconds return false
/// assert!(!throttler.should_log("queue_overflow"));
/// ```
pub struct LogThrottler {
    /// Map of message key to last log time
    last_logged: RwLock<HashMap<String, Instant>>,
    /// Throttle interval
    interval: Duration,
}

impl LogThrottler {
    /// Create a new log throttler with the specified interval
    pub fn new(interval: Duration) -> Self {
        Self {
            last_logged: RwLock::new(HashMap::new()),
            interval,
        }
    }

    /// Create a new log throttler with interval specified in seconds
    pub fn with_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    /// Check if a message should be logged (not throttled)
    ///
    /// Returns `true` if the message should be logged, `false` if it
    /// should be suppressed. If `true` is returned, the internal
    /// timestamp for `key` is updated.
    pub fn should_log(&self, key: &str) -> bool {
        let now = Instant::now();

        // Fast path under the read lock
        {
            let map = self.last_logged.read().unwrap();
            if let Some(last) = map.get(key) {
                if now.duration_since(*last) < self.interval {
                    return false;
                }
            }
        }

        let mut map = self.last_logged.write().unwrap();
        // Double-check after acquiring the write lock
        if let Some(last) = map.get(key) {
            if now.duration_since(*last) < self.interval {
                return false;
            }
        }
        map.insert(key.to_string(), now);
        true
    }

    /// Clear throttle state for a specific key
    ///
    /// Called when a condition recovers, so its next occurrence is
    /// logged immediately rather than waiting out the interval.
    pub fn clear(&self, key: &str) {
        self.last_logged.write().unwrap().remove(key);
    }
}

impl Default for LogThrottler {
    /// Create a default log throttler with 5 second interval
    fn default() -> Self {
        Self::with_secs(5)
    }
}

/// Macro for throttled warning logging
///
/// # Example
///
/// ```rust
/// use framepacer::utils::LogThrottler;
/// use framepacer::warn_throttled;
///
/// let throttler = LogThrottler::default();
/// warn_throttled!(throttler, "queue_overflow", "Queue full, dropped frame {}", 42);
/// ```
#[macro_export]
macro_rules! warn_throttled {
    ($throttler:expr, $key:expr, $($arg:tt)*) => {
        if $throttler.should_log($key) {
            tracing::warn!($($arg)*);
        }
    };
}

/// Macro for throttled info logging
#[macro_export]
macro_rules! info_throttled {
    ($throttler:expr, $key:expr, $($arg:tt)*) => {
        if $throttler.should_log($key) {
            tracing::info!($($arg)*);
        }
    };
}
