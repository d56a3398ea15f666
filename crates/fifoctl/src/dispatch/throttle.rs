//! Optional spacing between dispatched lines.

use std::thread;
use std::time::{Duration, Instant};

/// Enforces a minimum interval between consecutive dispatches.
///
/// With no interval configured every call returns immediately.
#[derive(Debug, Clone)]
pub struct DispatchThrottle {
    interval: Option<Duration>,
    last: Option<Instant>,
}

impl DispatchThrottle {
    /// A missing or zero `interval` disables throttling.
    #[must_use]
    pub fn new(interval: Option<Duration>) -> Self {
        Self {
            interval: interval.filter(|interval| !interval.is_zero()),
            last: None,
        }
    }

    /// Sleeps until the interval since the previous dispatch has elapsed.
    pub fn wait(&mut self) {
        if let Some(interval) = self.interval
            && let Some(last) = self.last
        {
            let elapsed = last.elapsed();
            if elapsed < interval {
                thread::sleep(interval - elapsed);
            }
        }
        self.last = Some(Instant::now());
    }
}
