//! Spacing of model calls made through one [`crate::Analyzer`].
//!
//! The free Gemini tier allows only a few requests per minute, and every
//! upload costs exactly one call. [`CallThrottle`] holds a `governor` limiter
//! with a quota of one call per `min_interval`, so the *starts* of consecutive
//! calls are at least that far apart across all concurrent requests sharing
//! the analyzer.
//!
//! A permit is taken just before the caller proceeds to the network, so a
//! call that later fails still counts against the interval.

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Enforces a minimum interval between call starts.
pub struct CallThrottle {
    min_interval: Duration,
    /// `None` when the interval is zero.
    limiter: Option<DirectLimiter>,
}

impl std::fmt::Debug for CallThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallThrottle")
            .field("min_interval", &self.min_interval)
            .finish_non_exhaustive()
    }
}

impl CallThrottle {
    pub fn new(min_interval: Duration) -> Self {
        let limiter = Quota::with_period(min_interval).map(DirectLimiter::direct);
        Self {
            min_interval,
            limiter,
        }
    }

    /// Configured minimum gap.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until a call may start and take its permit.
    ///
    /// Returns how long this caller waited.
    pub async fn wait_turn(&self) -> Duration {
        let Some(limiter) = &self.limiter else {
            return Duration::ZERO;
        };

        let arrived = Instant::now();
        if limiter.check().is_ok() {
            return Duration::ZERO;
        }

        warn!(
            "Rate limiting: waiting for the next model call slot ({:.1}s minimum interval)",
            self.min_interval.as_secs_f64()
        );
        limiter.until_ready().await;

        let waited = arrived.elapsed();
        debug!("Throttle released after {:?}", waited);
        waited
    }
}
