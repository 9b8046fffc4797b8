//! Request pacing for the GitHub API
//!
//! GitHub enforces its search rate limit per caller identity, so every API
//! request made by one client goes through a single [`MinIntervalLimiter`].
//! Time comes from an injected [`Clock`] so pacing and backoff can be tested
//! without waiting on the wall clock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Source of time for pacing, backoff and staleness checks
#[async_trait]
pub trait Clock: Send + Sync {
    /// Monotonic time used for interval accounting
    fn now(&self) -> Instant;

    /// Wall-clock time used to age repositories
    fn utc_now(&self) -> DateTime<Utc>;

    /// Waits for the given duration
    async fn sleep(&self, duration: Duration);
}

/// Clock backed by the system time and the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Clock that only advances when something sleeps on it
///
/// Every sleep is recorded, which lets tests assert on the exact pauses a
/// run took.
#[derive(Debug)]
pub struct ManualClock {
    start: Instant,
    start_utc: DateTime<Utc>,
    elapsed: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new(start_utc: DateTime<Utc>) -> Self {
        Self {
            start: Instant::now(),
            start_utc,
            elapsed: Mutex::new(Duration::ZERO),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Moves time forward without recording a sleep
    pub fn advance(&self, duration: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(|e| e.into_inner());
        *elapsed += duration;
    }

    /// All durations slept so far, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.elapsed()).unwrap_or_else(|_| chrono::Duration::zero());
        self.start_utc + elapsed
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(duration);
        self.advance(duration);
    }
}

/// Enforces a minimum interval between consecutive requests
pub struct MinIntervalLimiter {
    interval: Duration,
    clock: Arc<dyn Clock>,
    last_request: tokio::sync::Mutex<Option<Instant>>,
}

impl MinIntervalLimiter {
    pub fn new(interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            interval,
            clock,
            last_request: tokio::sync::Mutex::new(None),
        }
    }

    /// Waits until a request may be sent and records it as sent
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(previous) = *last {
            let elapsed = self.clock.now().saturating_duration_since(previous);
            if elapsed < self.interval {
                let wait = self.interval - elapsed;
                tracing::trace!("Pacing API request, waiting {:?}", wait);
                self.clock.sleep(wait).await;
            }
        }

        *last = Some(self.clock.now());
    }
}

/// Delay before retrying a rate-limited request
///
/// Exponential in `attempt` (0-based) from `base`, but never shorter than an
/// explicit `retry_after` from the server.
pub fn backoff_delay(base: Duration, attempt: u32, retry_after: Option<Duration>) -> Duration {
    let exponential = base.saturating_mul(1u32 << attempt.min(16));
    match retry_after {
        Some(server) => server.max(exponential),
        None => exponential,
    }
}
