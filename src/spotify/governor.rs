use std::{
    future::Future,
    sync::atomic::{AtomicI64, Ordering},
    time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::{sync::Semaphore, time::sleep};
use tracing::info;

use crate::spotify::SpotifyError;

/// Throttles outbound Web API calls.
///
/// Combines a process-wide backoff deadline, written whenever Spotify answers
/// 429, with a bounded pool of permits that caps how many calls are in flight.
/// Token refreshes against Accounts do not pass through here.
#[derive(Debug)]
pub struct RateGovernor {
    retry_after_epoch_ms: AtomicI64,
    permits: Semaphore,
}

impl RateGovernor {
    /// Creates a governor allowing `max_concurrent_calls` calls at once.
    /// Zero is treated as one, and the count is capped at
    /// [`Semaphore::MAX_PERMITS`].
    pub fn new(max_concurrent_calls: usize) -> Self {
        Self {
            retry_after_epoch_ms: AtomicI64::new(0),
            permits: Semaphore::new(max_concurrent_calls.clamp(1, Semaphore::MAX_PERMITS)),
        }
    }

    /// Runs `call` once the backoff deadline has passed and a permit is held.
    ///
    /// The permit is released on every exit path, including when the
    /// returned future is dropped mid-flight.
    ///
    /// # Errors
    ///
    /// [`SpotifyError::Unavailable`] when the governor has been closed, in
    /// which case `call` never runs. Otherwise whatever `call` returns.
    pub async fn gated<F, Fut, T>(&self, call: F) -> Result<T, SpotifyError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, SpotifyError>>,
    {
        self.wait_if_needed().await;
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| SpotifyError::Unavailable)?;
        call().await
    }

    /// Pushes the deadline to `now + seconds` and returns it in epoch ms.
    ///
    /// The deadline is overwritten, not maxed: a later 429 with a shorter
    /// window may move it earlier.
    pub fn note_retry_after(&self, seconds: u64) -> i64 {
        let millis = i64::try_from(seconds.saturating_mul(1000)).unwrap_or(i64::MAX);
        let deadline = now_ms().saturating_add(millis);
        self.retry_after_epoch_ms.store(deadline, Ordering::SeqCst);
        deadline
    }

    /// Earliest epoch millisecond at which a new call may start, 0 if none.
    pub fn retry_after_epoch_ms(&self) -> i64 {
        self.retry_after_epoch_ms.load(Ordering::SeqCst)
    }

    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Rejects all future acquisitions with `Unavailable`.
    pub fn close(&self) {
        self.permits.close();
    }

    async fn wait_if_needed(&self) {
        let deadline = self.retry_after_epoch_ms();
        let now = now_ms();
        if now < deadline {
            let wait_ms = (deadline - now) as u64;
            info!(
                "Waiting {} ms before Spotify request (rate limited until {}).",
                wait_ms,
                format_epoch_ms(deadline)
            );
            sleep(Duration::from_millis(wait_ms)).await;
        }
    }
}

pub(crate) fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub(crate) fn format_epoch_ms(epoch_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| epoch_ms.to_string())
}
