//! Runtime ceiling and stall detection for crawl runs.
//!
//! The watchdog never touches the job. When a limit trips it records the
//! reason and cancels its token; the orchestrator observes the cancellation
//! at its next fetch/persist await and performs the `failed` transition.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::{CrawlError, CrawlResult};
use crate::types::job::StopReason;

pub struct Watchdog {
    start: Instant,
    token: CancellationToken,
    /// Millis since `start` of the last processed page
    last_progress: Arc<AtomicU64>,
    fired: Arc<OnceLock<StopReason>>,
    task: JoinHandle<()>,
}

impl Watchdog {
    /// Start both timers.
    pub fn arm(max_runtime: Duration, stall_timeout: Duration) -> Self {
        let start = Instant::now();
        let token = CancellationToken::new();
        let last_progress = Arc::new(AtomicU64::new(0));
        let fired = Arc::new(OnceLock::new());

        let task = tokio::spawn(watch(
            start,
            max_runtime,
            stall_timeout,
            last_progress.clone(),
            fired.clone(),
            token.clone(),
        ));

        Self {
            start,
            token,
            last_progress,
            fired,
            task,
        }
    }

    /// Record that a page was processed; restarts the stall window.
    pub fn touch(&self) {
        let elapsed = self.start.elapsed().as_millis() as u64;
        self.last_progress.store(elapsed, Ordering::Release);
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// The limit that tripped, if any.
    pub fn fired(&self) -> Option<StopReason> {
        self.fired.get().copied()
    }

    /// Stop both timers.
    pub fn disarm(self) {
        self.task.abort();
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn watch(
    start: Instant,
    max_runtime: Duration,
    stall_timeout: Duration,
    last_progress: Arc<AtomicU64>,
    fired: Arc<OnceLock<StopReason>>,
    token: CancellationToken,
) {
    let deadline = start + max_runtime;
    loop {
        let last = start + Duration::from_millis(last_progress.load(Ordering::Acquire));
        let stall_at = last + stall_timeout;
        let now = Instant::now();

        let reason = if now >= deadline {
            Some(StopReason::Timeout)
        } else if now >= stall_at {
            Some(StopReason::Stalled)
        } else {
            None
        };

        if let Some(reason) = reason {
            warn!(reason = %reason, elapsed_secs = start.elapsed().as_secs(), "Crawl watchdog fired");
            let _ = fired.set(reason);
            token.cancel();
            return;
        }

        tokio::select! {
            _ = token.cancelled() => return,
            _ = sleep_until(deadline.min(stall_at)) => {}
        }
    }
}

/// Race a future against cancellation.
pub async fn cancellable<F: Future>(token: &CancellationToken, fut: F) -> CrawlResult<F::Output> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(CrawlError::Cancelled),
        out = fut => Ok(out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_stall_fires_without_progress() {
        let watchdog = Watchdog::arm(Duration::from_secs(900), Duration::from_secs(120));
        watchdog.token().cancelled().await;
        assert_eq!(watchdog.fired(), Some(StopReason::Stalled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fires_despite_progress() {
        let watchdog = Watchdog::arm(Duration::from_secs(300), Duration::from_secs(120));
        for _ in 0..10 {
            tokio::time::sleep(Duration::from_secs(60)).await;
            if watchdog.token().is_cancelled() {
                break;
            }
            watchdog.touch();
        }
        assert_eq!(watchdog.fired(), Some(StopReason::Timeout));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarmed_watchdog_never_fires() {
        let watchdog = Watchdog::arm(Duration::from_secs(10), Duration::from_secs(5));
        let token = watchdog.token().clone();
        watchdog.disarm();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(!token.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancellable_prefers_cancellation() {
        let token = CancellationToken::new();
        token.cancel();
        let result = cancellable(&token, async { 1 }).await;
        assert!(matches!(result, Err(CrawlError::Cancelled)));

        let live = CancellationToken::new();
        assert_eq!(cancellable(&live, async { 2 }).await.unwrap(), 2);
    }
}
