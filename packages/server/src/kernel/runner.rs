//! Background execution of crawl and extraction jobs.
//!
//! Each job runs in its own tokio task. A supervisor task awaits it and, if
//! the run panicked or returned before reaching a terminal state, marks the
//! job `failed` so it never stays `running`.
//!
//! ```text
//! spawn_crawl ──► supervisor ──► run task (CrawlOrchestrator::run)
//!                     │
//!                     └─► on panic / early error: mark job failed
//! ```

use std::any::Any;
use std::sync::Arc;

use site_crawler::{CrawlOrchestrator, ExtractionPipeline, StopReason, Store};
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Run a crawl job in the background.
pub fn spawn_crawl(
    crawler: Arc<CrawlOrchestrator>,
    store: Arc<dyn Store>,
    job_id: Uuid,
) -> JoinHandle<()> {
    let run = tokio::spawn(async move { crawler.run(job_id).await });

    tokio::spawn(async move {
        let failure = match run.await {
            Ok(Ok(job)) => {
                info!(
                    job_id = %job_id,
                    status = %job.status,
                    pages_crawled = job.pages_crawled,
                    "crawl job finished"
                );
                return;
            }
            Ok(Err(e)) => {
                error!(job_id = %job_id, error = %e, "crawl job errored");
                e.to_string()
            }
            Err(e) => {
                let message = panic_message(e);
                error!(job_id = %job_id, error = %message, "crawl job panicked");
                message
            }
        };

        mark_crawl_failed(store.as_ref(), job_id, &failure).await;
    })
}

/// Run an extraction job in the background.
pub fn spawn_extraction(
    pipeline: Arc<ExtractionPipeline>,
    store: Arc<dyn Store>,
    job_id: Uuid,
) -> JoinHandle<()> {
    let run = tokio::spawn(async move { pipeline.run(job_id).await });

    tokio::spawn(async move {
        let failure = match run.await {
            Ok(Ok(job)) => {
                info!(
                    job_id = %job_id,
                    status = %job.status,
                    extracted = job.pages_extracted,
                    failed = job.pages_failed,
                    "extraction job finished"
                );
                return;
            }
            Ok(Err(e)) => {
                error!(job_id = %job_id, error = %e, "extraction job errored");
                e.to_string()
            }
            Err(e) => {
                let message = panic_message(e);
                error!(job_id = %job_id, error = %message, "extraction job panicked");
                message
            }
        };

        mark_extraction_failed(store.as_ref(), job_id, &failure).await;
    })
}

async fn mark_crawl_failed(store: &dyn Store, job_id: Uuid, message: &str) {
    let mut job = match store.get_crawl_job(job_id).await {
        Ok(Some(job)) => job,
        Ok(None) => return,
        Err(e) => {
            warn!(job_id = %job_id, error = %e, "failed to load crawl job after failure");
            return;
        }
    };
    if job.status.is_terminal() {
        return;
    }

    job.fail(StopReason::Error, message);
    if let Err(e) = store.update_crawl_job(&job).await {
        error!(job_id = %job_id, error = %e, "failed to mark crawl job as failed");
    }
}

async fn mark_extraction_failed(store: &dyn Store, job_id: Uuid, message: &str) {
    let mut job = match store.get_extraction_job(job_id).await {
        Ok(Some(job)) => job,
        Ok(None) => return,
        Err(e) => {
            warn!(job_id = %job_id, error = %e, "failed to load extraction job after failure");
            return;
        }
    };
    if job.status.is_terminal() {
        return;
    }

    job.fail(message);
    if let Err(e) = store.update_extraction_job(&job).await {
        error!(job_id = %job_id, error = %e, "failed to mark extraction job as failed");
    }
}

fn panic_message(err: JoinError) -> String {
    match err.try_into_panic() {
        Ok(payload) => describe_panic(payload),
        Err(err) => format!("job task cancelled: {err}"),
    }
}

fn describe_panic(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("job panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("job panicked: {msg}")
    } else {
        "job panicked".to_string()
    }
}
