//! Job status reporting.
//!
//! Status reads merge the persisted job record with live counts from the
//! page and content tables, so a job that is still running (or was resumed
//! after a failed progress write) never reports fewer pages than exist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::scope::Scope;
use crate::traits::store::{ContentStore, CrawlJobStore, ExtractionJobStore, PageStore};
use crate::types::{
    job::{JobStatus, StopReason},
    link::ExternalLinkRegistry,
    page::Page,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlStatus {
    pub crawl_job_id: Uuid,
    pub domain: String,
    pub project_id: String,
    pub status: JobStatus,
    pub pages_discovered: u64,
    pub pages_crawled: u64,
    pub duplicates_skipped: u64,
    pub frontier_size: usize,
    pub external_links: usize,
    pub stop_reason: Option<StopReason>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionStatus {
    pub extraction_job_id: Uuid,
    pub crawl_job_id: Uuid,
    pub status: JobStatus,
    pub only_missing: bool,
    pub pages_total: u64,
    pub pages_extracted: u64,
    pub pages_failed: u64,
    pub failed_urls: Vec<String>,
    /// Content records currently stored for the crawl job
    pub content_records: usize,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
}

/// Pages of a crawl with the job's external link registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlPages {
    pub pages: Vec<Page>,
    pub external_links: ExternalLinkRegistry,
}

/// Status of a crawl job, or `None` if it does not exist.
pub async fn crawl_status<S>(store: &S, crawl_job_id: Uuid) -> StoreResult<Option<CrawlStatus>>
where
    S: CrawlJobStore + PageStore + ?Sized,
{
    let Some(job) = store.get_crawl_job(crawl_job_id).await? else {
        return Ok(None);
    };
    let live_pages = store.count_pages(crawl_job_id).await? as u64;

    Ok(Some(CrawlStatus {
        crawl_job_id: job.id,
        pages_crawled: job.pages_crawled.max(live_pages),
        pages_discovered: job.pages_discovered.max(live_pages),
        duplicates_skipped: job.duplicates_skipped,
        frontier_size: job.frontier.len(),
        external_links: job.external_links.len(),
        status: job.status,
        stop_reason: job.stop_reason,
        error_message: job.error_message,
        domain: job.domain,
        project_id: job.project_id,
        created_at: job.created_at,
        started_at: job.started_at,
        completed_at: job.completed_at,
        failed_at: job.failed_at,
    }))
}

/// Status of an extraction job, or `None` if it does not exist.
pub async fn extraction_status<S>(
    store: &S,
    extraction_job_id: Uuid,
) -> StoreResult<Option<ExtractionStatus>>
where
    S: ExtractionJobStore + ContentStore + ?Sized,
{
    let Some(job) = store.get_extraction_job(extraction_job_id).await? else {
        return Ok(None);
    };
    let content_records = store.count_content(job.crawl_job_id).await?;

    Ok(Some(ExtractionStatus {
        extraction_job_id: job.id,
        crawl_job_id: job.crawl_job_id,
        status: job.status,
        only_missing: job.only_missing,
        pages_total: job.pages_total,
        pages_extracted: job.pages_extracted,
        pages_failed: job.pages_failed,
        failed_urls: job.failed_urls,
        content_records,
        error_message: job.error_message,
        created_at: job.created_at,
        started_at: job.started_at,
        completed_at: job.completed_at,
        failed_at: job.failed_at,
    }))
}

/// Pages of a crawl job restricted to the job's scope, one per normalized
/// URL. `None` if the job does not exist.
pub async fn crawl_pages<S>(store: &S, crawl_job_id: Uuid) -> StoreResult<Option<CrawlPages>>
where
    S: CrawlJobStore + PageStore + ?Sized,
{
    let Some(job) = store.get_crawl_job(crawl_job_id).await? else {
        return Ok(None);
    };

    let pages = match Scope::for_seed(&job.domain, job.scope_policy) {
        Some(scope) => {
            let mut seen = HashSet::new();
            store
                .pages_for_job(crawl_job_id)
                .await?
                .into_iter()
                .filter(|page| scope.contains(&page.normalized_url))
                .filter(|page| seen.insert(page.normalized_url.clone()))
                .collect()
        }
        None => Vec::new(),
    };

    Ok(Some(CrawlPages {
        pages,
        external_links: job.external_links,
    }))
}
