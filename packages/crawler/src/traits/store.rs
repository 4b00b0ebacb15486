//! Storage traits for jobs, pages and content.
//!
//! The storage layer is split into focused traits:
//! - `CrawlJobStore`: crawl job records and progress
//! - `PageStore`: crawled pages of a job
//! - `ContentStore`: extracted content records
//! - `ExtractionJobStore`: extraction job records
//! - `Store`: composite trait combining all four

use async_trait::async_trait;
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::types::{
    content::ContentRecord,
    job::{CrawlJob, CrawlProgress, ExtractionJob, ExtractionProgress},
    page::Page,
};

#[async_trait]
pub trait CrawlJobStore: Send + Sync {
    async fn insert_crawl_job(&self, job: &CrawlJob) -> StoreResult<()>;

    async fn get_crawl_job(&self, id: Uuid) -> StoreResult<Option<CrawlJob>>;

    /// Overwrite the whole job record (state transitions).
    async fn update_crawl_job(&self, job: &CrawlJob) -> StoreResult<()>;

    /// Write running counters and the frontier snapshot only.
    async fn update_crawl_progress(&self, id: Uuid, progress: &CrawlProgress) -> StoreResult<()>;
}

#[async_trait]
pub trait PageStore: Send + Sync {
    /// All pages of a job, ordered by normalized URL.
    async fn pages_for_job(&self, crawl_job_id: Uuid) -> StoreResult<Vec<Page>>;

    /// Insert or replace the page with the same `(crawl_job_id, normalized_url)`.
    async fn upsert_page(&self, page: &Page) -> StoreResult<()>;

    async fn update_page_in_counts(
        &self,
        crawl_job_id: Uuid,
        normalized_url: &str,
        internal_links_in: u32,
        external_links_in: u32,
    ) -> StoreResult<()>;

    async fn count_pages(&self, crawl_job_id: Uuid) -> StoreResult<usize>;
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Normalized URLs that already have a content record.
    async fn content_urls(&self, crawl_job_id: Uuid) -> StoreResult<HashSet<String>>;

    async fn get_content(
        &self,
        crawl_job_id: Uuid,
        normalized_url: &str,
    ) -> StoreResult<Option<ContentRecord>>;

    /// Atomic insert-or-update keyed by `(crawl_job_id, normalized_url)`.
    async fn upsert_content(&self, record: &ContentRecord) -> StoreResult<()>;

    async fn delete_content(&self, crawl_job_id: Uuid, normalized_url: &str) -> StoreResult<()>;

    /// Plain insert; fails if the key exists.
    async fn insert_content(&self, record: &ContentRecord) -> StoreResult<()>;

    async fn count_content(&self, crawl_job_id: Uuid) -> StoreResult<usize>;
}

#[async_trait]
pub trait ExtractionJobStore: Send + Sync {
    async fn insert_extraction_job(&self, job: &ExtractionJob) -> StoreResult<()>;

    async fn get_extraction_job(&self, id: Uuid) -> StoreResult<Option<ExtractionJob>>;

    async fn update_extraction_job(&self, job: &ExtractionJob) -> StoreResult<()>;

    async fn update_extraction_progress(
        &self,
        id: Uuid,
        progress: &ExtractionProgress,
    ) -> StoreResult<()>;
}

/// Composite storage trait combining all stores.
///
/// This is the trait the orchestrator and pipeline are given.
pub trait Store: CrawlJobStore + PageStore + ContentStore + ExtractionJobStore {}

// Blanket implementation: anything implementing all four traits is a Store
impl<T: CrawlJobStore + PageStore + ContentStore + ExtractionJobStore> Store for T {}
