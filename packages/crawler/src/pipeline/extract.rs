//! Batch content extraction for a finished crawl.
//!
//! Pages are processed in fixed-size batches: every page of a batch runs
//! concurrently, the next batch starts once the whole batch has settled and
//! a short delay has passed. A page that cannot be fetched or stored is
//! recorded as failed; it never fails the job.

use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::error::{ExtractionError, Result};
use crate::traits::{fetcher::Fetcher, parser::HtmlParser, store::Store};
use crate::types::{
    config::ExtractionConfig,
    content::ContentRecord,
    job::ExtractionJob,
    page::Page,
};

/// Extracts and stores content for the pages of a crawl job.
pub struct ExtractionPipeline {
    store: Arc<dyn Store>,
    fetcher: Arc<dyn Fetcher>,
    parser: Arc<dyn HtmlParser>,
    config: ExtractionConfig,
}

impl ExtractionPipeline {
    pub fn new(store: Arc<dyn Store>, fetcher: Arc<dyn Fetcher>, parser: Arc<dyn HtmlParser>) -> Self {
        Self {
            store,
            fetcher,
            parser,
            config: ExtractionConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ExtractionConfig) -> Self {
        self.config = config;
        self
    }

    /// Persist a pending extraction job. Fails if the crawl job is unknown.
    pub async fn create_job(&self, crawl_job_id: Uuid, only_missing: bool) -> Result<ExtractionJob> {
        if self.store.get_crawl_job(crawl_job_id).await?.is_none() {
            return Err(ExtractionError::CrawlJobNotFound(crawl_job_id));
        }

        let job = ExtractionJob::new(crawl_job_id, only_missing);
        self.store.insert_extraction_job(&job).await?;
        info!(job_id = %job.id, crawl_job_id = %crawl_job_id, only_missing, "Extraction job created");
        Ok(job)
    }

    /// Run an extraction job to a terminal state and return it.
    #[instrument(skip(self), fields(job_id = %job_id))]
    pub async fn run(&self, job_id: Uuid) -> Result<ExtractionJob> {
        let mut job = self
            .store
            .get_extraction_job(job_id)
            .await?
            .ok_or(ExtractionError::JobNotFound(job_id))?;

        job.start();
        job.pages_total = 0;
        job.pages_extracted = 0;
        job.pages_failed = 0;
        job.failed_urls.clear();
        self.store.update_extraction_job(&job).await?;

        let (pages, existing) = match self.select_pages(&job).await {
            Ok(selection) => selection,
            Err(e) => {
                error!(error = %e, "Failed to load pages for extraction");
                job.fail(e.to_string());
                self.store.update_extraction_job(&job).await?;
                return Ok(job);
            }
        };

        job.pages_total = pages.len() as u64;
        if pages.is_empty() {
            info!("Nothing to extract");
            job.complete();
            self.store.update_extraction_job(&job).await?;
            return Ok(job);
        }

        info!(
            pages = pages.len(),
            batch_size = self.config.batch_size,
            only_missing = job.only_missing,
            "Extraction starting"
        );

        let mut stored: HashSet<String> = existing;
        for (index, batch) in pages.chunks(self.config.batch_size.max(1)).enumerate() {
            if index > 0 && !self.config.batch_delay.is_zero() {
                tokio::time::sleep(self.config.batch_delay).await;
            }

            let outcomes = join_all(batch.iter().map(|page| self.extract_page(&job, page))).await;

            for (page, outcome) in batch.iter().zip(outcomes) {
                match outcome {
                    Ok(()) => {
                        job.pages_extracted += 1;
                        stored.insert(page.normalized_url.clone());
                    }
                    Err(message) => {
                        warn!(url = %page.normalized_url, error = %message, "Page extraction failed");
                        job.pages_failed += 1;
                        job.failed_urls.push(page.normalized_url.clone());
                    }
                }
            }

            debug!(
                batch = index + 1,
                extracted = job.pages_extracted,
                failed = job.pages_failed,
                "Batch settled"
            );
            if let Err(e) = self
                .store
                .update_extraction_progress(job.id, &job.progress())
                .await
            {
                warn!(error = %e, "Progress write failed");
            }
        }

        self.verify_count(&job, stored.len()).await;

        info!(
            extracted = job.pages_extracted,
            failed = job.pages_failed,
            "Extraction completed"
        );
        job.complete();
        self.store.update_extraction_job(&job).await?;
        Ok(job)
    }

    /// Pages to process and the URLs that already have content.
    async fn select_pages(&self, job: &ExtractionJob) -> Result<(Vec<Page>, HashSet<String>)> {
        let pages = self.store.pages_for_job(job.crawl_job_id).await?;
        let existing = self.store.content_urls(job.crawl_job_id).await?;

        let pages = if job.only_missing {
            pages
                .into_iter()
                .filter(|page| !existing.contains(&page.normalized_url))
                .collect()
        } else {
            pages
        };
        Ok((pages, existing))
    }

    /// Fetch, extract and persist one page. Errors are per-page messages.
    async fn extract_page(&self, job: &ExtractionJob, page: &Page) -> std::result::Result<(), String> {
        let fetched = self
            .fetcher
            .fetch(&page.original_url)
            .await
            .map_err(|e| e.to_string())?;

        if !fetched.is_success() {
            return Err(format!("HTTP {}", fetched.status_code));
        }
        let Some(html) = fetched.html else {
            return Err("non-HTML response".to_string());
        };

        let content = self.parser.extract_content(&html);
        let record = ContentRecord::new(
            job.crawl_job_id,
            page.normalized_url.clone(),
            content,
            html,
            self.config.schema_version,
        );
        self.persist(&record).await
    }

    /// Upsert, falling back to delete + insert.
    async fn persist(&self, record: &ContentRecord) -> std::result::Result<(), String> {
        let upsert_err = match self.store.upsert_content(record).await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };
        warn!(url = %record.normalized_url, error = %upsert_err, "Upsert failed, retrying as delete + insert");

        let fallback = match self
            .store
            .delete_content(record.crawl_job_id, &record.normalized_url)
            .await
        {
            Ok(()) => self.store.insert_content(record).await,
            Err(e) => Err(e),
        };
        fallback.map_err(|fallback_err| format!("upsert failed: {upsert_err}; fallback failed: {fallback_err}"))
    }

    async fn verify_count(&self, job: &ExtractionJob, expected: usize) {
        match self.store.count_content(job.crawl_job_id).await {
            Ok(actual) if actual != expected => {
                warn!(expected, actual, "Stored content count disagrees with extraction results");
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Could not verify stored content count"),
        }
    }
}
