//! In-memory storage implementation for tests and local runs.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::traits::store::{ContentStore, CrawlJobStore, ExtractionJobStore, PageStore};
use crate::types::{
    content::ContentRecord,
    job::{CrawlJob, CrawlProgress, ExtractionJob, ExtractionProgress},
    page::Page,
};

/// In-memory storage for jobs, pages and content.
///
/// Pages and content are kept per job in `BTreeMap`s keyed by normalized
/// URL, so listing order matches the SQL backend's `ORDER BY normalized_url`.
/// Data is lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    crawl_jobs: RwLock<HashMap<Uuid, CrawlJob>>,
    pages: RwLock<HashMap<Uuid, BTreeMap<String, Page>>>,
    content: RwLock<HashMap<Uuid, BTreeMap<String, ContentRecord>>>,
    extraction_jobs: RwLock<HashMap<Uuid, ExtractionJob>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of crawl jobs held.
    pub async fn crawl_job_count(&self) -> usize {
        self.crawl_jobs.read().await.len()
    }
}

#[async_trait]
impl CrawlJobStore for MemoryStore {
    async fn insert_crawl_job(&self, job: &CrawlJob) -> StoreResult<()> {
        let mut jobs = self.crawl_jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(StoreError::Conflict {
                key: job.id.to_string(),
            });
        }
        jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn get_crawl_job(&self, id: Uuid) -> StoreResult<Option<CrawlJob>> {
        Ok(self.crawl_jobs.read().await.get(&id).cloned())
    }

    async fn update_crawl_job(&self, job: &CrawlJob) -> StoreResult<()> {
        let mut jobs = self.crawl_jobs.write().await;
        let slot = jobs.get_mut(&job.id).ok_or(StoreError::NotFound {
            kind: "crawl job",
            id: job.id,
        })?;
        *slot = job.clone();
        Ok(())
    }

    async fn update_crawl_progress(&self, id: Uuid, progress: &CrawlProgress) -> StoreResult<()> {
        let mut jobs = self.crawl_jobs.write().await;
        let job = jobs.get_mut(&id).ok_or(StoreError::NotFound {
            kind: "crawl job",
            id,
        })?;
        job.pages_discovered = progress.pages_discovered;
        job.pages_crawled = progress.pages_crawled;
        job.duplicates_skipped = progress.duplicates_skipped;
        job.frontier = progress.frontier.clone();
        Ok(())
    }
}

#[async_trait]
impl PageStore for MemoryStore {
    async fn pages_for_job(&self, crawl_job_id: Uuid) -> StoreResult<Vec<Page>> {
        Ok(self
            .pages
            .read()
            .await
            .get(&crawl_job_id)
            .map(|pages| pages.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn upsert_page(&self, page: &Page) -> StoreResult<()> {
        self.pages
            .write()
            .await
            .entry(page.crawl_job_id)
            .or_default()
            .insert(page.normalized_url.clone(), page.clone());
        Ok(())
    }

    async fn update_page_in_counts(
        &self,
        crawl_job_id: Uuid,
        normalized_url: &str,
        internal_links_in: u32,
        external_links_in: u32,
    ) -> StoreResult<()> {
        let mut pages = self.pages.write().await;
        let page = pages
            .get_mut(&crawl_job_id)
            .and_then(|p| p.get_mut(normalized_url))
            .ok_or(StoreError::NotFound {
                kind: "page",
                id: crawl_job_id,
            })?;
        page.internal_links_in = internal_links_in;
        page.external_links_in = external_links_in;
        Ok(())
    }

    async fn count_pages(&self, crawl_job_id: Uuid) -> StoreResult<usize> {
        Ok(self
            .pages
            .read()
            .await
            .get(&crawl_job_id)
            .map_or(0, BTreeMap::len))
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn content_urls(&self, crawl_job_id: Uuid) -> StoreResult<HashSet<String>> {
        Ok(self
            .content
            .read()
            .await
            .get(&crawl_job_id)
            .map(|records| records.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_content(
        &self,
        crawl_job_id: Uuid,
        normalized_url: &str,
    ) -> StoreResult<Option<ContentRecord>> {
        Ok(self
            .content
            .read()
            .await
            .get(&crawl_job_id)
            .and_then(|records| records.get(normalized_url))
            .cloned())
    }

    async fn upsert_content(&self, record: &ContentRecord) -> StoreResult<()> {
        self.content
            .write()
            .await
            .entry(record.crawl_job_id)
            .or_default()
            .insert(record.normalized_url.clone(), record.clone());
        Ok(())
    }

    async fn delete_content(&self, crawl_job_id: Uuid, normalized_url: &str) -> StoreResult<()> {
        if let Some(records) = self.content.write().await.get_mut(&crawl_job_id) {
            records.remove(normalized_url);
        }
        Ok(())
    }

    async fn insert_content(&self, record: &ContentRecord) -> StoreResult<()> {
        let mut content = self.content.write().await;
        let records = content.entry(record.crawl_job_id).or_default();
        if records.contains_key(&record.normalized_url) {
            return Err(StoreError::Conflict {
                key: format!("{}/{}", record.crawl_job_id, record.normalized_url),
            });
        }
        records.insert(record.normalized_url.clone(), record.clone());
        Ok(())
    }

    async fn count_content(&self, crawl_job_id: Uuid) -> StoreResult<usize> {
        Ok(self
            .content
            .read()
            .await
            .get(&crawl_job_id)
            .map_or(0, BTreeMap::len))
    }
}

#[async_trait]
impl ExtractionJobStore for MemoryStore {
    async fn insert_extraction_job(&self, job: &ExtractionJob) -> StoreResult<()> {
        let mut jobs = self.extraction_jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(StoreError::Conflict {
                key: job.id.to_string(),
            });
        }
        jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn get_extraction_job(&self, id: Uuid) -> StoreResult<Option<ExtractionJob>> {
        Ok(self.extraction_jobs.read().await.get(&id).cloned())
    }

    async fn update_extraction_job(&self, job: &ExtractionJob) -> StoreResult<()> {
        let mut jobs = self.extraction_jobs.write().await;
        let slot = jobs.get_mut(&job.id).ok_or(StoreError::NotFound {
            kind: "extraction job",
            id: job.id,
        })?;
        *slot = job.clone();
        Ok(())
    }

    async fn update_extraction_progress(
        &self,
        id: Uuid,
        progress: &ExtractionProgress,
    ) -> StoreResult<()> {
        let mut jobs = self.extraction_jobs.write().await;
        let job = jobs.get_mut(&id).ok_or(StoreError::NotFound {
            kind: "extraction job",
            id,
        })?;
        job.pages_total = progress.pages_total;
        job.pages_extracted = progress.pages_extracted;
        job.pages_failed = progress.pages_failed;
        job.failed_urls = progress.failed_urls.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::content::ExtractedContent;

    fn page(job: Uuid, url: &str) -> Page {
        Page::new(job, url, url, 200, 0)
    }

    #[tokio::test]
    async fn test_pages_ordered_by_normalized_url() {
        let store = MemoryStore::new();
        let job = Uuid::new_v4();

        store.upsert_page(&page(job, "https://example.com/b")).await.unwrap();
        store.upsert_page(&page(job, "https://example.com/a")).await.unwrap();
        store.upsert_page(&page(Uuid::new_v4(), "https://example.com/c")).await.unwrap();

        let urls: Vec<String> = store
            .pages_for_job(job)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.normalized_url)
            .collect();
        assert_eq!(urls, vec!["https://example.com/a", "https://example.com/b"]);
        assert_eq!(store.count_pages(job).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_upsert_page_replaces_same_key() {
        let store = MemoryStore::new();
        let job = Uuid::new_v4();

        store.upsert_page(&page(job, "https://example.com/")).await.unwrap();
        let mut updated = page(job, "https://example.com/");
        updated.title = Some("Home".into());
        store.upsert_page(&updated).await.unwrap();

        let pages = store.pages_for_job(job).await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].title.as_deref(), Some("Home"));
    }

    #[tokio::test]
    async fn test_update_in_counts() {
        let store = MemoryStore::new();
        let job = Uuid::new_v4();
        store.upsert_page(&page(job, "https://example.com/")).await.unwrap();

        store
            .update_page_in_counts(job, "https://example.com/", 4, 0)
            .await
            .unwrap();
        assert_eq!(store.pages_for_job(job).await.unwrap()[0].internal_links_in, 4);

        let missing = store
            .update_page_in_counts(job, "https://example.com/nope", 1, 0)
            .await;
        assert!(matches!(missing, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_insert_content_conflicts_on_existing_key() {
        let store = MemoryStore::new();
        let job = Uuid::new_v4();
        let record = ContentRecord::new(job, "https://example.com/", ExtractedContent::default(), "<html>", 1);

        store.insert_content(&record).await.unwrap();
        let err = store.insert_content(&record).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        store.delete_content(job, "https://example.com/").await.unwrap();
        store.insert_content(&record).await.unwrap();
        assert_eq!(store.count_content(job).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_crawl_progress_only_touches_counters() {
        let store = MemoryStore::new();
        let mut job = CrawlJob::new("example.com", "proj");
        job.start();
        store.insert_crawl_job(&job).await.unwrap();

        job.pages_crawled = 3;
        job.pages_discovered = 7;
        store.update_crawl_progress(job.id, &job.progress()).await.unwrap();

        let stored = store.get_crawl_job(job.id).await.unwrap().unwrap();
        assert_eq!(stored.pages_crawled, 3);
        assert_eq!(stored.pages_discovered, 7);
        assert_eq!(stored.status, job.status);
        assert_eq!(store.crawl_job_count().await, 1);
    }
}
