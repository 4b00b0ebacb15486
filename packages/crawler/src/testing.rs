//! Testing utilities including mock implementations.
//!
//! These let applications and this crate's own tests drive the crawler and
//! the extraction pipeline without network access or a database.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use uuid::Uuid;

use crate::canonical::canonicalize;
use crate::error::{FetchError, FetchResult, StoreError, StoreResult};
use crate::traits::fetcher::{FetchedPage, Fetcher};
use crate::traits::store::{ContentStore, CrawlJobStore, ExtractionJobStore, PageStore};
use crate::types::{
    content::ContentRecord,
    job::{CrawlJob, CrawlProgress, ExtractionJob, ExtractionProgress},
    page::Page,
};

#[derive(Debug, Clone)]
enum MockResponse {
    Page(FetchedPage),
    Error,
    Hang,
}

/// A mock fetcher serving predefined responses.
///
/// Responses are keyed by canonical URL, so `/about` and `/about/` hit the
/// same entry. Unknown URLs answer with an HTML 404 page.
#[derive(Default, Clone)]
pub struct MockFetcher {
    responses: Arc<RwLock<HashMap<String, MockResponse>>>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<String>>>,

    delay: Option<Duration>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(url: &str) -> String {
        canonicalize(url).unwrap_or_else(|| url.to_string())
    }

    fn insert(self, url: &str, response: MockResponse) -> Self {
        self.responses
            .write()
            .unwrap()
            .insert(Self::key(url), response);
        self
    }

    /// Serve `html` with status 200 at `url`.
    pub fn with_page(self, url: &str, html: impl Into<String>) -> Self {
        let page = FetchedPage::html(url, 200, html);
        self.insert(url, MockResponse::Page(page))
    }

    /// Serve an arbitrary response at `url`.
    pub fn with_response(self, url: &str, response: FetchedPage) -> Self {
        self.insert(url, MockResponse::Page(response))
    }

    /// Answer `from` as if it redirected to `to`, which serves `html`.
    pub fn with_redirect(self, from: &str, to: &str, html: impl Into<String>) -> Self {
        let page = FetchedPage::html(to, 200, html);
        self.insert(from, MockResponse::Page(page))
    }

    /// Serve a non-HTML response at `url`.
    pub fn with_binary(self, url: &str) -> Self {
        let page = FetchedPage::non_html(url, 200);
        self.insert(url, MockResponse::Page(page))
    }

    /// Fail fetches of `url` with a timeout error.
    pub fn with_failure(self, url: &str) -> Self {
        self.insert(url, MockResponse::Error)
    }

    /// Never answer fetches of `url`.
    pub fn with_hang(self, url: &str) -> Self {
        self.insert(url, MockResponse::Hang)
    }

    /// Sleep before every answer.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every URL fetched, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    /// Number of fetches whose URL canonicalizes to the same page as `url`.
    pub fn call_count(&self, url: &str) -> usize {
        let key = Self::key(url);
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|called| Self::key(called) == key)
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage> {
        self.calls.write().unwrap().push(url.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let response = self.responses.read().unwrap().get(&Self::key(url)).cloned();
        match response {
            Some(MockResponse::Page(page)) => Ok(page),
            Some(MockResponse::Error) => Err(FetchError::Timeout {
                url: url.to_string(),
            }),
            Some(MockResponse::Hang) => std::future::pending().await,
            None => Ok(FetchedPage::html(
                url,
                404,
                "<html><head><title>Not Found</title></head><body>Not Found</body></html>",
            )),
        }
    }
}

/// Store operations that [`FaultyStore`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    LoadPages,
    UpsertPage,
    CrawlProgress,
    UpsertContent,
    DeleteContent,
    InsertContent,
    ExtractionProgress,
}

/// Wraps a store and fails selected operations.
pub struct FaultyStore<S> {
    inner: S,
    faults: RwLock<HashSet<Fault>>,
    calls: RwLock<HashMap<Fault, usize>>,
}

impl<S> FaultyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            faults: RwLock::new(HashSet::new()),
            calls: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_fault(self, fault: Fault) -> Self {
        self.faults.write().unwrap().insert(fault);
        self
    }

    /// Stop failing `fault` from now on.
    pub fn heal(&self, fault: Fault) {
        self.faults.write().unwrap().remove(&fault);
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// How many times a faultable operation was attempted.
    pub fn attempts(&self, fault: Fault) -> usize {
        self.calls.read().unwrap().get(&fault).copied().unwrap_or(0)
    }

    fn check(&self, fault: Fault) -> StoreResult<()> {
        *self.calls.write().unwrap().entry(fault).or_default() += 1;
        if self.faults.read().unwrap().contains(&fault) {
            return Err(StoreError::Backend(Box::new(std::io::Error::other(format!(
                "injected {fault:?} failure"
            )))));
        }
        Ok(())
    }
}

#[async_trait]
impl<S: CrawlJobStore> CrawlJobStore for FaultyStore<S> {
    async fn insert_crawl_job(&self, job: &CrawlJob) -> StoreResult<()> {
        self.inner.insert_crawl_job(job).await
    }

    async fn get_crawl_job(&self, id: Uuid) -> StoreResult<Option<CrawlJob>> {
        self.inner.get_crawl_job(id).await
    }

    async fn update_crawl_job(&self, job: &CrawlJob) -> StoreResult<()> {
        self.inner.update_crawl_job(job).await
    }

    async fn update_crawl_progress(&self, id: Uuid, progress: &CrawlProgress) -> StoreResult<()> {
        self.check(Fault::CrawlProgress)?;
        self.inner.update_crawl_progress(id, progress).await
    }
}

#[async_trait]
impl<S: PageStore> PageStore for FaultyStore<S> {
    async fn pages_for_job(&self, crawl_job_id: Uuid) -> StoreResult<Vec<Page>> {
        self.check(Fault::LoadPages)?;
        self.inner.pages_for_job(crawl_job_id).await
    }

    async fn upsert_page(&self, page: &Page) -> StoreResult<()> {
        self.check(Fault::UpsertPage)?;
        self.inner.upsert_page(page).await
    }

    async fn update_page_in_counts(
        &self,
        crawl_job_id: Uuid,
        normalized_url: &str,
        internal_links_in: u32,
        external_links_in: u32,
    ) -> StoreResult<()> {
        self.inner
            .update_page_in_counts(crawl_job_id, normalized_url, internal_links_in, external_links_in)
            .await
    }

    async fn count_pages(&self, crawl_job_id: Uuid) -> StoreResult<usize> {
        self.inner.count_pages(crawl_job_id).await
    }
}

#[async_trait]
impl<S: ContentStore> ContentStore for FaultyStore<S> {
    async fn content_urls(&self, crawl_job_id: Uuid) -> StoreResult<HashSet<String>> {
        self.inner.content_urls(crawl_job_id).await
    }

    async fn get_content(
        &self,
        crawl_job_id: Uuid,
        normalized_url: &str,
    ) -> StoreResult<Option<ContentRecord>> {
        self.inner.get_content(crawl_job_id, normalized_url).await
    }

    async fn upsert_content(&self, record: &ContentRecord) -> StoreResult<()> {
        self.check(Fault::UpsertContent)?;
        self.inner.upsert_content(record).await
    }

    async fn delete_content(&self, crawl_job_id: Uuid, normalized_url: &str) -> StoreResult<()> {
        self.check(Fault::DeleteContent)?;
        self.inner.delete_content(crawl_job_id, normalized_url).await
    }

    async fn insert_content(&self, record: &ContentRecord) -> StoreResult<()> {
        self.check(Fault::InsertContent)?;
        self.inner.insert_content(record).await
    }

    async fn count_content(&self, crawl_job_id: Uuid) -> StoreResult<usize> {
        self.inner.count_content(crawl_job_id).await
    }
}

#[async_trait]
impl<S: ExtractionJobStore> ExtractionJobStore for FaultyStore<S> {
    async fn insert_extraction_job(&self, job: &ExtractionJob) -> StoreResult<()> {
        self.inner.insert_extraction_job(job).await
    }

    async fn get_extraction_job(&self, id: Uuid) -> StoreResult<Option<ExtractionJob>> {
        self.inner.get_extraction_job(id).await
    }

    async fn update_extraction_job(&self, job: &ExtractionJob) -> StoreResult<()> {
        self.inner.update_extraction_job(job).await
    }

    async fn update_extraction_progress(
        &self,
        id: Uuid,
        progress: &ExtractionProgress,
    ) -> StoreResult<()> {
        self.check(Fault::ExtractionProgress)?;
        self.inner.update_extraction_progress(id, progress).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;

    #[tokio::test]
    async fn test_mock_fetcher_matches_canonical_urls() {
        let fetcher = MockFetcher::new().with_page("https://example.com/about", "<html></html>");

        let page = fetcher.fetch("https://www.example.com/about/#team").await.unwrap();
        assert_eq!(page.status_code, 200);

        let missing = fetcher.fetch("https://example.com/nope").await.unwrap();
        assert_eq!(missing.status_code, 404);

        assert_eq!(fetcher.call_count("https://example.com/about"), 1);
        assert_eq!(fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_faulty_store_counts_attempts() {
        let store = FaultyStore::new(MemoryStore::new()).with_fault(Fault::LoadPages);

        assert!(store.pages_for_job(Uuid::new_v4()).await.is_err());
        store.heal(Fault::LoadPages);
        assert!(store.pages_for_job(Uuid::new_v4()).await.is_ok());
        assert_eq!(store.attempts(Fault::LoadPages), 2);
    }
}
