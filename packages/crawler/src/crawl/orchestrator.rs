//! Breadth-first crawl of one site.
//!
//! A run owns its traversal state (frontier, page map, link graph) and
//! processes one URL at a time. Every page is persisted as soon as it is
//! recorded, so a failed run can be resumed by running the same job again:
//! persisted pages are never fetched twice and counters never go backwards.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::canonical::{canonicalize, seed_url};
use crate::crawl::frontier::Frontier;
use crate::crawl::link_graph::{LinkGraph, PageLinks};
use crate::crawl::policy::{skip_href, skip_url};
use crate::crawl::watchdog::{cancellable, Watchdog};
use crate::error::{CrawlError, CrawlResult, StoreResult};
use crate::scope::Scope;
use crate::traits::{fetcher::Fetcher, parser::HtmlParser, store::Store};
use crate::types::{
    config::{CrawlConfig, ScopePolicy},
    job::{CrawlJob, JobStatus, StopReason},
    page::{FrontierEntry, Page},
};

/// Runs crawl jobs against a store, a fetcher and a parser.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use site_crawler::{CrawlOrchestrator, HttpFetcher, MemoryStore, ScraperParser};
///
/// let crawler = CrawlOrchestrator::new(
///     Arc::new(MemoryStore::new()),
///     Arc::new(HttpFetcher::new()?),
///     Arc::new(ScraperParser::new()),
/// );
/// let job = crawler.create_job("example.com", "project-1").await?;
/// let job = crawler.run(job.id).await?;
/// ```
pub struct CrawlOrchestrator {
    store: Arc<dyn Store>,
    fetcher: Arc<dyn Fetcher>,
    parser: Arc<dyn HtmlParser>,
    config: CrawlConfig,
}

/// Traversal state of one run.
struct CrawlState {
    frontier: Frontier,
    pages: HashMap<String, Page>,
    graph: LinkGraph,
    duplicates_skipped: u64,
}

impl CrawlState {
    /// Rebuild state from what earlier runs of the job persisted.
    fn restore(job: &CrawlJob, mut persisted: Vec<Page>, seed: FrontierEntry, max_depth: u32) -> Self {
        let mut frontier = Frontier::new();
        let mut graph = LinkGraph::with_registry(job.external_links.clone());

        for page in &persisted {
            frontier.mark_seen(page.normalized_url.clone());
            graph.restore_page(page);
        }
        for entry in &job.frontier {
            frontier.push(entry.clone());
        }

        // Targets found by persisted pages but never crawled. Covers a
        // frontier snapshot lost to a failed progress write.
        persisted.sort_by_key(|page| page.depth);
        for page in persisted.iter().filter(|page| page.depth < max_depth) {
            for target in &page.internal_links {
                frontier.push(FrontierEntry::new(target.clone(), page.depth + 1, target.clone()));
            }
        }

        if persisted.is_empty() {
            frontier.push(seed);
        }

        let pages = persisted
            .into_iter()
            .map(|page| (page.normalized_url.clone(), page))
            .collect();

        Self {
            frontier,
            pages,
            graph,
            duplicates_skipped: job.duplicates_skipped,
        }
    }

    /// Copy counters and the pending frontier onto the job.
    fn sync(&self, job: &mut CrawlJob) {
        job.pages_crawled = job.pages_crawled.max(self.pages.len() as u64);
        job.pages_discovered = job.pages_discovered.max(self.frontier.seen_count() as u64);
        job.duplicates_skipped = self.duplicates_skipped;
        job.frontier = self.frontier.snapshot();
    }
}

impl CrawlOrchestrator {
    pub fn new(store: Arc<dyn Store>, fetcher: Arc<dyn Fetcher>, parser: Arc<dyn HtmlParser>) -> Self {
        Self {
            store,
            fetcher,
            parser,
            config: CrawlConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CrawlConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Persist a new pending job for `domain`.
    pub async fn create_job(&self, domain: &str, project_id: &str) -> CrawlResult<CrawlJob> {
        let job = CrawlJob::new(domain.trim(), project_id.trim())
            .with_scope_policy(self.config.scope_policy);
        self.store.insert_crawl_job(&job).await?;
        info!(job_id = %job.id, domain = %job.domain, "Crawl job created");
        Ok(job)
    }

    /// Run (or resume) a crawl job until it reaches a terminal state.
    ///
    /// Returns the terminal job. An `Err` means the terminal state itself
    /// could not be persisted.
    #[instrument(skip(self), fields(job_id = %job_id))]
    pub async fn run(&self, job_id: Uuid) -> CrawlResult<CrawlJob> {
        let mut job = self
            .store
            .get_crawl_job(job_id)
            .await?
            .ok_or(CrawlError::JobNotFound(job_id))?;

        if job.status == JobStatus::Completed {
            info!("Crawl job already completed");
            return Ok(job);
        }

        job.start();
        self.store.update_crawl_job(&job).await?;

        let Some((scope, seed)) = seed_for(&job.domain, job.scope_policy) else {
            let err = CrawlError::InvalidSeed {
                seed: job.domain.clone(),
            };
            warn!(domain = %job.domain, "Rejecting crawl with invalid seed");
            job.fail(StopReason::InvalidSeedUrl, err.to_string());
            self.store.update_crawl_job(&job).await?;
            return Ok(job);
        };

        let persisted = match self.store.pages_for_job(job.id).await {
            Ok(pages) => pages,
            Err(e) => {
                error!(error = %e, "Failed to load persisted pages");
                job.fail(StopReason::Error, e.to_string());
                self.store.update_crawl_job(&job).await?;
                return Ok(job);
            }
        };
        let resumed = persisted.len();
        let mut state = CrawlState::restore(&job, persisted, seed, self.config.max_depth);

        info!(
            domain = %scope.primary_domain(),
            resumed_pages = resumed,
            frontier = state.frontier.len(),
            "Crawl starting"
        );

        let watchdog = Watchdog::arm(self.config.max_runtime, self.config.stall_timeout);
        let outcome = self.traverse(&mut job, &mut state, &scope, &watchdog).await;
        let fired = watchdog.fired();
        watchdog.disarm();

        state.sync(&mut job);
        job.external_links = state.graph.registry().clone();

        match outcome {
            Ok(reason) => match self.reconcile(job.id, &mut state).await {
                Ok(updated) => {
                    info!(
                        reason = %reason,
                        pages = state.pages.len(),
                        duplicates = job.duplicates_skipped,
                        external_links = job.external_links.len(),
                        in_counts_updated = updated,
                        "Crawl completed"
                    );
                    job.complete(reason);
                }
                Err(e) => {
                    error!(error = %e, "Failed to reconcile in-link counts");
                    job.fail(StopReason::Error, e.to_string());
                }
            },
            Err(CrawlError::Cancelled) => {
                let reason = fired.unwrap_or(StopReason::Error);
                let message = self.limit_message(reason);
                warn!(reason = %reason, pages = state.pages.len(), "Crawl stopped by watchdog");
                job.fail(reason, message);
            }
            Err(e) => {
                error!(error = %e, "Crawl failed");
                job.fail(StopReason::Error, e.to_string());
            }
        }

        self.store.update_crawl_job(&job).await?;
        Ok(job)
    }

    fn limit_message(&self, reason: StopReason) -> String {
        match reason {
            StopReason::Timeout => format!(
                "crawl exceeded maximum runtime of {}s",
                self.config.max_runtime.as_secs()
            ),
            StopReason::Stalled => format!(
                "no page processed for {}s",
                self.config.stall_timeout.as_secs()
            ),
            _ => CrawlError::Cancelled.to_string(),
        }
    }

    async fn traverse(
        &self,
        job: &mut CrawlJob,
        state: &mut CrawlState,
        scope: &Scope,
        watchdog: &Watchdog,
    ) -> CrawlResult<StopReason> {
        loop {
            if watchdog.token().is_cancelled() {
                return Err(CrawlError::Cancelled);
            }
            if state.pages.len() >= self.config.max_pages {
                info!(max_pages = self.config.max_pages, "Page limit reached");
                return Ok(StopReason::MaxPagesReached);
            }
            let Some(entry) = state.frontier.pop() else {
                return Ok(StopReason::FrontierExhausted);
            };

            if let Err(e) = self.visit(job, state, scope, &entry, watchdog).await {
                if matches!(e, CrawlError::Cancelled) {
                    state.frontier.requeue(entry);
                }
                return Err(e);
            }
        }
    }

    /// Process one dequeued entry. Page-level problems are logged and the
    /// entry dropped; only cancellation and page persistence errors escape.
    async fn visit(
        &self,
        job: &mut CrawlJob,
        state: &mut CrawlState,
        scope: &Scope,
        entry: &FrontierEntry,
        watchdog: &Watchdog,
    ) -> CrawlResult<()> {
        let url = entry.normalized_url.as_str();

        if entry.depth > self.config.max_depth {
            debug!(url = %url, depth = entry.depth, "Beyond max depth");
            return Ok(());
        }
        if !scope.contains(url) {
            debug!(url = %url, "Out of scope");
            return Ok(());
        }
        if state.pages.contains_key(url) {
            state.duplicates_skipped += 1;
            return Ok(());
        }
        if let Some(reason) = skip_url(&entry.original_url) {
            debug!(url = %url, reason = ?reason, "Skipped by policy");
            return Ok(());
        }

        let token = watchdog.token();
        let fetched = match cancellable(token, self.fetcher.fetch(&entry.original_url)).await? {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!(url = %entry.original_url, error = %e, "Fetch failed, dropping URL");
                return Ok(());
            }
        };

        let Some(html) = fetched.html.as_deref() else {
            debug!(url = %url, status = fetched.status_code, "Non-HTML response");
            return Ok(());
        };

        let page_url = canonicalize(&fetched.final_url).unwrap_or_else(|| url.to_string());
        if page_url != url {
            if !scope.contains(&page_url) {
                debug!(from = %url, to = %page_url, "Redirected out of scope");
                return Ok(());
            }
            if state.pages.contains_key(&page_url) {
                debug!(from = %url, to = %page_url, "Redirected onto a crawled page");
                state.duplicates_skipped += 1;
                return Ok(());
            }
            state.frontier.mark_seen(page_url.clone());
        }

        let metadata = self.parser.parse_metadata(html);
        let mut links = PageLinks::new();
        self.collect_links(state, scope, &page_url, &fetched.final_url, html, entry.depth, &mut links);
        let (internal, external) = links.into_parts();

        let mut page = Page::new(
            job.id,
            page_url.clone(),
            fetched.final_url.clone(),
            fetched.status_code,
            entry.depth,
        )
        .with_metadata(metadata)
        .with_links(internal, external);
        page.internal_links_in = state.graph.internal_in(&page_url);

        cancellable(token, self.store.upsert_page(&page)).await??;

        debug!(
            url = %page_url,
            status = page.status_code,
            depth = page.depth,
            internal_out = page.internal_links_out,
            external_out = page.external_links_out,
            "Page crawled"
        );
        state.pages.insert(page_url, page);
        watchdog.touch();

        state.sync(job);
        if let Ok(Err(e)) = cancellable(token, self.store.update_crawl_progress(job.id, &job.progress())).await {
            warn!(error = %e, "Progress write failed");
        }

        Ok(())
    }

    /// Classify the outbound links of a page, feeding the link graph and
    /// the frontier.
    #[allow(clippy::too_many_arguments)]
    fn collect_links(
        &self,
        state: &mut CrawlState,
        scope: &Scope,
        page_url: &str,
        base_url: &str,
        html: &str,
        depth: u32,
        links: &mut PageLinks,
    ) {
        let Ok(base) = Url::parse(base_url) else {
            return;
        };

        for href in self.parser.extract_links(html) {
            if skip_href(&href).is_some() {
                continue;
            }
            let Ok(resolved) = base.join(&href) else {
                continue;
            };
            let Some(target) = canonicalize(resolved.as_str()) else {
                continue;
            };
            if target == page_url {
                continue;
            }

            if scope.contains(&target) {
                if links.add_internal(&target) {
                    state.graph.record_internal(page_url, &target);
                    if depth < self.config.max_depth {
                        state
                            .frontier
                            .push(FrontierEntry::new(target, depth + 1, resolved));
                    }
                }
            } else {
                links.add_external(&target);
                state.graph.record_external(page_url, &target);
            }
        }
    }

    /// Write final in-counts. Returns how many pages changed.
    async fn reconcile(&self, job_id: Uuid, state: &mut CrawlState) -> StoreResult<usize> {
        let mut updated = 0;
        for page in state.pages.values_mut() {
            if state.graph.reconcile(page) {
                self.store
                    .update_page_in_counts(
                        job_id,
                        &page.normalized_url,
                        page.internal_links_in,
                        page.external_links_in,
                    )
                    .await?;
                updated += 1;
            }
        }
        Ok(updated)
    }
}

/// Scope and first frontier entry for a submitted domain.
fn seed_for(domain: &str, policy: ScopePolicy) -> Option<(Scope, FrontierEntry)> {
    let scope = Scope::for_seed(domain, policy)?;
    let original = seed_url(domain);
    let normalized = canonicalize(&original)?;
    scope
        .contains(&normalized)
        .then(|| (scope, FrontierEntry::new(normalized, 0, original)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::ScraperParser;
    use crate::stores::MemoryStore;
    use crate::testing::{Fault, FaultyStore, MockFetcher};
    use crate::traits::fetcher::FetchedPage;
    use crate::traits::store::{CrawlJobStore, PageStore};

    fn html(title: &str, links: &[&str]) -> String {
        let anchors: String = links
            .iter()
            .map(|href| format!(r#"<a href="{href}">link</a>"#))
            .collect();
        format!("<html><head><title>{title}</title></head><body><h1>{title}</h1>{anchors}</body></html>")
    }

    fn crawler(store: Arc<dyn Store>, fetcher: MockFetcher) -> CrawlOrchestrator {
        CrawlOrchestrator::new(store, Arc::new(fetcher), Arc::new(ScraperParser::new()))
    }

    #[tokio::test]
    async fn test_crawls_site_breadth_first() {
        let store = Arc::new(MemoryStore::new());
        let fetcher = MockFetcher::new()
            .with_page("https://example.com/", html("Home", &["/a", "/b"]))
            .with_page("https://example.com/a", html("A", &["/c"]))
            .with_page("https://example.com/b", html("B", &[]))
            .with_page("https://example.com/c", html("C", &[]));

        let crawler = crawler(store.clone(), fetcher.clone());
        let job = crawler.create_job("example.com", "proj").await.unwrap();
        let job = crawler.run(job.id).await.unwrap();

        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.stop_reason, Some(StopReason::FrontierExhausted));
        assert_eq!(job.pages_crawled, 4);
        assert!(job.frontier.is_empty());
        assert_eq!(
            fetcher.calls(),
            vec![
                "https://example.com/",
                "https://example.com/a",
                "https://example.com/b",
                "https://example.com/c",
            ]
        );

        let pages = store.pages_for_job(job.id).await.unwrap();
        let c = pages.iter().find(|p| p.normalized_url == "https://example.com/c").unwrap();
        assert_eq!(c.depth, 2);
        assert_eq!(c.title.as_deref(), Some("C"));
    }

    #[tokio::test]
    async fn test_respects_max_depth() {
        let store = Arc::new(MemoryStore::new());
        let fetcher = MockFetcher::new()
            .with_page("https://example.com/", html("Home", &["/a"]))
            .with_page("https://example.com/a", html("A", &["/b"]))
            .with_page("https://example.com/b", html("B", &[]));

        let crawler = crawler(store.clone(), fetcher.clone())
            .with_config(CrawlConfig::new().with_max_depth(1));
        let job = crawler.create_job("example.com", "proj").await.unwrap();
        let job = crawler.run(job.id).await.unwrap();

        assert_eq!(job.pages_crawled, 2);
        assert_eq!(fetcher.call_count("https://example.com/b"), 0);

        // The link is still counted even though it is never followed
        let pages = store.pages_for_job(job.id).await.unwrap();
        let a = pages.iter().find(|p| p.normalized_url == "https://example.com/a").unwrap();
        assert_eq!(a.internal_links_out, 1);
    }

    #[tokio::test]
    async fn test_error_pages_are_recorded_and_followed() {
        let store = Arc::new(MemoryStore::new());
        let fetcher = MockFetcher::new()
            .with_page("https://example.com/", html("Home", &["/gone", "/file", "/report.pdf"]))
            .with_response(
                "https://example.com/gone",
                FetchedPage::html("https://example.com/gone", 404, html("Gone", &["/only-from-404"])),
            )
            .with_page("https://example.com/only-from-404", html("Orphan", &[]))
            .with_binary("https://example.com/file");

        let crawler = crawler(store.clone(), fetcher.clone());
        let job = crawler.create_job("example.com", "proj").await.unwrap();
        let job = crawler.run(job.id).await.unwrap();

        let pages = store.pages_for_job(job.id).await.unwrap();
        let urls: Vec<&str> = pages.iter().map(|p| p.normalized_url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/",
                "https://example.com/gone",
                "https://example.com/only-from-404",
            ]
        );

        let gone = &pages[1];
        assert_eq!(gone.status_code, 404);
        assert_eq!(gone.internal_links_out, 1);
        assert_eq!(pages[2].internal_links_in, 1);
        assert_eq!(fetcher.call_count("https://example.com/only-from-404"), 1);
        assert_eq!(fetcher.call_count("https://example.com/report.pdf"), 0);
        assert_eq!(fetcher.call_count("https://example.com/file"), 1);
    }

    #[tokio::test]
    async fn test_redirects_are_identified_by_final_url() {
        let store = Arc::new(MemoryStore::new());
        let fetcher = MockFetcher::new()
            .with_page("https://example.com/", html("Home", &["/old", "/new", "/away"]))
            .with_redirect("https://example.com/old", "https://example.com/new", html("New", &[]))
            .with_page("https://example.com/new", html("New", &[]))
            .with_redirect("https://example.com/away", "https://elsewhere.org/", html("Else", &[]));

        let crawler = crawler(store.clone(), fetcher);
        let job = crawler.create_job("example.com", "proj").await.unwrap();
        let job = crawler.run(job.id).await.unwrap();

        let urls: Vec<String> = store
            .pages_for_job(job.id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.normalized_url)
            .collect();
        assert_eq!(urls, vec!["https://example.com/", "https://example.com/new"]);
        assert_eq!(job.duplicates_skipped, 1);
    }

    #[tokio::test]
    async fn test_invalid_seed_fails_job() {
        let store = Arc::new(MemoryStore::new());
        let fetcher = MockFetcher::new();
        let crawler = crawler(store.clone(), fetcher.clone());

        let job = crawler.create_job("ftp://example.com", "proj").await.unwrap();
        let job = crawler.run(job.id).await.unwrap();

        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.stop_reason, Some(StopReason::InvalidSeedUrl));
        assert!(job.error_message.is_some());
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_job_is_an_error() {
        let crawler = crawler(Arc::new(MemoryStore::new()), MockFetcher::new());
        let result = crawler.run(Uuid::new_v4()).await;
        assert!(matches!(result, Err(CrawlError::JobNotFound(_))));
    }

    #[tokio::test]
    async fn test_progress_write_failures_are_not_fatal() {
        let store = Arc::new(FaultyStore::new(MemoryStore::new()).with_fault(Fault::CrawlProgress));
        let fetcher = MockFetcher::new()
            .with_page("https://example.com/", html("Home", &["/a"]))
            .with_page("https://example.com/a", html("A", &[]));

        let crawler = crawler(store.clone(), fetcher);
        let job = crawler.create_job("example.com", "proj").await.unwrap();
        let job = crawler.run(job.id).await.unwrap();

        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.pages_crawled, 2);
        assert_eq!(store.attempts(Fault::CrawlProgress), 2);
    }

    #[tokio::test]
    async fn test_page_persistence_failure_fails_job() {
        let store = Arc::new(FaultyStore::new(MemoryStore::new()).with_fault(Fault::UpsertPage));
        let fetcher = MockFetcher::new().with_page("https://example.com/", html("Home", &[]));

        let crawler = crawler(store.clone(), fetcher);
        let job = crawler.create_job("example.com", "proj").await.unwrap();
        let job = crawler.run(job.id).await.unwrap();

        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.stop_reason, Some(StopReason::Error));

        let stored = store.get_crawl_job(job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Failed);
    }

    #[tokio::test]
    async fn test_completed_job_is_not_recrawled() {
        let store = Arc::new(MemoryStore::new());
        let fetcher = MockFetcher::new().with_page("https://example.com/", html("Home", &[]));

        let crawler = crawler(store.clone(), fetcher.clone());
        let job = crawler.create_job("example.com", "proj").await.unwrap();
        crawler.run(job.id).await.unwrap();
        let again = crawler.run(job.id).await.unwrap();

        assert_eq!(again.status, JobStatus::Completed);
        assert_eq!(fetcher.calls().len(), 1);
    }
}
