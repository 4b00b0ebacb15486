//! Single-site crawler with link graph accounting and content extraction.
//!
//! A crawl job walks one website breadth-first from its seed domain. Every
//! page gets a canonical identity (see [`canonical`]), is persisted as soon
//! as it is fetched, and contributes to a link graph that records in/out link
//! counts per page and a registry of external destinations. Runs are bounded
//! by a page budget, a depth limit, a wall-clock ceiling and a stall window,
//! and a failed job can be resumed without refetching what it already has.
//!
//! Separately, an extraction job takes the pages of a crawl and stores their
//! clean text, headings, SEO metadata and JSON-LD.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use site_crawler::{CrawlOrchestrator, ExtractionPipeline, HttpFetcher, MemoryStore, ScraperParser};
//!
//! let store = Arc::new(MemoryStore::new());
//! let fetcher = Arc::new(HttpFetcher::new()?);
//! let parser = Arc::new(ScraperParser::new());
//!
//! let crawler = CrawlOrchestrator::new(store.clone(), fetcher.clone(), parser.clone());
//! let job = crawler.create_job("example.com", "project-1").await?;
//! let job = crawler.run(job.id).await?;
//!
//! let pipeline = ExtractionPipeline::new(store, fetcher, parser);
//! let extraction = pipeline.create_job(job.id, false).await?;
//! pipeline.run(extraction.id).await?;
//! ```
//!
//! # Modules
//!
//! - [`canonical`] - URL canonicalization
//! - [`scope`] - Domain scope filter
//! - [`crawl`] - Frontier, link graph, watchdog and the crawl orchestrator
//! - [`pipeline`] - Batch content extraction
//! - [`status`] - Job status reporting
//! - [`traits`] - Fetcher, parser and store abstractions
//! - [`fetchers`], [`parsers`], [`stores`] - Implementations of those traits
//! - [`testing`] - Mock fetcher and fault-injecting store

pub mod canonical;
pub mod crawl;
pub mod error;
pub mod fetchers;
pub mod parsers;
pub mod pipeline;
pub mod scope;
pub mod status;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use canonical::{canonicalize, is_in_scope, primary_domain};
pub use crawl::CrawlOrchestrator;
pub use error::{CrawlError, ExtractionError, FetchError, StoreError};
pub use fetchers::HttpFetcher;
pub use parsers::ScraperParser;
pub use pipeline::ExtractionPipeline;
pub use scope::Scope;
pub use status::{crawl_pages, crawl_status, extraction_status, CrawlPages, CrawlStatus, ExtractionStatus};
pub use traits::{
    fetcher::{FetchedPage, Fetcher},
    parser::HtmlParser,
    store::{ContentStore, CrawlJobStore, ExtractionJobStore, PageStore, Store},
};
pub use types::{
    config::{CrawlConfig, ExtractionConfig, ScopePolicy},
    content::{ContentRecord, ExtractedContent, Headings, OpenGraph, SchemaBlock, SeoBlock},
    job::{CrawlJob, CrawlProgress, ExtractionJob, ExtractionProgress, JobStatus, StopReason},
    link::{ExternalLinkRecord, ExternalLinkRegistry},
    page::{FrontierEntry, Page, PageMetadata},
};

// Re-export stores
pub use stores::MemoryStore;

#[cfg(feature = "postgres")]
pub use stores::PostgresStore;

// Re-export testing utilities
pub use testing::{Fault, FaultyStore, MockFetcher};
