//! Crawl engine: frontier, skip policy, link graph, watchdog and the
//! orchestrator that drives them.

pub mod frontier;
pub mod link_graph;
pub mod orchestrator;
pub mod policy;
pub mod watchdog;

pub use orchestrator::CrawlOrchestrator;
