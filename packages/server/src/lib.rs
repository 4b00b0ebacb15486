// Site crawler API server
//
// HTTP surface over the site_crawler library: crawl jobs, their pages and
// link graph, and content extraction jobs. Jobs run as background tasks.

pub mod config;
pub mod kernel;
pub mod server;

pub use config::*;
