//! Data types for crawl jobs, pages, links and extracted content.

pub mod config;
pub mod content;
pub mod job;
pub mod link;
pub mod page;
