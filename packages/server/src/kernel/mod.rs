// Background job execution
pub mod runner;

pub use runner::{spawn_crawl, spawn_extraction};
