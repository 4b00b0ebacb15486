//! Core trait abstractions.
//!
//! These define the collaborators the crawler and extraction pipeline
//! consume: fetching, HTML parsing and persistence.

pub mod fetcher;
pub mod parser;
pub mod store;
