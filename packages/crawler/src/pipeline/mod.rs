//! Content extraction pipeline.

pub mod extract;

pub use extract::ExtractionPipeline;
