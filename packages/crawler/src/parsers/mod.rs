//! HTML parser implementations.

pub mod html;

pub use html::ScraperParser;
