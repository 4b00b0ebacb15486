// HTTP routes
pub mod crawl;
pub mod extract;
pub mod health;

pub use crawl::*;
pub use extract::*;
pub use health::*;
