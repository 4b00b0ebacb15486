//! Configuration types for crawling and extraction.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a job's primary domain is matched against a URL host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopePolicy {
    /// Host must equal the primary domain (after `www.` stripping)
    #[default]
    Exact,

    /// Host may also be any subdomain of the primary domain
    IncludeSubdomains,
}

impl ScopePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopePolicy::Exact => "exact",
            ScopePolicy::IncludeSubdomains => "include_subdomains",
        }
    }
}

impl std::str::FromStr for ScopePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(ScopePolicy::Exact),
            "include_subdomains" => Ok(ScopePolicy::IncludeSubdomains),
            other => Err(format!("unknown scope policy: {other}")),
        }
    }
}

/// Configuration for crawl runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Maximum number of pages recorded per job (resumed pages included)
    pub max_pages: usize,

    /// Maximum link depth from the seed (seed = 0)
    pub max_depth: u32,

    /// Hard wall-clock ceiling for one run
    #[serde(with = "duration_secs")]
    pub max_runtime: Duration,

    /// Inactivity window after which the run is considered stalled
    #[serde(with = "duration_secs")]
    pub stall_timeout: Duration,

    /// Domain matching policy, applied at every scope check
    pub scope_policy: ScopePolicy,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 1000,
            max_depth: 10,
            max_runtime: Duration::from_secs(15 * 60),
            stall_timeout: Duration::from_secs(2 * 60),
            scope_policy: ScopePolicy::Exact,
        }
    }
}

impl CrawlConfig {
    /// Create a config with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum pages.
    pub fn with_max_pages(mut self, max: usize) -> Self {
        self.max_pages = max;
        self
    }

    /// Set maximum depth.
    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the wall-clock ceiling.
    pub fn with_max_runtime(mut self, runtime: Duration) -> Self {
        self.max_runtime = runtime;
        self
    }

    /// Set the stall window.
    pub fn with_stall_timeout(mut self, timeout: Duration) -> Self {
        self.stall_timeout = timeout;
        self
    }

    /// Follow subdomains of the primary domain.
    pub fn with_subdomains(mut self) -> Self {
        self.scope_policy = ScopePolicy::IncludeSubdomains;
        self
    }
}

/// Configuration for batch content extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Pages fetched concurrently per batch
    pub batch_size: usize,

    /// Pause between batches
    #[serde(with = "duration_millis")]
    pub batch_delay: Duration,

    /// Version stamped on every content record
    pub schema_version: i32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            batch_delay: Duration::from_secs(1),
            schema_version: 1,
        }
    }
}

impl ExtractionConfig {
    /// Create a config with default batching.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set batch size (clamped to at least 1).
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Set the inter-batch delay.
    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crawl_defaults() {
        let config = CrawlConfig::default();
        assert_eq!(config.max_pages, 1000);
        assert_eq!(config.max_depth, 10);
        assert_eq!(config.max_runtime, Duration::from_secs(900));
        assert_eq!(config.stall_timeout, Duration::from_secs(120));
        assert_eq!(config.scope_policy, ScopePolicy::Exact);
    }

    #[test]
    fn test_extraction_batch_size_never_zero() {
        let config = ExtractionConfig::new().with_batch_size(0);
        assert_eq!(config.batch_size, 1);
    }

    #[test]
    fn test_config_serializes_durations() {
        let config = CrawlConfig::new().with_max_runtime(Duration::from_secs(30));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["max_runtime"], 30);
        assert_eq!(json["scope_policy"], "exact");
    }
}
