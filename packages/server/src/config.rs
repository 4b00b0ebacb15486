use anyhow::{Context, Result};
use dotenvy::dotenv;
use site_crawler::{CrawlConfig, ExtractionConfig};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string; the in-memory store is used when unset
    pub database_url: Option<String>,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub crawl: CrawlConfig,
    pub extraction: ExtractionConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let mut crawl = CrawlConfig::default();
        if let Some(max_pages) = parse_var::<usize>("CRAWL_MAX_PAGES")? {
            crawl = crawl.with_max_pages(max_pages);
        }
        if let Some(max_depth) = parse_var::<u32>("CRAWL_MAX_DEPTH")? {
            crawl = crawl.with_max_depth(max_depth);
        }
        if let Some(secs) = parse_var::<u64>("CRAWL_MAX_RUNTIME_SECS")? {
            crawl = crawl.with_max_runtime(Duration::from_secs(secs));
        }
        if let Some(secs) = parse_var::<u64>("CRAWL_STALL_TIMEOUT_SECS")? {
            crawl = crawl.with_stall_timeout(Duration::from_secs(secs));
        }

        let mut extraction = ExtractionConfig::default();
        if let Some(size) = parse_var::<usize>("EXTRACT_BATCH_SIZE")? {
            extraction = extraction.with_batch_size(size);
        }
        if let Some(ms) = parse_var::<u64>("EXTRACT_BATCH_DELAY_MS")? {
            extraction = extraction.with_batch_delay(Duration::from_millis(ms));
        }

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|origins| parse_origins(&origins))
                .unwrap_or_default(),
            crawl,
            extraction,
        })
    }
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{name} must be a valid number")),
        Err(_) => Ok(None),
    }
}

/// Comma-separated origin list, blanks dropped.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins("http://localhost:3000, https://app.example.com,,"),
            vec!["http://localhost:3000", "https://app.example.com"]
        );
        assert!(parse_origins("").is_empty());
    }
}
