//! Job records and their lifecycle transitions.
//!
//! Both job kinds move `pending → running → completed | failed`. The
//! transition methods are the only places that touch the status and the
//! terminal fields, so a record can never end up half-terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::types::config::ScopePolicy;
use crate::types::link::ExternalLinkRegistry;
use crate::types::page::FrontierEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Whether the job has reached a final state for its current run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

/// Why a crawl run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Page budget reached (frontier may still hold entries)
    MaxPagesReached,
    /// No entries left to crawl
    FrontierExhausted,
    /// Wall-clock ceiling hit
    Timeout,
    /// No page processed within the stall window
    Stalled,
    /// Seed could not be canonicalized or is out of its own scope
    InvalidSeedUrl,
    /// Unexpected error escaped the crawl loop
    Error,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::MaxPagesReached => "max_pages_reached",
            StopReason::FrontierExhausted => "frontier_exhausted",
            StopReason::Timeout => "timeout",
            StopReason::Stalled => "stalled",
            StopReason::InvalidSeedUrl => "invalid_seed_url",
            StopReason::Error => "error",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StopReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "max_pages_reached" => Ok(StopReason::MaxPagesReached),
            "frontier_exhausted" => Ok(StopReason::FrontierExhausted),
            "timeout" => Ok(StopReason::Timeout),
            "stalled" => Ok(StopReason::Stalled),
            "invalid_seed_url" => Ok(StopReason::InvalidSeedUrl),
            "error" => Ok(StopReason::Error),
            other => Err(format!("unknown stop reason: {other}")),
        }
    }
}

/// A crawl of one website.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlJob {
    pub id: Uuid,

    /// Seed domain or URL as submitted
    pub domain: String,

    pub project_id: String,

    pub status: JobStatus,

    /// Domain matching the job was created with; every run and every page
    /// listing of the job uses it
    #[serde(default)]
    pub scope_policy: ScopePolicy,

    /// Distinct URLs ever enqueued or crawled
    pub pages_discovered: u64,

    /// Pages recorded (resumed pages included)
    pub pages_crawled: u64,

    /// Links and dequeues that hit an already-known URL
    pub duplicates_skipped: u64,

    pub stop_reason: Option<StopReason>,

    pub error_message: Option<String>,

    /// Distinct external destinations seen by the crawl
    #[serde(default)]
    pub external_links: ExternalLinkRegistry,

    /// Pending frontier snapshot, written with progress so a resumed run
    /// can continue the traversal
    #[serde(default)]
    pub frontier: Vec<FrontierEntry>,

    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
}

impl CrawlJob {
    /// Create a pending job.
    pub fn new(domain: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            domain: domain.into(),
            project_id: project_id.into(),
            status: JobStatus::Pending,
            scope_policy: ScopePolicy::Exact,
            pages_discovered: 0,
            pages_crawled: 0,
            duplicates_skipped: 0,
            stop_reason: None,
            error_message: None,
            external_links: ExternalLinkRegistry::default(),
            frontier: Vec::new(),
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            failed_at: None,
        }
    }

    pub fn with_scope_policy(mut self, policy: ScopePolicy) -> Self {
        self.scope_policy = policy;
        self
    }

    /// Enter `running`. Clears diagnostics left by a previous run.
    pub fn start(&mut self) {
        self.status = JobStatus::Running;
        self.started_at = Some(Utc::now());
        self.completed_at = None;
        self.failed_at = None;
        self.stop_reason = None;
        self.error_message = None;
    }

    /// Enter `completed`.
    pub fn complete(&mut self, reason: StopReason) {
        self.status = JobStatus::Completed;
        self.completed_at = Some(Utc::now());
        self.stop_reason = Some(reason);
        self.frontier.clear();
    }

    /// Enter `failed` with a reason and a human-readable message.
    pub fn fail(&mut self, reason: StopReason, message: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.failed_at = Some(Utc::now());
        self.stop_reason = Some(reason);
        self.error_message = Some(message.into());
    }

    pub fn progress(&self) -> CrawlProgress {
        CrawlProgress {
            pages_discovered: self.pages_discovered,
            pages_crawled: self.pages_crawled,
            duplicates_skipped: self.duplicates_skipped,
            frontier: self.frontier.clone(),
        }
    }
}

/// Counters written by the best-effort progress channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlProgress {
    pub pages_discovered: u64,
    pub pages_crawled: u64,
    pub duplicates_skipped: u64,
    pub frontier: Vec<FrontierEntry>,
}

/// A batch content extraction over one crawl job's pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionJob {
    pub id: Uuid,
    pub crawl_job_id: Uuid,
    pub status: JobStatus,

    /// Only pages without a content record are processed
    pub only_missing: bool,

    pub pages_total: u64,
    pub pages_extracted: u64,
    pub pages_failed: u64,

    #[serde(default)]
    pub failed_urls: Vec<String>,

    pub error_message: Option<String>,

    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
}

impl ExtractionJob {
    pub fn new(crawl_job_id: Uuid, only_missing: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            crawl_job_id,
            status: JobStatus::Pending,
            only_missing,
            pages_total: 0,
            pages_extracted: 0,
            pages_failed: 0,
            failed_urls: Vec::new(),
            error_message: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            failed_at: None,
        }
    }

    pub fn start(&mut self) {
        self.status = JobStatus::Running;
        self.started_at = Some(Utc::now());
        self.completed_at = None;
        self.failed_at = None;
        self.error_message = None;
    }

    pub fn complete(&mut self) {
        self.status = JobStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.failed_at = Some(Utc::now());
        self.error_message = Some(message.into());
    }

    pub fn progress(&self) -> ExtractionProgress {
        ExtractionProgress {
            pages_total: self.pages_total,
            pages_extracted: self.pages_extracted,
            pages_failed: self.pages_failed,
            failed_urls: self.failed_urls.clone(),
        }
    }
}

/// Counters written after every extraction batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionProgress {
    pub pages_total: u64,
    pub pages_extracted: u64,
    pub pages_failed: u64,
    pub failed_urls: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crawl_job_lifecycle() {
        let mut job = CrawlJob::new("example.com", "proj-1");
        assert_eq!(job.status, JobStatus::Pending);

        job.start();
        assert_eq!(job.status, JobStatus::Running);
        assert!(job.started_at.is_some());

        job.complete(StopReason::FrontierExhausted);
        assert!(job.status.is_terminal());
        assert_eq!(job.stop_reason, Some(StopReason::FrontierExhausted));
        assert!(job.completed_at.is_some());
        assert!(job.failed_at.is_none());
    }

    #[test]
    fn test_restart_clears_previous_failure() {
        let mut job = CrawlJob::new("example.com", "proj-1");
        job.start();
        job.fail(StopReason::Stalled, "no progress");
        assert_eq!(job.error_message.as_deref(), Some("no progress"));

        job.start();
        assert_eq!(job.status, JobStatus::Running);
        assert!(job.stop_reason.is_none());
        assert!(job.error_message.is_none());
        assert!(job.failed_at.is_none());
    }

    #[test]
    fn test_timeout_and_stall_are_distinct_reasons() {
        assert_ne!(StopReason::Timeout.as_str(), StopReason::Stalled.as_str());
        assert!("stalled".parse::<StopReason>().is_ok());
        assert!("exhausted".parse::<StopReason>().is_err());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&JobStatus::Running).unwrap();
        assert_eq!(json, "\"running\"");
    }
}
