//! Crawl job endpoints.

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use site_crawler::{crawl_pages, crawl_status, CrawlPages, CrawlStatus, JobStatus};
use uuid::Uuid;

use crate::kernel::runner::spawn_crawl;
use crate::server::app::AppState;
use crate::server::error::{parse_job_id, ApiError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCrawlRequest {
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CrawlAccepted {
    pub crawl_job_id: Uuid,
    pub status: JobStatus,
}

/// `POST /crawl`: create a crawl job and start it in the background.
pub async fn create_crawl_handler(
    Extension(state): Extension<AppState>,
    body: Result<Json<CreateCrawlRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CrawlAccepted>), ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let domain = required(request.domain, "domain")?;
    let project_id = required(request.project_id, "projectId")?;

    let job = state
        .crawler
        .create_job(&domain, &project_id)
        .await
        .map_err(|e| match e {
            site_crawler::CrawlError::Store(e) => ApiError::Store(e),
            other => ApiError::BadRequest(other.to_string()),
        })?;

    tracing::info!(job_id = %job.id, domain = %domain, "crawl job accepted");
    spawn_crawl(state.crawler.clone(), state.store.clone(), job.id);

    Ok((
        StatusCode::ACCEPTED,
        Json(CrawlAccepted {
            crawl_job_id: job.id,
            status: JobStatus::Running,
        }),
    ))
}

/// `GET /crawl/:job_id`
pub async fn crawl_status_handler(
    Extension(state): Extension<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<CrawlStatus>, ApiError> {
    let job_id = parse_job_id(&job_id)?;

    crawl_status(state.store.as_ref(), job_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("crawl job not found: {job_id}")))
}

/// `GET /crawl/:job_id/pages`
pub async fn crawl_pages_handler(
    Extension(state): Extension<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<CrawlPages>, ApiError> {
    let job_id = parse_job_id(&job_id)?;

    crawl_pages(state.store.as_ref(), job_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("crawl job not found: {job_id}")))
}

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::BadRequest(format!("{field} is required"))),
    }
}
