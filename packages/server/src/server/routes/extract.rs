//! Content extraction endpoints.
//!
//! A sitemap id is the id of the crawl job whose pages are extracted.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use site_crawler::{extraction_status, ExtractionStatus, JobStatus};
use uuid::Uuid;

use crate::kernel::runner::spawn_extraction;
use crate::server::app::AppState;
use crate::server::error::{parse_job_id, ApiError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartExtractionRequest {
    #[serde(default)]
    pub only_missing: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractionAccepted {
    pub extraction_job_id: Uuid,
    pub status: JobStatus,
}

/// `POST /api/sitemaps/:sitemap_id/extract-content`
///
/// The body is optional; a missing or unreadable body extracts every page.
pub async fn start_extraction_handler(
    Extension(state): Extension<AppState>,
    Path(sitemap_id): Path<String>,
    body: Option<Json<StartExtractionRequest>>,
) -> Result<(StatusCode, Json<ExtractionAccepted>), ApiError> {
    let crawl_job_id = parse_job_id(&sitemap_id)?;
    let only_missing = body.map(|Json(request)| request.only_missing).unwrap_or(false);

    let job = state.pipeline.create_job(crawl_job_id, only_missing).await?;

    tracing::info!(
        job_id = %job.id,
        crawl_job_id = %crawl_job_id,
        only_missing,
        "extraction job accepted"
    );
    spawn_extraction(state.pipeline.clone(), state.store.clone(), job.id);

    Ok((
        StatusCode::ACCEPTED,
        Json(ExtractionAccepted {
            extraction_job_id: job.id,
            status: JobStatus::Running,
        }),
    ))
}

/// `GET /api/sitemaps/:sitemap_id/extract-content/:job_id`
pub async fn extraction_status_handler(
    Extension(state): Extension<AppState>,
    Path((sitemap_id, job_id)): Path<(String, String)>,
) -> Result<Json<ExtractionStatus>, ApiError> {
    let crawl_job_id = parse_job_id(&sitemap_id)?;
    let job_id = parse_job_id(&job_id)?;

    let status = extraction_status(state.store.as_ref(), job_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("extraction job not found: {job_id}")))?;

    if status.crawl_job_id != crawl_job_id {
        return Err(ApiError::BadRequest(format!(
            "extraction job {job_id} does not belong to sitemap {crawl_job_id}"
        )));
    }

    Ok(Json(status))
}
