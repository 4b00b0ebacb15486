use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;

use crate::server::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Health check endpoint
///
/// Probes the store with a lookup; returns 503 if it fails or takes longer
/// than five seconds.
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let probe = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        state.store.get_crawl_job(uuid::Uuid::nil()),
    )
    .await;

    let error = match probe {
        Ok(Ok(_)) => None,
        Ok(Err(e)) => Some(format!("Store query failed: {}", e)),
        Err(_) => Some("Store query timeout (>5s)".to_string()),
    };

    let (status_code, status) = match error {
        None => (StatusCode::OK, "healthy"),
        Some(_) => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy"),
    };

    (
        status_code,
        Json(HealthResponse {
            status: status.to_string(),
            error,
        }),
    )
}
