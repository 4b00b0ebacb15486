//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use site_crawler::{
    CrawlConfig, CrawlOrchestrator, ExtractionConfig, ExtractionPipeline, Fetcher, HtmlParser,
    Store,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::routes::{
    create_crawl_handler, crawl_pages_handler, crawl_status_handler, extraction_status_handler,
    health_handler, start_extraction_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub crawler: Arc<CrawlOrchestrator>,
    pub pipeline: Arc<ExtractionPipeline>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        fetcher: Arc<dyn Fetcher>,
        parser: Arc<dyn HtmlParser>,
        crawl_config: CrawlConfig,
        extraction_config: ExtractionConfig,
    ) -> Self {
        let crawler = CrawlOrchestrator::new(store.clone(), fetcher.clone(), parser.clone())
            .with_config(crawl_config);
        let pipeline =
            ExtractionPipeline::new(store.clone(), fetcher, parser).with_config(extraction_config);

        Self {
            store,
            crawler: Arc::new(crawler),
            pipeline: Arc::new(pipeline),
        }
    }
}

/// Build the Axum application router
///
/// An empty `allowed_origins` list allows any origin.
pub fn build_app(state: AppState, allowed_origins: &[String]) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(origins)
    };

    Router::new()
        .route("/health", get(health_handler))
        .route("/crawl", post(create_crawl_handler))
        .route("/crawl/:job_id", get(crawl_status_handler))
        .route("/crawl/:job_id/pages", get(crawl_pages_handler))
        .route(
            "/api/sitemaps/:sitemap_id/extract-content",
            post(start_extraction_handler),
        )
        .route(
            "/api/sitemaps/:sitemap_id/extract-content/:job_id",
            get(extraction_status_handler),
        )
        .layer(Extension(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
