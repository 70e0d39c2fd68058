pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

use crate::config::StudioConfig;
use crate::services::process_store::ProcessStore;
use axum::{Router, http::HeaderValue, middleware::from_fn, routing::get};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::health::health_check,
        api::handlers::proxy::proxy_image,
    ),
    components(
        schemas(
            api::handlers::health::HealthResponse,
            models::ProcessInfo,
        )
    ),
    tags(
        (name = "system", description = "Service endpoints"),
        (name = "images", description = "Processed image delivery")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: StudioConfig,
    pub processes: Arc<ProcessStore>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: StudioConfig, http: reqwest::Client) -> Self {
        Self {
            config,
            processes: Arc::new(ProcessStore::new()),
            http,
        }
    }
}

/// Expose headers are set per response by the handlers; a CORS-level list
/// would replace them.
pub fn create_app(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/api/image/proxy/:process_id",
            get(api::handlers::proxy::proxy_image),
        )
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
