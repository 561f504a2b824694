pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::PipelineConfig;
use crate::services::convert::ConvertService;
use crate::services::engine::DocumentEngine;
use crate::services::merge::MergeService;
use crate::services::preview::PreviewService;
use crate::services::storage::StorageService;
use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::pipeline::preview_file,
        api::handlers::pipeline::convert_file,
        api::handlers::pipeline::merge_files,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::pipeline::PreviewResponse,
            api::handlers::pipeline::ConvertResponse,
            api::handlers::pipeline::MergeResponse,
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "pipeline", description = "Document conversion, merge and preview"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<StorageService>,
    pub engine: Arc<dyn DocumentEngine>,
    pub convert: Arc<ConvertService>,
    pub merge: Arc<MergeService>,
    pub preview: Arc<PreviewService>,
    pub config: PipelineConfig,
}

impl AppState {
    pub fn new(
        storage: Arc<StorageService>,
        engine: Arc<dyn DocumentEngine>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            convert: Arc::new(ConvertService::new(storage.clone(), engine.clone())),
            merge: Arc::new(MergeService::new(storage.clone(), engine.clone())),
            preview: Arc::new(PreviewService::new(storage.clone(), engine.clone())),
            storage,
            engine,
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/api/preview", post(api::handlers::pipeline::preview_file))
        .route("/api/convert", post(api::handlers::pipeline::convert_file))
        .route("/api/merge", post(api::handlers::pipeline::merge_files))
        .nest_service(
            "/downloads",
            ServeDir::new(state.config.output_dir.clone()),
        )
        .nest_service(
            "/previews",
            ServeDir::new(state.config.preview_dir.clone()),
        )
        .layer(from_fn(api::middleware::metrics::metrics_middleware))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(axum::extract::DefaultBodyLimit::max(
            state.config.max_file_size,
        ))
        .with_state(state)
}
