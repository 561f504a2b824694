use crate::AppState;
use crate::services::storage::{StorageArea, StorageService};
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub incoming: String,
    pub output: String,
    pub preview: String,
    pub version: String,
}

async fn area_status(storage: &StorageService, area: StorageArea) -> String {
    if storage.ensure(area).await.is_ok() {
        "ready".to_string()
    } else {
        "unavailable".to_string()
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "System health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        incoming: area_status(&state.storage, StorageArea::Incoming).await,
        output: area_status(&state.storage, StorageArea::Output).await,
        preview: area_status(&state.storage, StorageArea::Preview).await,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
