use axum::{extract::State, Json};
use serde::Serialize;

use crate::api::state::AppState;

pub const LIVENESS_MESSAGE: &str = "Singularity Bot is live";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: String,
    pub version: &'static str,
}

/// Health check endpoint
///
/// GET /
/// GET /health
///
/// Never touches the pipeline.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: LIVENESS_MESSAGE,
        service: state.service_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
    })
}
