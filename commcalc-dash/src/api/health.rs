//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use commcalc_common::report::schema::ReportVariant;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    /// Whether report and calculator endpoints require the password
    pub password_required: bool,
    /// Report variant used when a request names none
    pub default_variant: ReportVariant,
}

/// GET /health
///
/// Does NOT require authentication.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        module: "commcalc-dash",
        version: env!("CARGO_PKG_VERSION"),
        password_required: state.gate.is_enabled(),
        default_variant: state.config.pipeline.variant,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
