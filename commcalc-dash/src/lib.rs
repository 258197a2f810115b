//! commcalc-dash library - commission report dashboard
//!
//! Upload a sales export, get the per-employee summary and commission
//! scorecard back. Each request runs the pipeline once; the only shared state
//! is immutable configuration.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use commcalc_common::api::{AuthError, PasswordGate};
use commcalc_common::config::TomlConfig;
use tower_http::trace::TraceLayer;

pub mod api;

/// Largest accepted request body (uploads included)
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration (read-only)
    pub config: Arc<TomlConfig>,
    /// Password check for protected routes
    pub gate: PasswordGate,
}

impl AppState {
    /// Create application state; fails when the configured hash is malformed
    pub fn new(config: TomlConfig) -> Result<Self, AuthError> {
        let gate = PasswordGate::from_hash(&config.auth.password_sha256)?;
        Ok(Self {
            config: Arc::new(config),
            gate,
        })
    }
}

/// Build application router
///
/// Health, build info and the UI are public; report and calculator
/// endpoints sit behind the password gate.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    // Protected routes (require authentication)
    let protected = Router::new()
        .route("/api/report", post(api::create_report))
        .route("/api/report/employees", post(api::list_employees))
        .route("/api/report/summary.csv", post(api::export_summary_csv))
        .route("/api/report/scorecard.csv", post(api::export_scorecard_csv))
        .route("/api/calculator", post(api::flat_commission))
        .route("/api/calculator/gp", post(api::gross_profit_for_employee))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    // Public routes (no authentication)
    let public = Router::new()
        .route("/", get(api::serve_index))
        .route("/static/app.js", get(api::serve_app_js))
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes());

    // Combine routers
    Router::new()
        .merge(protected)
        .merge(public)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
