//! Authentication middleware for commcalc-dash
//!
//! Callers send the dashboard password in the `x-commcalc-password` header.
//! The check itself lives in `commcalc_common::api::auth`.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

use commcalc_common::api::AuthError as GateError;

use crate::AppState;

/// Request header carrying the plain password
pub const PASSWORD_HEADER: &str = "x-commcalc-password";

/// Authentication middleware
///
/// Returns 401 Unauthorized if the password is missing or wrong.
///
/// **Note:** This is applied to protected routes only.
/// Health endpoint (/health) does NOT use this middleware.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    // Blank configured hash disables the gate
    if !state.gate.is_enabled() {
        return Ok(next.run(request).await);
    }

    let password = match request.headers().get(PASSWORD_HEADER) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| AuthError::BadHeader)?
                .to_string(),
        ),
        None => None,
    };

    state.gate.check(password.as_deref()).map_err(|e| {
        warn!(path = %request.uri().path(), "Rejected request: {}", e);
        match e {
            GateError::MissingPassword => AuthError::MissingPassword,
            GateError::InvalidPassword | GateError::MalformedHash(_) => AuthError::InvalidPassword,
        }
    })?;

    Ok(next.run(request).await)
}

/// Authentication error types for HTTP responses
#[derive(Debug)]
pub enum AuthError {
    MissingPassword,
    InvalidPassword,
    BadHeader,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingPassword => (StatusCode::UNAUTHORIZED, "Password required"),
            AuthError::InvalidPassword => (StatusCode::UNAUTHORIZED, "Incorrect password"),
            AuthError::BadHeader => (
                StatusCode::BAD_REQUEST,
                "Password header is not valid text",
            ),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
