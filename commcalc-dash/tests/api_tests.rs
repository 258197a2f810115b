//! Integration tests for commcalc-dash API endpoints
//!
//! Tests cover:
//! - Health and build info endpoints (no auth required)
//! - Password gate on protected routes
//! - Report generation, employee listing and CSV exports
//! - Flat commission calculator and GP auto-population
//! - Body size limit

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use commcalc_common::api::hash_password;
use commcalc_common::config::TomlConfig;
use commcalc_dash::{build_router, AppState, MAX_BODY_BYTES};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot` method

const HEADER: &str = "Employee Full Name,GA,Upgrades,SMT GA,SMB GA,VZ Perks Rate,\
(RQ) Consumer SMT Prem Unlim %,VMP Take Rate,GP,SMT Qty,VZ FWA GA,VZ FIOS GA";

/// Test helper: upload with three rows, two of them for the same person
fn sample_upload() -> String {
    format!(
        "{HEADER}\n\
         Josh Ordonez,2,1,1,0,50%,60%,70%,\"$1,000.00\",4,0,0\n\
         Thimotee Wiguen,1,1,1,0,50%,60%,70%,$500.00,5,0,0\n\
         ordonez josh,1,1,1,0,50%,60%,70%,\"$2,000.00\",6,0,0\n"
    )
}

/// Test helper: app with the password gate disabled
fn setup_app() -> axum::Router {
    build_router(AppState::new(TomlConfig::default()).unwrap())
}

/// Test helper: app with a password and a configured GP pattern
fn setup_gated_app(password: &str) -> axum::Router {
    let mut config = TomlConfig::default();
    config.auth.password_sha256 = hash_password(password);
    config.calculator.employee_pattern = Some(r"\b(Josue|Josh) Ordonez\b".to_string());
    build_router(AppState::new(config).unwrap())
}

fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn upload_request(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .body(body.into())
        .unwrap()
}

fn json_request(uri: &str, value: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(value.to_string()))
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn extract_text(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    String::from_utf8(bytes.to_vec()).expect("Should be UTF-8")
}

// =============================================================================
// Public Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let app = setup_gated_app("s3cret");

    let response = app.oneshot(test_request("GET", "/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "commcalc-dash");
    assert!(body["version"].is_string());
    assert_eq!(body["password_required"], true);
    assert_eq!(body["default_variant"], "full");
}

#[tokio::test]
async fn test_health_reports_open_gate() {
    let app = setup_app();

    let response = app.oneshot(test_request("GET", "/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["password_required"], false);
}

#[tokio::test]
async fn test_buildinfo_endpoint() {
    let app = setup_gated_app("s3cret");

    let response = app.oneshot(test_request("GET", "/api/buildinfo")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert!(body["git_hash"].is_string());
    assert!(body["build_profile"].is_string());
}

#[tokio::test]
async fn test_ui_is_served() {
    let app = setup_app();

    let response = app.clone().oneshot(test_request("GET", "/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(extract_text(response.into_body()).await.contains("CommCalc"));

    let response = app.oneshot(test_request("GET", "/static/app.js")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/javascript"
    );
}

// =============================================================================
// Password Gate Tests
// =============================================================================

#[tokio::test]
async fn test_missing_password_rejected() {
    let app = setup_gated_app("s3cret");

    let response = app
        .oneshot(upload_request("/api/report", sample_upload()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Password required");
}

#[tokio::test]
async fn test_wrong_password_rejected() {
    let app = setup_gated_app("s3cret");
    let mut request = upload_request("/api/report", sample_upload());
    request
        .headers_mut()
        .insert("x-commcalc-password", "guess".parse().unwrap());

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_correct_password_accepted() {
    let app = setup_gated_app("s3cret");
    let mut request = upload_request("/api/report", sample_upload());
    request
        .headers_mut()
        .insert("x-commcalc-password", "s3cret".parse().unwrap());

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Report Tests
// =============================================================================

#[tokio::test]
async fn test_report_merges_and_totals() {
    let app = setup_app();

    let response = app
        .oneshot(upload_request("/api/report?format=csv", sample_upload()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;

    let rows = body["display"]["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0][0], "Josh Ordonez");
    assert_eq!(rows[0][9], "$3,000.00");
    assert_eq!(rows[2][0], "TOTAL");
    assert_eq!(rows[2][9], "$3,500.00");

    assert_eq!(body["gp_summary"]["display_gp"], 3500.0);
    assert_eq!(body["scorecard"]["rows"].as_array().unwrap().len(), 2);
    assert_eq!(body["goals"][0]["employee"], "Josh Ordonez");
    assert_eq!(body["goals"][0]["ratio"], true);
}

#[tokio::test]
async fn test_report_employee_selection() {
    let app = setup_app();

    let response = app
        .oneshot(upload_request(
            "/api/report?employees=Wiguen%20Thimotee",
            sample_upload(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    let rows = body["display"]["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][0], "Thimotee Wiguen");
}

#[tokio::test]
async fn test_report_unknown_selection_is_422() {
    let app = setup_app();

    let response = app
        .oneshot(upload_request("/api/report?employees=Nobody%20Here", sample_upload()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = extract_json(response.into_body()).await;
    assert!(body["error"].as_str().unwrap().starts_with("No employees selected"));
}

#[tokio::test]
async fn test_report_missing_column_is_422() {
    let app = setup_app();
    let upload = "Employee Full Name,GA\nJosh Ordonez,1\n";

    let response = app
        .oneshot(upload_request("/api/report", upload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = extract_json(response.into_body()).await;
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("VMP Take Rate (VMP)"));
    assert!(message.contains("GP (GrossProfit)"));
}

#[tokio::test]
async fn test_report_rejects_empty_upload_and_bad_variant() {
    let app = setup_app();

    let response = app
        .clone()
        .oneshot(upload_request("/api/report", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(upload_request("/api/report?variant=huge", sample_upload()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_employees() {
    let app = setup_app();

    let response = app
        .oneshot(upload_request("/api/report/employees", sample_upload()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["employees"], json!(["Josh Ordonez", "Thimotee Wiguen"]));
}

#[tokio::test]
async fn test_summary_csv_export() {
    let app = setup_app();

    let response = app
        .oneshot(upload_request("/api/report/summary.csv", sample_upload()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("summary.csv"));
    let text = extract_text(response.into_body()).await;
    let mut lines = text.lines();
    assert!(lines.next().unwrap().starts_with("Employee,News,Upgrades,TotalBoxes"));
    assert!(lines.next().unwrap().starts_with("Josh Ordonez,3,2,5,1.5,"));
    assert!(text.contains("TOTAL,"));
    assert!(!text.contains('$'));
}

#[tokio::test]
async fn test_scorecard_csv_export() {
    let app = setup_app();

    let response = app
        .oneshot(upload_request("/api/report/scorecard.csv", sample_upload()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let text = extract_text(response.into_body()).await;
    assert!(text.lines().next().unwrap().ends_with("Points,CommissionRate,CommissionEarned"));
    assert_eq!(text.lines().count(), 3);
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let app = setup_app();
    let upload = vec![b'a'; MAX_BODY_BYTES + 1];

    let response = app
        .oneshot(upload_request("/api/report", upload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

// =============================================================================
// Calculator Tests
// =============================================================================

#[tokio::test]
async fn test_flat_calculator() {
    let app = setup_app();

    let response = app
        .oneshot(json_request(
            "/api/calculator",
            json!({"gross_profit": 10000.0, "deductions": 0.0}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert!((body["commission_subtotal"].as_f64().unwrap() - 1476.0).abs() < 1e-9);
    assert!((body["commission_earned"].as_f64().unwrap() - 2276.0).abs() < 1e-9);
    assert!(body["due_date"].is_string());
    assert!(body["breakdown"]
        .as_str()
        .unwrap()
        .starts_with("Commission Earned: $2,276.00"));
}

#[tokio::test]
async fn test_flat_calculator_requires_deduction_reason() {
    let app = setup_app();

    let response = app
        .oneshot(json_request(
            "/api/calculator",
            json!({"gross_profit": 10000.0, "deductions": 25.0}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "A reason is required for deductions of $25.00");
}

#[tokio::test]
async fn test_gp_from_upload_uses_configured_pattern() {
    let app = setup_gated_app("s3cret");
    let mut request = upload_request("/api/calculator/gp", sample_upload());
    request
        .headers_mut()
        .insert("x-commcalc-password", "s3cret".parse().unwrap());

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["gross_profit"], 3000.0);
}

#[tokio::test]
async fn test_gp_from_upload_no_match_is_null() {
    let app = setup_app();

    let response = app
        .oneshot(upload_request(
            "/api/calculator/gp?employee=Nobody",
            sample_upload(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert!(body["gross_profit"].is_null());
}

#[tokio::test]
async fn test_gp_without_pattern_is_400() {
    let app = setup_app();

    let response = app
        .oneshot(upload_request("/api/calculator/gp", sample_upload()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
