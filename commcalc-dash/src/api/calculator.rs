//! Flat commission calculator API

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use commcalc_common::report::flat::{
    calculate, employee_pattern, second_friday, sum_gross_profit_for, FlatCommission,
    FlatCommissionInput,
};
use commcalc_common::Error;

use super::report::{parse_upload, status_for, ReportError};
use crate::AppState;

/// POST /api/calculator response
#[derive(Debug, Serialize)]
pub struct CalculatorResponse {
    #[serde(flatten)]
    pub result: FlatCommission,
    pub due_date: NaiveDate,
    pub breakdown: String,
}

/// POST /api/calculator
///
/// Runs the flat formula on a hand-entered GP.
pub async fn flat_commission(
    Json(input): Json<FlatCommissionInput>,
) -> Result<Json<CalculatorResponse>, CalculatorError> {
    let result = calculate(&input)?;
    let due_date = second_friday(Local::now().date_naive());
    let breakdown = result.breakdown(due_date);

    Ok(Json(CalculatorResponse {
        result,
        due_date,
        breakdown,
    }))
}

/// Query parameters for GP auto-population
#[derive(Debug, Deserialize)]
pub struct GpQuery {
    /// Employee name regex; falls back to `[calculator] employee_pattern`
    pub employee: Option<String>,
    pub format: Option<String>,
}

/// POST /api/calculator/gp response
#[derive(Debug, Serialize)]
pub struct GpResponse {
    pub employee_pattern: String,
    /// `None` when no row matched
    pub gross_profit: Option<f64>,
}

/// POST /api/calculator/gp
///
/// Sums GP from the upload for the employee matching the pattern.
pub async fn gross_profit_for_employee(
    State(state): State<AppState>,
    Query(query): Query<GpQuery>,
    body: Bytes,
) -> Result<Json<GpResponse>, CalculatorError> {
    let pattern_text = query
        .employee
        .filter(|p| !p.trim().is_empty())
        .or_else(|| state.config.calculator.employee_pattern.clone())
        .ok_or(CalculatorError::NoPattern)?;
    let pattern = employee_pattern(&pattern_text)?;

    let table = parse_upload(
        body,
        query.format.as_deref(),
        state.config.pipeline.spreadsheet_header_row,
    )
    .map_err(CalculatorError::Upload)?;
    let gross_profit = sum_gross_profit_for(&table, &pattern)?;

    info!(pattern = %pattern_text, found = gross_profit.is_some(), "GP lookup");

    Ok(Json(GpResponse {
        employee_pattern: pattern_text,
        gross_profit,
    }))
}

/// Calculator error types for HTTP responses
#[derive(Debug)]
pub enum CalculatorError {
    NoPattern,
    Upload(ReportError),
    Calculation(Error),
}

impl From<Error> for CalculatorError {
    fn from(error: Error) -> Self {
        CalculatorError::Calculation(error)
    }
}

impl IntoResponse for CalculatorError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            CalculatorError::NoPattern => (
                StatusCode::BAD_REQUEST,
                "No employee pattern given or configured".to_string(),
            ),
            CalculatorError::Upload(e) => return e.into_response(),
            CalculatorError::Calculation(e) => (status_for(&e), e.to_string()),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
