//! Report API: upload an export, get summary and scorecard back
//!
//! The request body is the raw upload (CSV or workbook bytes). The pipeline
//! runs synchronously inside the handler; nothing is kept between requests.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use commcalc_common::ingest::{read_table, InputFormat, RawTable};
use commcalc_common::report::aggregate::GoalFlags;
use commcalc_common::report::employee::Selection;
use commcalc_common::report::export::{
    render_scorecard, render_summary, scorecard_csv, summary_csv, Presentation, RenderedTable,
};
use commcalc_common::report::pipeline::{available_employees, GpSummary};
use commcalc_common::report::schema::ReportVariant;
use commcalc_common::report::scoring::Metric;
use commcalc_common::report::{run, PipelineConfig, ReportOutput};
use commcalc_common::Error;

use crate::AppState;

/// Query parameters shared by the report endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    /// `csv` or a workbook extension; sniffed from the bytes when absent
    pub format: Option<String>,

    /// Comma-separated employee names; blank means the default selection
    pub employees: Option<String>,

    /// `compact` or `full`; overrides the configured variant
    pub variant: Option<String>,
}

/// Goal highlights for one display row
#[derive(Debug, Serialize)]
pub struct GoalRow {
    pub employee: String,
    #[serde(flatten)]
    pub goals: GoalFlags,
}

/// Scorecard diagnostic: metrics dragging an employee's points down
#[derive(Debug, Serialize)]
pub struct BelowAverage {
    pub employee: String,
    pub metrics: Vec<&'static str>,
}

/// POST /api/report response
#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub display: RenderedTable,
    pub commission: RenderedTable,
    pub scorecard: RenderedTable,
    pub goals: Vec<GoalRow>,
    pub below_average: Vec<BelowAverage>,
    pub gp_summary: GpSummary,
}

/// POST /api/report/employees response
#[derive(Debug, Serialize)]
pub struct EmployeesResponse {
    pub employees: Vec<String>,
}

/// Resolve the effective pipeline config for a request
fn pipeline_config(state: &AppState, query: &ReportQuery) -> Result<PipelineConfig, ReportError> {
    let mut config = state.config.pipeline.clone();
    if let Some(name) = query.variant.as_deref().filter(|v| !v.trim().is_empty()) {
        config.variant = ReportVariant::from_name(name)
            .ok_or_else(|| ReportError::BadQuery(format!("Unknown report variant: {}", name)))?;
    }
    Ok(config)
}

/// Parse the upload body into a raw table
pub(crate) fn parse_upload(
    body: Bytes,
    format: Option<&str>,
    header_row: usize,
) -> Result<RawTable, ReportError> {
    if body.is_empty() {
        return Err(ReportError::EmptyUpload);
    }
    let format = match format.filter(|f| !f.trim().is_empty()) {
        Some(name) => InputFormat::from_name(name)
            .ok_or_else(|| ReportError::BadQuery(format!("Unsupported file format: {}", name)))?,
        None => InputFormat::sniff(&body),
    };
    Ok(read_table(body.to_vec(), format, header_row)?)
}

fn run_report(state: &AppState, query: &ReportQuery, body: Bytes) -> Result<ReportOutput, ReportError> {
    let config = pipeline_config(state, query)?;
    let table = parse_upload(body, query.format.as_deref(), config.spreadsheet_header_row)?;
    let selection = Selection::from_list(query.employees.as_deref());
    Ok(run(&table, &config, &selection)?)
}

/// POST /api/report
///
/// Returns formatted display and commission tables, the scorecard, goal
/// highlights and the GP summary.
pub async fn create_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
    body: Bytes,
) -> Result<Json<ReportResponse>, ReportError> {
    let output = run_report(&state, &query, body)?;

    let goals = output
        .goals()
        .into_iter()
        .map(|(employee, goals)| GoalRow { employee, goals })
        .collect();
    let below_average = output
        .scorecard
        .iter()
        .map(|s| BelowAverage {
            employee: s.employee.clone(),
            metrics: s.below_average_metrics().into_iter().map(Metric::name).collect(),
        })
        .collect();

    info!(employees = output.display.rows.len(), "Report generated");

    Ok(Json(ReportResponse {
        display: render_summary(&output.display, Presentation::Formatted),
        commission: render_summary(&output.commission, Presentation::Formatted),
        scorecard: render_scorecard(&output.scorecard, Presentation::Formatted),
        goals,
        below_average,
        gp_summary: output.gp_summary(),
    }))
}

/// POST /api/report/employees
///
/// Distinct employee names in the upload, for building a selection.
pub async fn list_employees(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
    body: Bytes,
) -> Result<Json<EmployeesResponse>, ReportError> {
    let config = pipeline_config(&state, &query)?;
    let table = parse_upload(body, query.format.as_deref(), config.spreadsheet_header_row)?;
    let employees = available_employees(&table, config.variant)?;
    Ok(Json(EmployeesResponse { employees }))
}

fn csv_attachment(filename: &str, bytes: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// POST /api/report/summary.csv
///
/// Display view with TOTAL, plain numbers.
pub async fn export_summary_csv(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
    body: Bytes,
) -> Result<Response, ReportError> {
    let output = run_report(&state, &query, body)?;
    Ok(csv_attachment("summary.csv", summary_csv(&output.display)?))
}

/// POST /api/report/scorecard.csv
pub async fn export_scorecard_csv(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
    body: Bytes,
) -> Result<Response, ReportError> {
    let output = run_report(&state, &query, body)?;
    Ok(csv_attachment("scorecard.csv", scorecard_csv(&output.scorecard)?))
}

/// HTTP status for a pipeline error
pub(crate) fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::MissingColumns(_) | Error::EmptySelection(_) | Error::MissingDeductionReason(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        Error::Ingest(_) | Error::Csv(_) | Error::Spreadsheet(_) | Error::InvalidInput(_) => {
            StatusCode::BAD_REQUEST
        }
        Error::Io(_) | Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Report error types for HTTP responses
#[derive(Debug)]
pub enum ReportError {
    EmptyUpload,
    BadQuery(String),
    Pipeline(Error),
}

impl From<Error> for ReportError {
    fn from(error: Error) -> Self {
        ReportError::Pipeline(error)
    }
}

impl IntoResponse for ReportError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ReportError::EmptyUpload => (StatusCode::BAD_REQUEST, "Empty upload".to_string()),
            ReportError::BadQuery(msg) => (StatusCode::BAD_REQUEST, msg),
            ReportError::Pipeline(e) => {
                let status = status_for(&e);
                if status.is_server_error() {
                    warn!("Report failed: {}", e);
                }
                (status, e.to_string())
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
