//! One configurable report pipeline
//!
//! normalize → select → coerce → aggregate (display and commission views)
//! → score. Every stage produces a new table; a fatal error at any stage
//! returns before anything downstream is built, so no partial output escapes.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::aggregate::{build_views, AggregateOptions, ExclusionScope, GoalFlags, SummaryTable};
use super::coerce::{coerce, CoerceOptions};
use super::employee::{is_placeholder, EmployeeKey, Selection};
use super::schema::{normalize, Field, ReportVariant};
use super::scoring::{ScoreRecord, Scorer, TierFloor};
use crate::ingest::RawTable;
use crate::{Error, Result};

fn default_normalize_fractional_percents() -> bool {
    true
}

fn default_spreadsheet_header_row() -> usize {
    1
}

/// Pipeline switches (`[pipeline]` in the TOML config)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub variant: ReportVariant,

    #[serde(default)]
    pub tier_floor: TierFloor,

    /// Multiply percent values below 1 by 100
    #[serde(default = "default_normalize_fractional_percents")]
    pub normalize_fractional_percents: bool,

    /// Employees left out of the commission view
    #[serde(default)]
    pub excluded_employees: Vec<String>,

    #[serde(default)]
    pub exclusion_scope: ExclusionScope,

    #[serde(default)]
    pub drop_inactive: bool,

    /// 0-based row holding the real header in spreadsheet uploads
    #[serde(default = "default_spreadsheet_header_row")]
    pub spreadsheet_header_row: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            variant: ReportVariant::default(),
            tier_floor: TierFloor::default(),
            normalize_fractional_percents: default_normalize_fractional_percents(),
            excluded_employees: Vec::new(),
            exclusion_scope: ExclusionScope::default(),
            drop_inactive: false,
            spreadsheet_header_row: default_spreadsheet_header_row(),
        }
    }
}

/// GP totals for the run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GpSummary {
    /// GP of every displayed employee
    pub display_gp: f64,
    /// GP that commission is paid on
    pub commission_gp: f64,
    /// Commission owed across the scorecard
    pub commission_earned: f64,
}

/// Everything one run produces
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportOutput {
    pub display: SummaryTable,
    pub commission: SummaryTable,
    pub scorecard: Vec<ScoreRecord>,
}

impl ReportOutput {
    pub fn gp_summary(&self) -> GpSummary {
        GpSummary {
            display_gp: self.display.gross_profit(),
            commission_gp: self.commission.gross_profit(),
            commission_earned: self.scorecard.iter().map(|s| s.commission_earned).sum(),
        }
    }

    /// Goal flags for the display rows, keyed by employee
    pub fn goals(&self) -> Vec<(String, GoalFlags)> {
        self.display
            .iter_with_total()
            .map(|r| (r.employee.clone(), r.goals()))
            .collect()
    }
}

/// Run the whole pipeline on one uploaded table
pub fn run(table: &RawTable, config: &PipelineConfig, selection: &Selection) -> Result<ReportOutput> {
    let columns = normalize(&table.headers, config.variant)?;

    let records: Vec<_> = coerce(
        table,
        &columns,
        CoerceOptions {
            normalize_fractional_percents: config.normalize_fractional_percents,
        },
    )
    .into_iter()
    .filter(|r| selection.includes(&r.employee))
    .collect();

    if records.is_empty() {
        let reason = match selection {
            Selection::Default => "the upload has no employee rows".to_string(),
            Selection::Only(names) => format!("none of {} found in the upload", names.join(", ")),
        };
        return Err(Error::EmptySelection(reason));
    }

    let views = build_views(
        &records,
        AggregateOptions {
            excluded_employees: &config.excluded_employees,
            exclusion_scope: config.exclusion_scope,
            drop_inactive: config.drop_inactive,
        },
    );
    if views.display.rows.is_empty() {
        return Err(Error::EmptySelection(
            "every selected employee was dropped as inactive or excluded".to_string(),
        ));
    }
    let scorecard = Scorer::new(config.tier_floor).score_table(&views.commission);

    info!(
        rows = table.rows.len(),
        retained = records.len(),
        employees = views.display.rows.len(),
        scored = scorecard.len(),
        "Report pipeline complete"
    );

    Ok(ReportOutput {
        display: views.display,
        commission: views.commission,
        scorecard,
    })
}

/// Distinct canonical employee names in an upload, for building a selection
pub fn available_employees(table: &RawTable, variant: ReportVariant) -> Result<Vec<String>> {
    let columns = normalize(&table.headers, variant)?;
    let Some(col) = columns.index(Field::Employee) else {
        return Ok(Vec::new());
    };

    let mut names: Vec<String> = (0..table.rows.len())
        .map(|row| table.cell(row, col).as_text().trim().to_string())
        .filter(|name| !is_placeholder(name) && Selection::Default.includes(name))
        .map(|name| EmployeeKey::canonicalize(&name).to_string())
        .collect();
    names.sort();
    names.dedup();
    Ok(names)
}
