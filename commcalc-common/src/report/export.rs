//! Table rendering and CSV export
//!
//! The same column layout serves two presentations: formatted cells for
//! people (currency, percentages) and plain numbers for CSV files that are
//! meant to be re-imported.

use serde::Serialize;

use super::aggregate::{AggregateRecord, SummaryTable};
use super::format::{format_count, format_currency, format_percent};
use super::scoring::{round2, Metric, ScoreRecord};
use crate::{Error, Result};

/// Summary table columns
pub const SUMMARY_COLUMNS: [&str; 15] = [
    "Employee",
    "News",
    "Upgrades",
    "TotalBoxes",
    "Ratio",
    "SmtGA",
    "PerksRate",
    "VMP",
    "GPPerUnit",
    "GrossProfit",
    "SmbGA",
    "PremiumUnlimitedRate",
    "CombinedLineCount",
    "VZPH",
    "VerizonVisa",
];

/// How cell values are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    /// Plain numbers (2 decimal places at most)
    Plain,
    /// Currency and percent decorations
    Formatted,
}

/// Headers and string cells ready for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

fn plain(value: f64) -> String {
    format!("{}", round2(value))
}

fn summary_cells(record: &AggregateRecord, presentation: Presentation) -> Vec<String> {
    let m = &record.metrics;
    let (currency, percent): (fn(f64) -> String, fn(f64) -> String) = match presentation {
        Presentation::Plain => (plain, plain),
        Presentation::Formatted => (format_currency, format_percent),
    };
    let count: fn(f64) -> String = match presentation {
        Presentation::Plain => plain,
        Presentation::Formatted => format_count,
    };

    vec![
        record.employee.clone(),
        count(m.news),
        count(m.upgrades),
        count(record.total_boxes),
        count(record.ratio),
        count(m.smt_ga),
        percent(m.perks_rate),
        percent(m.vmp),
        currency(record.gp_per_unit),
        currency(m.gross_profit),
        count(m.smb_ga),
        percent(m.premium_unlimited_rate),
        count(record.combined_line_count),
        count(m.vzph),
        count(m.verizon_visa),
    ]
}

/// Render employee rows followed by TOTAL
pub fn render_summary(table: &SummaryTable, presentation: Presentation) -> RenderedTable {
    RenderedTable {
        columns: SUMMARY_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows: table
            .iter_with_total()
            .map(|r| summary_cells(r, presentation))
            .collect(),
    }
}

/// Scorecard column headers
pub fn scorecard_columns() -> Vec<String> {
    let mut columns = vec!["Employee".to_string()];
    columns.extend(Metric::ALL.iter().map(|m| format!("Score {}", m.name())));
    columns.extend(
        ["Points", "CommissionRate", "CommissionEarned"]
            .iter()
            .map(|c| c.to_string()),
    );
    columns
}

/// Render scorecard rows
pub fn render_scorecard(scores: &[ScoreRecord], presentation: Presentation) -> RenderedTable {
    let rows = scores
        .iter()
        .map(|s| {
            let mut cells = vec![s.employee.clone()];
            cells.extend(s.tiers.iter().map(|t| t.tier.to_string()));
            cells.push(plain(s.points));
            match presentation {
                Presentation::Plain => {
                    cells.push(s.commission_rate.percent().to_string());
                    cells.push(plain(s.commission_earned));
                }
                Presentation::Formatted => {
                    cells.push(format!("{}%", s.commission_rate.percent()));
                    cells.push(format_currency(s.commission_earned));
                }
            }
            cells
        })
        .collect();

    RenderedTable {
        columns: scorecard_columns(),
        rows,
    }
}

/// Write a rendered table as CSV bytes
pub fn to_csv(table: &RenderedTable) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))
}

/// Summary table (with TOTAL) as re-importable CSV
pub fn summary_csv(table: &SummaryTable) -> Result<Vec<u8>> {
    to_csv(&render_summary(table, Presentation::Plain))
}

/// Scorecard as re-importable CSV
pub fn scorecard_csv(scores: &[ScoreRecord]) -> Result<Vec<u8>> {
    to_csv(&render_scorecard(scores, Presentation::Plain))
}
