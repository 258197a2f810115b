//! Field coercion: decorated export cells into finite numbers
//!
//! # Zero-fill policy
//!
//! Any numeric cell that cannot be parsed after stripping `$`, `,` and `%`
//! becomes `0.0`. Blank cells also become `0.0`. The report is always
//! completed; a bad cell never aborts a run. The number of zero-filled cells
//! is logged at `warn` level.
//!
//! Percent fields keep the percentage value ("56%" → 56.0). When fractional
//! percent normalization is enabled, a percent value below 1 is taken to be a
//! fraction exported by a spreadsheet and multiplied by 100.

use serde::Serialize;
use tracing::{debug, warn};

use super::employee::{is_placeholder, EmployeeKey};
use super::schema::{ColumnMap, Field};
use crate::ingest::{RawCell, RawTable};

/// Per-row (or aggregated) numeric values, keyed by canonical field
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Metrics {
    pub news: f64,
    pub upgrades: f64,
    pub smt_ga: f64,
    pub smb_ga: f64,
    pub perks_rate: f64,
    pub premium_unlimited_rate: f64,
    pub vmp: f64,
    pub gross_profit: f64,
    pub unit_qty: f64,
    pub line_a: f64,
    pub line_b: f64,
    pub vzph: f64,
    pub verizon_visa: f64,
}

impl Metrics {
    /// Value of a numeric field; `None` for [`Field::Employee`]
    pub fn value(&self, field: Field) -> Option<f64> {
        let v = match field {
            Field::Employee => return None,
            Field::News => self.news,
            Field::Upgrades => self.upgrades,
            Field::SmtGa => self.smt_ga,
            Field::SmbGa => self.smb_ga,
            Field::PerksRate => self.perks_rate,
            Field::PremiumUnlimitedRate => self.premium_unlimited_rate,
            Field::Vmp => self.vmp,
            Field::GrossProfit => self.gross_profit,
            Field::UnitQty => self.unit_qty,
            Field::LineA => self.line_a,
            Field::LineB => self.line_b,
            Field::Vzph => self.vzph,
            Field::VerizonVisa => self.verizon_visa,
        };
        Some(v)
    }

    fn slot(&mut self, field: Field) -> Option<&mut f64> {
        let slot = match field {
            Field::Employee => return None,
            Field::News => &mut self.news,
            Field::Upgrades => &mut self.upgrades,
            Field::SmtGa => &mut self.smt_ga,
            Field::SmbGa => &mut self.smb_ga,
            Field::PerksRate => &mut self.perks_rate,
            Field::PremiumUnlimitedRate => &mut self.premium_unlimited_rate,
            Field::Vmp => &mut self.vmp,
            Field::GrossProfit => &mut self.gross_profit,
            Field::UnitQty => &mut self.unit_qty,
            Field::LineA => &mut self.line_a,
            Field::LineB => &mut self.line_b,
            Field::Vzph => &mut self.vzph,
            Field::VerizonVisa => &mut self.verizon_visa,
        };
        Some(slot)
    }

    /// True when every numeric field is zero
    pub fn is_all_zero(&self) -> bool {
        Field::NUMERIC
            .iter()
            .all(|f| self.value(*f).unwrap_or_default() == 0.0)
    }
}

/// One export row after normalization and coercion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRecord {
    /// Employee name as exported (trimmed)
    pub employee: String,
    pub key: EmployeeKey,
    pub metrics: Metrics,
}

/// Coercion switches taken from the pipeline configuration
#[derive(Debug, Clone, Copy)]
pub struct CoerceOptions {
    pub normalize_fractional_percents: bool,
}

/// Parse a decorated cell; `None` when blank or unparseable
pub fn parse_number(cell: &RawCell) -> Option<f64> {
    match cell {
        RawCell::Empty => None,
        RawCell::Number(n) => Some(*n).filter(|n| n.is_finite()),
        RawCell::Text(s) => {
            let cleaned: String = s.chars().filter(|c| !matches!(c, '$' | ',' | '%')).collect();
            cleaned
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
        }
    }
}

/// Parse a decorated cell, substituting zero per the zero-fill policy
pub fn coerce_cell(cell: &RawCell) -> f64 {
    parse_number(cell).unwrap_or(0.0)
}

/// Percentages exported as fractions (0.56) become percentages (56.0)
pub fn normalize_fractional_percent(value: f64) -> f64 {
    if value < 1.0 {
        value * 100.0
    } else {
        value
    }
}

/// Coerce every retained row of the table into a [`CanonicalRecord`]
///
/// Rows whose employee is a placeholder (see [`is_placeholder`]) are dropped.
/// Fields absent from the column map (optional columns) read as zero.
pub fn coerce(table: &RawTable, columns: &ColumnMap, options: CoerceOptions) -> Vec<CanonicalRecord> {
    let employee_col = columns.index(Field::Employee);
    let mut records = Vec::with_capacity(table.rows.len());
    let mut dropped = 0usize;
    let mut zero_filled = 0usize;

    for row in 0..table.rows.len() {
        let employee = employee_col
            .map(|col| table.cell(row, col).as_text().trim().to_string())
            .unwrap_or_default();

        if is_placeholder(&employee) {
            dropped += 1;
            continue;
        }

        let mut metrics = Metrics::default();
        for field in Field::NUMERIC {
            let Some(col) = columns.index(field) else {
                continue;
            };
            let cell = table.cell(row, col);
            let mut value = match parse_number(cell) {
                Some(v) => v,
                None => {
                    if !cell.is_empty() {
                        zero_filled += 1;
                    }
                    0.0
                }
            };
            if options.normalize_fractional_percents && field.is_percent() {
                value = normalize_fractional_percent(value);
            }
            if let Some(slot) = metrics.slot(field) {
                *slot = value;
            }
        }

        records.push(CanonicalRecord {
            key: EmployeeKey::canonicalize(&employee),
            employee,
            metrics,
        });
    }

    if zero_filled > 0 {
        warn!(cells = zero_filled, "Unparseable numeric cells replaced with 0");
    }
    debug!(kept = records.len(), dropped, "Coerced report rows");
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::schema::{normalize, ReportVariant};

    const HEADERS: [&str; 12] = [
        "Employee Full Name",
        "GA",
        "Upgrades",
        "SMT GA",
        "SMB GA",
        "VZ Perks Rate",
        "(RQ) Consumer SMT Prem Unlim %",
        "VMP Take Rate",
        "GP",
        "SMT Qty",
        "VZ FWA GA",
        "VZ FIOS GA",
    ];

    fn table(rows: Vec<[&str; 12]>) -> RawTable {
        RawTable::from_strings(HEADERS, rows)
    }

    fn run(table: &RawTable, fractional: bool) -> Vec<CanonicalRecord> {
        let columns = normalize(&table.headers, ReportVariant::Full).unwrap();
        coerce(
            table,
            &columns,
            CoerceOptions {
                normalize_fractional_percents: fractional,
            },
        )
    }

    #[test]
    fn test_currency_and_percent_are_stripped() {
        assert_eq!(parse_number(&RawCell::from("$1,234.50")), Some(1234.5));
        assert_eq!(parse_number(&RawCell::from("56%")), Some(56.0));
        assert_eq!(parse_number(&RawCell::from(" 12 ")), Some(12.0));
        assert_eq!(parse_number(&RawCell::Number(3.0)), Some(3.0));
    }

    #[test]
    fn test_unparseable_becomes_zero() {
        assert_eq!(coerce_cell(&RawCell::from("n/a")), 0.0);
        assert_eq!(coerce_cell(&RawCell::from("NaN")), 0.0);
        assert_eq!(coerce_cell(&RawCell::from("inf")), 0.0);
        assert_eq!(coerce_cell(&RawCell::Empty), 0.0);
        assert_eq!(coerce_cell(&RawCell::Number(f64::NAN)), 0.0);
    }

    #[test]
    fn test_row_coercion_with_zero_fill() {
        let t = table(vec![[
            "Josh Ordonez", "4", "oops", "2", "1", "56%", "61%", "70%", "$2,500.00", "10", "1", "2",
        ]]);
        let records = run(&t, false);

        assert_eq!(records.len(), 1);
        let m = records[0].metrics;
        assert_eq!(m.news, 4.0);
        assert_eq!(m.upgrades, 0.0);
        assert_eq!(m.perks_rate, 56.0);
        assert_eq!(m.gross_profit, 2500.0);
        assert_eq!(m.unit_qty, 10.0);
        assert_eq!(m.vzph, 0.0);
    }

    #[test]
    fn test_placeholder_rows_are_dropped() {
        let t = table(vec![
            ["Rep Enc", "1", "1", "1", "1", "1", "1", "1", "1", "1", "1", "1"],
            ["unknown", "1", "1", "1", "1", "1", "1", "1", "1", "1", "1", "1"],
            ["Cher", "1", "1", "1", "1", "1", "1", "1", "1", "1", "1", "1"],
            ["ordonez josh", "1", "1", "1", "1", "1", "1", "1", "1", "1", "1", "1"],
        ]);
        let records = run(&t, false);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].employee, "ordonez josh");
        assert_eq!(records[0].key.as_str(), "Josh Ordonez");
    }

    #[test]
    fn test_fractional_percents_applied_to_all_three_rates() {
        let t = table(vec![[
            "Josh Ordonez", "0.5", "0", "0", "0", "0.56", "0.61", "0.7", "0", "0", "0", "0",
        ]]);

        let raw = run(&t, false)[0].metrics;
        assert_eq!(raw.perks_rate, 0.56);

        let normalized = run(&t, true)[0].metrics;
        assert!((normalized.perks_rate - 56.0).abs() < 1e-9);
        assert!((normalized.premium_unlimited_rate - 61.0).abs() < 1e-9);
        assert!((normalized.vmp - 70.0).abs() < 1e-9);
        // Counts are never rescaled
        assert_eq!(normalized.news, 0.5);
    }

    #[test]
    fn test_fractional_normalization_step() {
        assert_eq!(normalize_fractional_percent(0.0), 0.0);
        assert_eq!(normalize_fractional_percent(0.25), 25.0);
        assert_eq!(normalize_fractional_percent(1.0), 1.0);
        assert_eq!(normalize_fractional_percent(56.0), 56.0);
    }

    #[test]
    fn test_all_zero_metrics() {
        assert!(Metrics::default().is_all_zero());
        let m = Metrics {
            vzph: 1.0,
            ..Metrics::default()
        };
        assert!(!m.is_all_zero());
    }
}
