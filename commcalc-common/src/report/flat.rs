//! Flat commission calculator
//!
//! Independent of the point system. A single gross-profit figure has the
//! royalty fee taken off, the flat commission rate applied, the monthly bonus
//! added and deductions subtracted:
//!
//! ```text
//! subtotal = (GP - GP × 0.18) × 0.18
//! earned   = subtotal + 800 - deductions
//! ```
//!
//! GP can be entered by hand or summed from an upload for the employees whose
//! name matches a pattern.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::coerce::coerce_cell;
use super::employee::EmployeeKey;
use super::format::format_currency;
use super::schema::{trim_header, Field};
use crate::ingest::RawTable;
use crate::{Error, Result};

/// Royalty fee deducted from GP before commission
pub const ROYALTY_RATE: f64 = 0.18;
/// Commission rate applied to GP after royalty
pub const FLAT_COMMISSION_RATE: f64 = 0.18;
/// Fixed monthly bonus
pub const MONTHLY_BONUS: f64 = 800.0;

/// Calculator input
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlatCommissionInput {
    pub gross_profit: f64,
    #[serde(default)]
    pub deductions: f64,
    /// Required when `deductions > 0`
    #[serde(default)]
    pub deduction_reason: Option<String>,
}

/// Calculator result, every intermediate step included
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatCommission {
    pub gross_profit: f64,
    pub royalty_fee: f64,
    pub gp_after_royalty: f64,
    pub commission_subtotal: f64,
    pub bonus: f64,
    pub deductions: f64,
    pub commission_earned: f64,
    pub deduction_reason: Option<String>,
}

impl FlatCommission {
    /// Copyable step-by-step summary
    pub fn breakdown(&self, due: NaiveDate) -> String {
        let mut lines = vec![
            format!("Commission Earned: {}", format_currency(self.commission_earned)),
            String::new(),
            "Calculation Breakdown:".to_string(),
            format!("1. GP Earned = {}", format_currency(self.gross_profit)),
            format!(
                "2. 18% Royalty Fee (deducted from GP) = {}",
                format_currency(self.royalty_fee)
            ),
            format!(
                "3. GP after royalty deduction = {}",
                format_currency(self.gp_after_royalty)
            ),
            format!(
                "4. Commission Subtotal = 18% of result above = {}",
                format_currency(self.commission_subtotal)
            ),
            format!(
                "5. Add $800 bonus = {}",
                format_currency(self.commission_subtotal + self.bonus)
            ),
            format!("6. Subtract deductions ({})", format_currency(self.deductions)),
            format!(
                "7. Final Commission Earned = {}",
                format_currency(self.commission_earned)
            ),
        ];
        if let Some(reason) = &self.deduction_reason {
            lines.push(format!("Note: Deduction reason - {}", reason));
        }
        lines.push(String::new());
        lines.push(format!(
            "Due on second Friday of this month: {}",
            due.format("%B %d, %Y")
        ));
        lines.join("\n")
    }
}

/// Run the flat formula
///
/// Fails when an amount is not finite, when deductions are negative, or when
/// deductions are entered without a reason.
pub fn calculate(input: &FlatCommissionInput) -> Result<FlatCommission> {
    if !input.gross_profit.is_finite() || !input.deductions.is_finite() {
        return Err(Error::InvalidInput(
            "Please enter valid dollar amounts for GP and deductions".to_string(),
        ));
    }
    if input.deductions < 0.0 {
        return Err(Error::InvalidInput("Deductions cannot be negative".to_string()));
    }

    let reason = input
        .deduction_reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string);
    if input.deductions > 0.0 && reason.is_none() {
        return Err(Error::MissingDeductionReason(input.deductions));
    }

    let gp = input.gross_profit;
    let royalty_fee = gp * ROYALTY_RATE;
    let gp_after_royalty = gp - royalty_fee;
    let commission_subtotal = gp_after_royalty * FLAT_COMMISSION_RATE;
    let commission_earned = commission_subtotal + MONTHLY_BONUS - input.deductions;

    debug!(gp, commission_subtotal, commission_earned, "Flat commission calculated");

    Ok(FlatCommission {
        gross_profit: gp,
        royalty_fee,
        gp_after_royalty,
        commission_subtotal,
        bonus: MONTHLY_BONUS,
        deductions: input.deductions,
        commission_earned,
        deduction_reason: reason,
    })
}

/// Second Friday of the month containing `date` (the payout due date)
pub fn second_friday(date: NaiveDate) -> NaiveDate {
    let first = date - Duration::days(i64::from(date.day0()));
    let weekday = i64::from(first.weekday().num_days_from_monday());
    let friday = i64::from(Weekday::Fri.num_days_from_monday());
    let days_until_friday = (friday - weekday + 7) % 7;
    first + Duration::days(days_until_friday + 7)
}

/// Compile a case-insensitive employee name pattern
pub fn employee_pattern(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| Error::InvalidInput(format!("Invalid employee pattern: {}", e)))
}

/// Sum GP over the upload rows whose employee name matches `pattern`
///
/// A row matches when either its trimmed name or its canonical key does, so
/// "ordonez josh" is found by a pattern written as "Josh Ordonez".
/// `Ok(None)` when no row matches. GP cells follow the zero-fill policy.
pub fn sum_gross_profit_for(table: &RawTable, pattern: &Regex) -> Result<Option<f64>> {
    let find = |field: Field| {
        table.headers.iter().position(|h| {
            let header = trim_header(h);
            field.source_labels().iter().any(|label| *label == header)
        })
    };
    let (employee_col, gp_col) = match (find(Field::Employee), find(Field::GrossProfit)) {
        (Some(e), Some(g)) => (e, g),
        (employee, gp) => {
            let missing = [(employee, Field::Employee), (gp, Field::GrossProfit)]
                .into_iter()
                .filter(|(index, _)| index.is_none())
                .map(|(_, field)| field.describe_missing())
                .collect();
            return Err(Error::MissingColumns(missing));
        }
    };

    let mut matched = 0usize;
    let mut total = 0.0;
    for row in 0..table.rows.len() {
        let name = table.cell(row, employee_col).as_text();
        let name = name.trim();
        if pattern.is_match(name) || pattern.is_match(EmployeeKey::canonicalize(name).as_str()) {
            matched += 1;
            total += coerce_cell(table.cell(row, gp_col));
        }
    }

    if matched == 0 {
        info!(pattern = %pattern, "No rows matched employee pattern");
        return Ok(None);
    }
    info!(pattern = %pattern, rows = matched, total, "Summed GP for matched employee");
    Ok(Some(total))
}
