//! Per-employee aggregation, derived ratios and totals
//!
//! Count-like fields are summed, rate-like fields (perks, VMP, premium
//! unlimited) are averaged. Derived fields are always computed from the
//! aggregated sums, never averaged from row-level ratios. Every division is
//! guarded: a zero denominator yields 0.
//!
//! Two views are produced from one set of aggregates: the display view and
//! the commission view. The configured exclusion list is removed from the
//! commission view, and from the display view too when
//! [`ExclusionScope::Everywhere`] is selected.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::coerce::{CanonicalRecord, Metrics};
use super::employee::{EmployeeKey, TOTAL_LABEL};

/// Highlight threshold for new-to-upgrade ratio
pub const RATIO_GOAL: f64 = 1.5;
/// Highlight threshold for gross profit per smartphone unit
pub const GP_PER_UNIT_GOAL: f64 = 100.0;
/// Highlight threshold for perks attach rate (percent)
pub const PERKS_GOAL: f64 = 50.0;

/// Division guarded against zero denominators and non-finite results
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let result = numerator / denominator;
    if result.is_finite() {
        result
    } else {
        0.0
    }
}

/// One row per employee (or the synthetic TOTAL)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRecord {
    /// Canonical employee key, or `TOTAL`
    pub employee: String,
    pub is_total: bool,
    /// Number of source rows (or employees, for TOTAL) that were reduced
    pub source_rows: usize,
    pub metrics: Metrics,
    pub total_boxes: f64,
    pub ratio: f64,
    pub gp_per_unit: f64,
    pub combined_line_count: f64,
}

impl AggregateRecord {
    fn from_metrics(employee: String, source_rows: usize, metrics: Metrics) -> Self {
        Self {
            employee,
            is_total: false,
            source_rows,
            total_boxes: metrics.news + metrics.upgrades,
            ratio: safe_div(metrics.news, metrics.upgrades),
            gp_per_unit: safe_div(metrics.gross_profit, metrics.unit_qty),
            combined_line_count: metrics.line_a + metrics.line_b,
            metrics,
        }
    }

    /// Which display goals this row meets
    pub fn goals(&self) -> GoalFlags {
        GoalFlags {
            ratio: self.ratio >= RATIO_GOAL,
            gp_per_unit: self.gp_per_unit >= GP_PER_UNIT_GOAL,
            perks: self.metrics.perks_rate >= PERKS_GOAL,
        }
    }

    fn is_inactive(&self) -> bool {
        self.metrics.is_all_zero()
    }
}

/// Display highlight flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GoalFlags {
    pub ratio: bool,
    pub gp_per_unit: bool,
    pub perks: bool,
}

/// Group records by employee key and reduce each group
///
/// Output is sorted by employee key.
pub fn aggregate(records: &[CanonicalRecord]) -> Vec<AggregateRecord> {
    let mut groups: BTreeMap<&EmployeeKey, (usize, Metrics)> = BTreeMap::new();

    for record in records {
        let (count, sum) = groups.entry(&record.key).or_default();
        *count += 1;
        add_counts(sum, &record.metrics);
        sum.perks_rate += record.metrics.perks_rate;
        sum.premium_unlimited_rate += record.metrics.premium_unlimited_rate;
        sum.vmp += record.metrics.vmp;
    }

    groups
        .into_iter()
        .map(|(key, (count, mut metrics))| {
            let n = count as f64;
            metrics.perks_rate = safe_div(metrics.perks_rate, n);
            metrics.premium_unlimited_rate = safe_div(metrics.premium_unlimited_rate, n);
            metrics.vmp = safe_div(metrics.vmp, n);
            AggregateRecord::from_metrics(key.to_string(), count, metrics)
        })
        .collect()
}

fn add_counts(sum: &mut Metrics, m: &Metrics) {
    sum.news += m.news;
    sum.upgrades += m.upgrades;
    sum.smt_ga += m.smt_ga;
    sum.smb_ga += m.smb_ga;
    sum.gross_profit += m.gross_profit;
    sum.unit_qty += m.unit_qty;
    sum.line_a += m.line_a;
    sum.line_b += m.line_b;
    sum.vzph += m.vzph;
    sum.verizon_visa += m.verizon_visa;
}

/// Synthetic TOTAL over already-aggregated rows
///
/// Counts are summed and rates averaged across employees. GP per unit is
/// recomputed from total GP and total units; the ratio is the mean of the
/// per-employee ratios. `None` for an empty table.
pub fn totals(rows: &[AggregateRecord]) -> Option<AggregateRecord> {
    if rows.is_empty() {
        return None;
    }
    let n = rows.len() as f64;

    let mut metrics = Metrics::default();
    let mut ratio_sum = 0.0;
    for row in rows {
        add_counts(&mut metrics, &row.metrics);
        metrics.perks_rate += row.metrics.perks_rate;
        metrics.premium_unlimited_rate += row.metrics.premium_unlimited_rate;
        metrics.vmp += row.metrics.vmp;
        ratio_sum += row.ratio;
    }
    metrics.perks_rate /= n;
    metrics.premium_unlimited_rate /= n;
    metrics.vmp /= n;

    let mut total = AggregateRecord::from_metrics(TOTAL_LABEL.to_string(), rows.len(), metrics);
    total.is_total = true;
    total.ratio = ratio_sum / n;
    Some(total)
}

/// Which views the configured exclusion list is removed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionScope {
    /// Excluded employees still appear in the display view and its totals
    #[default]
    CommissionOnly,
    /// Excluded employees are removed from both views
    Everywhere,
}

/// Aggregation switches taken from the pipeline configuration
#[derive(Debug, Clone, Copy)]
pub struct AggregateOptions<'a> {
    pub excluded_employees: &'a [String],
    pub exclusion_scope: ExclusionScope,
    /// Remove employees whose every metric is zero before totals
    pub drop_inactive: bool,
}

/// Employee rows plus their TOTAL
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryTable {
    pub rows: Vec<AggregateRecord>,
    pub total: Option<AggregateRecord>,
}

impl SummaryTable {
    pub fn new(rows: Vec<AggregateRecord>) -> Self {
        let total = totals(&rows);
        Self { rows, total }
    }

    /// Total gross profit across employee rows
    pub fn gross_profit(&self) -> f64 {
        self.rows.iter().map(|r| r.metrics.gross_profit).sum()
    }

    /// Employee rows followed by TOTAL
    pub fn iter_with_total(&self) -> impl Iterator<Item = &AggregateRecord> {
        self.rows.iter().chain(self.total.iter())
    }
}

/// The display and commission views of one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateViews {
    pub display: SummaryTable,
    pub commission: SummaryTable,
}

/// Aggregate records and split them into display and commission views
pub fn build_views(records: &[CanonicalRecord], options: AggregateOptions<'_>) -> AggregateViews {
    let mut rows = aggregate(records);
    if options.drop_inactive {
        let before = rows.len();
        rows.retain(|r| !r.is_inactive());
        debug!(removed = before - rows.len(), "Dropped inactive employees");
    }

    let (excluded, kept): (Vec<_>, Vec<_>) = rows.iter().cloned().partition(|r| {
        EmployeeKey::canonicalize(&r.employee).is_listed(options.excluded_employees)
    });

    if !excluded.is_empty() {
        debug!(
            excluded = excluded.len(),
            scope = ?options.exclusion_scope,
            "Excluded employees from commission view"
        );
    }

    let display_rows = match options.exclusion_scope {
        ExclusionScope::CommissionOnly => rows,
        ExclusionScope::Everywhere => kept.clone(),
    };

    AggregateViews {
        display: SummaryTable::new(display_rows),
        commission: SummaryTable::new(kept),
    }
}
