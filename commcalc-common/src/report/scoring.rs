//! Point-based commission scoring
//!
//! # Algorithm
//! 1. Each of eight aggregated metrics maps to a tier 0–4 through fixed
//!    thresholds (closed lower bounds: a value equal to a threshold earns
//!    that tier).
//! 2. Points = mean of the eight tiers, rounded to 2 decimals (ties to even).
//! 3. Points map to a commission rate: ≥3.5 → 30%, ≥2.5 → 25%, ≥1.5 → 20%,
//!    else 18%.
//! 4. Commission earned = gross profit × rate. The value stays numeric; it is
//!    formatted as currency only for display.
//!
//! # Tier floor
//! Values below the tier-2 threshold score the configured floor. The
//! historical scorecards always gave 1; the default gives 1 unless the metric
//! is exactly zero, which scores 0.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::aggregate::{AggregateRecord, SummaryTable};

/// Scored metrics, in scorecard column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Metric {
    SmtGa,
    Upgrades,
    PerksRate,
    Vmp,
    SmbGa,
    PremiumUnlimitedRate,
    CombinedLineCount,
    GrossProfit,
}

impl Metric {
    pub const ALL: [Metric; 8] = [
        Metric::SmtGa,
        Metric::Upgrades,
        Metric::PerksRate,
        Metric::Vmp,
        Metric::SmbGa,
        Metric::PremiumUnlimitedRate,
        Metric::CombinedLineCount,
        Metric::GrossProfit,
    ];

    /// Minimum values for tiers 4, 3 and 2
    pub fn thresholds(self) -> [f64; 3] {
        match self {
            Metric::SmtGa => [30.0, 25.0, 20.0],
            Metric::Upgrades => [65.0, 55.0, 45.0],
            Metric::PerksRate => [55.0, 40.0, 25.0],
            Metric::Vmp => [75.0, 65.0, 55.0],
            Metric::SmbGa => [7.0, 5.0, 3.0],
            Metric::PremiumUnlimitedRate => [65.0, 60.0, 55.0],
            Metric::CombinedLineCount => [7.0, 5.0, 3.0],
            Metric::GrossProfit => [40001.0, 30000.0, 18201.0],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Metric::SmtGa => "SmtGA",
            Metric::Upgrades => "Upgrades",
            Metric::PerksRate => "PerksRate",
            Metric::Vmp => "VMP",
            Metric::SmbGa => "SmbGA",
            Metric::PremiumUnlimitedRate => "PremiumUnlimitedRate",
            Metric::CombinedLineCount => "CombinedLineCount",
            Metric::GrossProfit => "GrossProfit",
        }
    }

    /// The aggregated value this metric scores
    pub fn value(self, record: &AggregateRecord) -> f64 {
        let m = &record.metrics;
        match self {
            Metric::SmtGa => m.smt_ga,
            Metric::Upgrades => m.upgrades,
            Metric::PerksRate => m.perks_rate,
            Metric::Vmp => m.vmp,
            Metric::SmbGa => m.smb_ga,
            Metric::PremiumUnlimitedRate => m.premium_unlimited_rate,
            Metric::CombinedLineCount => record.combined_line_count,
            Metric::GrossProfit => m.gross_profit,
        }
    }
}

/// Tier assigned below the tier-2 threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TierFloor {
    /// 1, except a metric of exactly zero scores 0
    #[default]
    OneUnlessZero,
    /// Always 1
    One,
    /// Always 0
    Zero,
}

/// Map a value onto tier 0–4
pub fn tier(value: f64, thresholds: [f64; 3], floor: TierFloor) -> u8 {
    let [tier4, tier3, tier2] = thresholds;
    if value >= tier4 {
        4
    } else if value >= tier3 {
        3
    } else if value >= tier2 {
        2
    } else {
        match floor {
            TierFloor::OneUnlessZero if value == 0.0 => 0,
            TierFloor::OneUnlessZero | TierFloor::One => 1,
            TierFloor::Zero => 0,
        }
    }
}

/// Commission bracket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CommissionRate {
    #[serde(rename = "18%")]
    Eighteen,
    #[serde(rename = "20%")]
    Twenty,
    #[serde(rename = "25%")]
    TwentyFive,
    #[serde(rename = "30%")]
    Thirty,
}

impl CommissionRate {
    /// Step function with closed lower bounds (ties go to the higher bracket)
    pub fn from_points(points: f64) -> Self {
        if points >= 3.5 {
            CommissionRate::Thirty
        } else if points >= 2.5 {
            CommissionRate::TwentyFive
        } else if points >= 1.5 {
            CommissionRate::Twenty
        } else {
            CommissionRate::Eighteen
        }
    }

    pub fn percent(self) -> u8 {
        match self {
            CommissionRate::Eighteen => 18,
            CommissionRate::Twenty => 20,
            CommissionRate::TwentyFive => 25,
            CommissionRate::Thirty => 30,
        }
    }

    pub fn fraction(self) -> f64 {
        f64::from(self.percent()) / 100.0
    }
}

/// One metric's tier within a scorecard row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricTier {
    pub metric: Metric,
    pub tier: u8,
}

/// Scorecard row for one employee
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRecord {
    pub employee: String,
    /// One entry per [`Metric::ALL`], in that order
    pub tiers: Vec<MetricTier>,
    pub points: f64,
    pub commission_rate: CommissionRate,
    pub gross_profit: f64,
    pub commission_earned: f64,
}

impl ScoreRecord {
    pub fn tier(&self, metric: Metric) -> Option<u8> {
        self.tiers
            .iter()
            .find(|t| t.metric == metric)
            .map(|t| t.tier)
    }

    /// Metrics whose tier falls below this row's own points average
    ///
    /// Diagnostic only; it does not affect the commission rate.
    pub fn below_average_metrics(&self) -> Vec<Metric> {
        self.tiers
            .iter()
            .filter(|t| f64::from(t.tier) < self.points)
            .map(|t| t.metric)
            .collect()
    }
}

/// Round to 2 decimal places, ties to even (2.625 → 2.62)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Scoring engine
#[derive(Debug, Clone, Copy, Default)]
pub struct Scorer {
    floor: TierFloor,
}

impl Scorer {
    pub fn new(floor: TierFloor) -> Self {
        Self { floor }
    }

    /// Score one aggregated employee row
    pub fn score(&self, record: &AggregateRecord) -> ScoreRecord {
        let tiers: Vec<MetricTier> = Metric::ALL
            .iter()
            .map(|&metric| MetricTier {
                metric,
                tier: tier(metric.value(record), metric.thresholds(), self.floor),
            })
            .collect();

        let sum: u32 = tiers.iter().map(|t| u32::from(t.tier)).sum();
        let points = round2(f64::from(sum) / Metric::ALL.len() as f64);
        let commission_rate = CommissionRate::from_points(points);
        let gross_profit = record.metrics.gross_profit;

        debug!(
            employee = %record.employee,
            points,
            rate = commission_rate.percent(),
            "Scored employee"
        );

        ScoreRecord {
            employee: record.employee.clone(),
            tiers,
            points,
            commission_rate,
            gross_profit,
            commission_earned: gross_profit * commission_rate.fraction(),
        }
    }

    /// Score every employee row of a table; the TOTAL row is never scored
    pub fn score_table(&self, table: &SummaryTable) -> Vec<ScoreRecord> {
        table
            .rows
            .iter()
            .filter(|r| !r.is_total)
            .map(|r| self.score(r))
            .collect()
    }
}
