//! Schema normalization: vendor export headers to canonical fields
//!
//! The export tool's headers carry stray whitespace and vary slightly between
//! report types. Headers are trimmed, then matched against a fixed rename map.
//! Every required column missing for the selected [`ReportVariant`] is reported
//! at once, before any cell is read.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// Canonical field names used throughout the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Field {
    Employee,
    News,
    Upgrades,
    SmtGa,
    SmbGa,
    PerksRate,
    PremiumUnlimitedRate,
    Vmp,
    GrossProfit,
    UnitQty,
    /// Fixed-wireless (FWA) or home-internet (VHI) line items
    LineA,
    /// FIOS line items
    LineB,
    Vzph,
    VerizonVisa,
}

impl Field {
    /// Every numeric field, in output order
    pub const NUMERIC: [Field; 13] = [
        Field::News,
        Field::Upgrades,
        Field::SmtGa,
        Field::SmbGa,
        Field::PerksRate,
        Field::PremiumUnlimitedRate,
        Field::Vmp,
        Field::GrossProfit,
        Field::UnitQty,
        Field::LineA,
        Field::LineB,
        Field::Vzph,
        Field::VerizonVisa,
    ];

    pub fn canonical_name(self) -> &'static str {
        match self {
            Field::Employee => "Employee",
            Field::News => "News",
            Field::Upgrades => "Upgrades",
            Field::SmtGa => "SmtGA",
            Field::SmbGa => "SmbGA",
            Field::PerksRate => "PerksRate",
            Field::PremiumUnlimitedRate => "PremiumUnlimitedRate",
            Field::Vmp => "VMP",
            Field::GrossProfit => "GrossProfit",
            Field::UnitQty => "UnitQty",
            Field::LineA => "FwaGA",
            Field::LineB => "FiosGA",
            Field::Vzph => "VZPH",
            Field::VerizonVisa => "VerizonVisa",
        }
    }

    /// Export labels accepted for this field, in order of preference
    pub fn source_labels(self) -> &'static [&'static str] {
        match self {
            Field::Employee => &["Employee Full Name"],
            Field::News => &["GA"],
            Field::Upgrades => &["Upgrades"],
            Field::SmtGa => &["SMT GA"],
            Field::SmbGa => &["SMB GA"],
            Field::PerksRate => &["VZ Perks Rate"],
            Field::PremiumUnlimitedRate => &["(RQ) Consumer SMT Prem Unlim %"],
            Field::Vmp => &["VMP Take Rate"],
            Field::GrossProfit => &["GP"],
            Field::UnitQty => &["SMT Qty", "SMT QTY"],
            Field::LineA => &["VZ FWA GA", "VZ VHI GA"],
            Field::LineB => &["VZ FIOS GA"],
            Field::Vzph => &["VZPH Qty"],
            Field::VerizonVisa => &["VZ CC QTY"],
        }
    }

    /// Percent-valued fields (subject to fractional percent normalization)
    pub fn is_percent(self) -> bool {
        matches!(
            self,
            Field::PerksRate | Field::PremiumUnlimitedRate | Field::Vmp
        )
    }

    pub(crate) fn describe_missing(self) -> String {
        format!("{} ({})", self.source_labels().join(" / "), self.canonical_name())
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Which export report is being uploaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportVariant {
    /// Scorecard export: the eight scored metrics plus employee and new lines
    Compact,
    /// KPI detail export: adds the smartphone unit quantity
    #[default]
    Full,
}

impl ReportVariant {
    pub fn required_fields(self) -> &'static [Field] {
        const COMPACT: &[Field] = &[
            Field::Employee,
            Field::News,
            Field::Upgrades,
            Field::SmtGa,
            Field::SmbGa,
            Field::PerksRate,
            Field::PremiumUnlimitedRate,
            Field::Vmp,
            Field::GrossProfit,
            Field::LineA,
            Field::LineB,
        ];
        const FULL: &[Field] = &[
            Field::Employee,
            Field::News,
            Field::Upgrades,
            Field::SmtGa,
            Field::SmbGa,
            Field::PerksRate,
            Field::PremiumUnlimitedRate,
            Field::Vmp,
            Field::GrossProfit,
            Field::UnitQty,
            Field::LineA,
            Field::LineB,
        ];
        match self {
            ReportVariant::Compact => COMPACT,
            ReportVariant::Full => FULL,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "compact" => Some(ReportVariant::Compact),
            "full" => Some(ReportVariant::Full),
            _ => None,
        }
    }
}

/// Canonical field → column index in the raw table
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    columns: BTreeMap<Field, usize>,
}

impl ColumnMap {
    pub fn index(&self, field: Field) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    pub fn contains(&self, field: Field) -> bool {
        self.columns.contains_key(&field)
    }
}

/// Trim a vendor header (including a stray UTF-8 byte-order mark)
pub fn trim_header(header: &str) -> &str {
    header.trim_start_matches('\u{feff}').trim()
}

/// Map trimmed headers onto canonical fields and validate the variant's
/// required columns.
pub fn normalize(headers: &[String], variant: ReportVariant) -> Result<ColumnMap> {
    let trimmed: Vec<&str> = headers.iter().map(|h| trim_header(h)).collect();

    let mut columns = BTreeMap::new();
    for field in std::iter::once(Field::Employee).chain(Field::NUMERIC) {
        let found = field
            .source_labels()
            .iter()
            .find_map(|label| trimmed.iter().position(|h| h == label));
        if let Some(index) = found {
            columns.insert(field, index);
        }
    }

    let missing: Vec<String> = variant
        .required_fields()
        .iter()
        .filter(|field| !columns.contains_key(*field))
        .map(|field| field.describe_missing())
        .collect();

    if !missing.is_empty() {
        return Err(Error::MissingColumns(missing));
    }

    debug!(variant = ?variant, mapped = columns.len(), "Normalized report headers");
    Ok(ColumnMap { columns })
}
