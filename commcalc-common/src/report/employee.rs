//! Employee identity: name canonicalization and selection filters
//!
//! The export tool is inconsistent about name order and case ("ordonez josh"
//! vs "Josh Ordonez"). Canonicalization folds case, sorts the words and
//! title-cases the result, so split records for one person merge.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lowercased employee values injected by the export tool for aggregate rows
pub const PLACEHOLDER_NAMES: [&str; 2] = ["rep enc", "unknown"];

/// Label used for the synthetic totals row
pub const TOTAL_LABEL: &str = "TOTAL";

/// Canonicalized employee name (grouping key)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeKey(String);

impl EmployeeKey {
    /// Canonicalize a raw export name
    ///
    /// ```
    /// use commcalc_common::report::employee::EmployeeKey;
    ///
    /// assert_eq!(
    ///     EmployeeKey::canonicalize("ordonez  JOSUE"),
    ///     EmployeeKey::canonicalize("Josue Ordonez"),
    /// );
    /// assert_eq!(EmployeeKey::canonicalize("ordonez josue").as_str(), "Josue Ordonez");
    /// ```
    pub fn canonicalize(raw: &str) -> Self {
        let mut tokens: Vec<String> = raw.split_whitespace().map(str::to_lowercase).collect();
        tokens.sort();
        EmployeeKey(title_case(&tokens.join(" ")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive membership test against a list of names
    ///
    /// Each listed name is canonicalized first, so word order is irrelevant.
    pub fn is_listed(&self, names: &[String]) -> bool {
        names
            .iter()
            .any(|name| EmployeeKey::canonicalize(name) == *self)
    }
}

impl fmt::Display for EmployeeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Title-case each run of letters: first letter upper, rest lower
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut previous_is_letter = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(c);
            previous_is_letter = false;
        }
    }
    out
}

/// True for rows that are not real employees: single-word names and the
/// export tool's placeholder values.
pub fn is_placeholder(raw: &str) -> bool {
    if raw.split_whitespace().count() < 2 {
        return true;
    }
    let folded = raw.trim().to_lowercase();
    PLACEHOLDER_NAMES.contains(&folded.as_str())
}

/// Which employees participate in a run
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// Everyone except names starting with a placeholder prefix
    #[default]
    Default,
    /// Only the listed employees (matched by canonical key)
    Only(Vec<String>),
}

impl Selection {
    /// Build from an optional comma-separated list; blank means default
    pub fn from_list(list: Option<&str>) -> Self {
        let names: Vec<String> = list
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if names.is_empty() {
            Selection::Default
        } else {
            Selection::Only(names)
        }
    }

    pub fn includes(&self, display_name: &str) -> bool {
        match self {
            Selection::Default => {
                let folded = display_name.trim().to_lowercase();
                !PLACEHOLDER_NAMES
                    .iter()
                    .any(|prefix| folded.starts_with(prefix))
            }
            Selection::Only(names) => EmployeeKey::canonicalize(display_name).is_listed(names),
        }
    }
}
