//! Common error types for CommCalc

use thiserror::Error;

/// Common result type for CommCalc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the report pipeline and its front ends
///
/// Every fatal pipeline condition is one of these variants. Unparseable numeric
/// cells are NOT errors: the field coercer substitutes zero for them.
#[derive(Error, Debug)]
pub enum Error {
    /// One or more required source columns are absent after header trimming.
    ///
    /// Each entry is `"<source label> (<canonical field>)"`.
    #[error("Missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// No employees remain after selection and placeholder filtering
    #[error("No employees selected: {0}")]
    EmptySelection(String),

    /// Uploaded bytes could not be read as a table
    #[error("Ingest error: {0}")]
    Ingest(String),

    /// CSV reader/writer error (wraps csv::Error)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Spreadsheet decoding error
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Deductions were entered without an explanation
    #[error("A reason is required for deductions of ${0:.2}")]
    MissingDeductionReason(f64),
}
