//! Commission report pipeline
//!
//! Stages run strictly forward, each producing a new table:
//!
//! 1. [`schema`] maps vendor headers to canonical fields
//! 2. [`coerce`] turns decorated cells into finite numbers
//! 3. [`aggregate`] groups by employee and derives ratios and totals
//! 4. [`scoring`] assigns tiers, points and a commission rate
//!
//! [`pipeline::run`] wires them together. [`flat`] is the independent flat
//! commission calculator; [`format`] and [`export`] are presentation only.

pub mod aggregate;
pub mod coerce;
pub mod employee;
pub mod export;
pub mod flat;
pub mod format;
pub mod pipeline;
pub mod schema;
pub mod scoring;

pub use pipeline::{run, PipelineConfig, ReportOutput};
