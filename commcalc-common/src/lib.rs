//! # CommCalc Common Library
//!
//! Shared code for the CommCalc dashboard and batch CLI:
//! - Error type
//! - Configuration loading
//! - Password gate primitives
//! - Upload ingest (CSV and spreadsheets)
//! - The commission report pipeline and the flat calculator

pub mod api;
pub mod config;
pub mod error;
pub mod ingest;
pub mod report;

pub use error::{Error, Result};
