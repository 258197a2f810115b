//! HTTP API handlers for commcalc-dash

pub mod auth;
pub mod buildinfo;
pub mod calculator;
pub mod health;
pub mod report;
pub mod ui;

pub use auth::{auth_middleware, PASSWORD_HEADER};
pub use buildinfo::get_build_info;
pub use calculator::{flat_commission, gross_profit_for_employee};
pub use health::health_routes;
pub use report::{create_report, export_scorecard_csv, export_summary_csv, list_employees};
pub use ui::{serve_app_js, serve_index};
