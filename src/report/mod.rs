//! Dashboard report generation.
//!
//! Assembles the aggregated tables into a [`crate::models::Report`] and
//! renders it as Markdown or JSON.

pub mod builder;
pub mod format;
pub mod generator;
pub mod insights;

pub use builder::build_report;
pub use generator::{generate_json_report, generate_markdown_report};
