//! Report generation modules.
//!
//! Renders a [`crate::models::SalesReport`] as Markdown or JSON.

pub mod generator;

pub use generator::{format_magnitude, generate_json_report, generate_markdown_report};
