//! Report export in Markdown, JSON and plain text.

mod generator;

pub use generator::{write_report, ReportPaths};
