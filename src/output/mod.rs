//! Output module for reports over extracted records
//!
//! This module handles:
//! - Rendering the sortable HTML report
//! - Summarizing records as statistics

mod report;
pub mod stats;
mod traits;

pub use report::{flatten_records, generate_report, latest_records, render_html};
pub use stats::{compute_statistics, load_statistics, print_statistics, RecordStatistics};
pub use traits::{OutputError, OutputResult, ReportRow};
