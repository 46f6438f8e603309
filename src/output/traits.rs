//! Output error types and the flattened report row

use crate::storage::StorageError;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during output generation
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Failed to read records: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// One color of one product, as shown in the report table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub link: String,
    pub color_code: String,
    pub color_name: String,
    pub original_price: String,
    pub sale_price: String,
    /// Discount as a fraction, `null` when unknown
    pub sale_percent: Option<f64>,
}
