//! Storage traits and error types
//!
//! This module defines the interface extraction workers write through and the
//! errors raised by the file-backed stores.

use crate::record::ProductRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Destination for completed product records
///
/// Implementations are shared by every extraction worker. Each call must
/// either persist the whole record or nothing, and a record that was
/// accepted must survive a crash of the process right after the call
/// returns.
pub trait RecordSink: Send + Sync {
    /// Appends one record
    ///
    /// # Arguments
    ///
    /// * `record` - The finished product record
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The record is durable
    /// * `Err(StorageError)` - Nothing was written
    fn append(&self, record: &ProductRecord) -> StorageResult<()>;
}
