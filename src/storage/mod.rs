//! Storage module for persisting crawl data
//!
//! This module handles the two files that connect the pipeline stages:
//! - The link manifest written by discovery and read by extraction
//! - The append-only JSONL file of product records

mod jsonl;
mod manifest;
mod traits;

pub use jsonl::{load_records, JsonlSink, RecordLoad};
pub use manifest::{read_manifest, write_manifest, MANIFEST_HEADER};
pub use traits::{RecordSink, StorageError, StorageResult};
