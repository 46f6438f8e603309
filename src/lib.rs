//! Catalog-Sweep: a variant price harvester for retail catalogs
//!
//! This crate discovers product pages on a catalog site, extracts per-color
//! pricing from each page by driving a real browser, and appends the results
//! to a durable JSONL file that can be rendered into a sortable HTML report.

pub mod config;
pub mod crawler;
pub mod driver;
pub mod output;
pub mod record;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Catalog-Sweep operations
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Browser error: {0}")]
    Driver(#[from] driver::DriverError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Failed to read link manifest {path}: {source}")]
    ManifestRead {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to open record sink {path}: {source}")]
    SinkOpen {
        path: String,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SweepError {
    /// Returns true if this error was caused by a navigation timeout
    ///
    /// Navigation timeouts are the only failures the scheduler may retry.
    pub fn is_navigation_timeout(&self) -> bool {
        matches!(
            self,
            Self::Driver(driver::DriverError::NavigationTimeout { .. })
        )
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

/// Result type alias for Catalog-Sweep operations
pub type Result<T> = std::result::Result<T, SweepError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use record::{PriceText, ProductRecord, VariantRecord};
pub use state::LinkSet;
pub use url::{canonicalize_url, variant_code_from_url};
