//! Crawler module for catalog discovery and variant extraction
//!
//! This module contains the core crawling logic, including:
//! - Infinite-scroll pagination of listing pages
//! - Category and product link discovery
//! - Per-swatch variant extraction on product pages
//! - Bounded-concurrency scheduling of extraction
//! - Overall sweep coordination

mod coordinator;
mod discoverer;
mod extractor;
mod paginator;
mod scheduler;

pub use coordinator::{run_sweep, Coordinator, RunMode, RunSummary};
pub use discoverer::CategoryDiscoverer;
pub use extractor::{SwatchObservation, VariantExtractor};
pub use paginator::{Pagination, ScrollPaginator, StopReason};
pub use scheduler::CrawlScheduler;
