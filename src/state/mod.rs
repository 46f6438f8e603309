//! Run-scoped crawl state
//!
//! Nothing in here is persisted: the discovered link set and the per-run
//! tally live for one process and are discarded at exit. Durable output goes
//! through [`crate::storage`].

mod link_set;
mod run_state;

pub use link_set::LinkSet;
pub use run_state::{CrawlReport, FailedItem};
