//! Bounded-concurrency extraction over a product queue
//!
//! This module handles:
//! - A FIFO queue of product URLs shared by a fixed pool of workers
//! - One isolated page per product, always closed afterwards
//! - Retrying navigation timeouts when configured
//! - Appending each finished record to the sink
//!
//! A failure on one product is logged and counted; it never stops the run.

use crate::config::{Config, CrawlerConfig};
use crate::crawler::extractor::VariantExtractor;
use crate::driver::{BrowserDriver, PageDriver};
use crate::record::ProductRecord;
use crate::state::CrawlReport;
use crate::storage::RecordSink;
use crate::SweepError;
use futures::future::join_all;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use tokio::time::Instant;

/// Products between progress log lines
const PROGRESS_INTERVAL: usize = 10;

/// Runs variant extraction over a list of product URLs
pub struct CrawlScheduler<'a, B: BrowserDriver, S: RecordSink + ?Sized> {
    browser: &'a B,
    sink: &'a S,
    extractor: VariantExtractor<'a>,
    crawler: &'a CrawlerConfig,
}

/// Queue and tally shared by the workers of one run
struct RunState {
    queue: Mutex<VecDeque<String>>,
    report: Mutex<CrawlReport>,
    total: usize,
    started: Instant,
}

impl RunState {
    fn next(&self) -> Option<String> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    /// Applies `update` to the report and returns the completed count
    fn tally(&self, update: impl FnOnce(&mut CrawlReport)) -> usize {
        let mut report = self.report.lock().unwrap_or_else(PoisonError::into_inner);
        update(&mut report);
        report.completed()
    }
}

impl<'a, B: BrowserDriver, S: RecordSink + ?Sized> CrawlScheduler<'a, B, S> {
    pub fn new(browser: &'a B, sink: &'a S, config: &'a Config) -> Self {
        Self {
            browser,
            sink,
            extractor: VariantExtractor::new(config),
            crawler: &config.crawler,
        }
    }

    /// Extracts every URL and appends the results to the sink
    ///
    /// Up to `concurrency` products are in flight at once. Items are taken
    /// from the queue in order, but records are appended in completion order.
    ///
    /// # Arguments
    ///
    /// * `urls` - Canonical product URLs, already deduplicated
    ///
    /// # Returns
    ///
    /// A report of successes and failures once the queue is drained
    pub async fn run(&self, urls: Vec<String>) -> CrawlReport {
        let total = urls.len();
        let workers = (self.crawler.concurrency as usize).clamp(1, total.max(1));

        tracing::info!("Extracting {} products with {} workers", total, workers);

        let state = RunState {
            queue: Mutex::new(urls.into()),
            report: Mutex::new(CrawlReport::new(total)),
            total,
            started: Instant::now(),
        };

        join_all((0..workers).map(|id| self.worker(id, &state))).await;

        let mut report = state
            .report
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        report.elapsed = state.started.elapsed();

        tracing::info!(
            "Extraction finished: {} saved, {} failed in {:.1}s",
            report.succeeded,
            report.failed.len(),
            report.elapsed.as_secs_f64()
        );
        report
    }

    /// Pulls URLs until the queue is empty
    async fn worker(&self, id: usize, state: &RunState) {
        while let Some(url) = state.next() {
            tracing::debug!("Worker {} took {}", id, url);

            let completed = match self.extract_with_retry(&url).await {
                Ok(record) => self.save(&url, &record, state),
                Err((e, attempts)) => {
                    tracing::error!(url = %url, "Failed to scrape {}: {}", url, e);
                    state.tally(|report| report.record_failure(&url, e.to_string(), attempts))
                }
            };

            if completed % PROGRESS_INTERVAL == 0 {
                let elapsed = state.started.elapsed().as_secs_f64().max(f64::EPSILON);
                tracing::info!(
                    "Progress: {}/{} products ({:.2}/s)",
                    completed,
                    state.total,
                    completed as f64 / elapsed
                );
            }
        }

        tracing::debug!("Worker {} finished", id);
    }

    /// Appends a record, counting a sink failure as a product failure
    fn save(&self, url: &str, record: &ProductRecord, state: &RunState) -> usize {
        match self.sink.append(record) {
            Ok(()) => {
                tracing::info!("Saved: {} ({} colors)", url, record.len());
                state.tally(|report| report.record_success(record.len()))
            }
            Err(e) => {
                tracing::error!(url = %url, "Failed to save {}: {}", url, e);
                state.tally(|report| report.record_failure(url, e.to_string(), 1))
            }
        }
    }

    /// Extracts one product, retrying navigation timeouts
    ///
    /// Returns the last error together with the number of attempts made.
    async fn extract_with_retry(&self, url: &str) -> Result<ProductRecord, (SweepError, u32)> {
        let mut attempts = 0;

        loop {
            attempts += 1;

            match self.extract_once(url).await {
                Ok(record) => return Ok(record),
                Err(e) if e.is_navigation_timeout() && attempts <= self.crawler.max_retries => {
                    tracing::warn!(
                        "Attempt {} for {} timed out, retrying in {:?}",
                        attempts,
                        url,
                        self.crawler.retry_delay()
                    );
                    tokio::time::sleep(self.crawler.retry_delay()).await;
                }
                Err(e) => return Err((e, attempts)),
            }
        }
    }

    /// Extracts one product on a fresh page, closing it on every path
    async fn extract_once(&self, url: &str) -> crate::Result<ProductRecord> {
        let page = self.browser.open_page().await?;
        let result = self.extractor.extract(&page, url).await;

        if let Err(e) = page.close().await {
            tracing::warn!("Failed to close page for {}: {}", url, e);
        }

        result
    }
}
