//! Outcome tally for one extraction run

use std::time::Duration;

/// A product that could not be extracted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    pub url: String,
    pub error: String,
    /// Attempts made, including retries
    pub attempts: u32,
}

/// Summary returned by the crawl scheduler once its queue is drained
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// URLs handed to the scheduler
    pub scheduled: usize,

    /// Records appended to the sink
    pub succeeded: usize,

    /// Variants contained in the appended records
    pub variants_written: usize,

    /// Products that were dropped, in completion order
    pub failed: Vec<FailedItem>,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl CrawlReport {
    pub fn new(scheduled: usize) -> Self {
        Self {
            scheduled,
            ..Self::default()
        }
    }

    /// Records a product appended to the sink
    pub fn record_success(&mut self, variants: usize) {
        self.succeeded += 1;
        self.variants_written += variants;
    }

    /// Records a product that was logged and dropped
    pub fn record_failure(&mut self, url: &str, error: String, attempts: u32) {
        self.failed.push(FailedItem {
            url: url.to_string(),
            error,
            attempts,
        });
    }

    /// Products finished so far, successfully or not
    pub fn completed(&self) -> usize {
        self.succeeded + self.failed.len()
    }

    /// Products per second over the elapsed time
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.completed() as f64 / secs
        } else {
            0.0
        }
    }

    /// Percentage of scheduled products that produced a record
    pub fn success_rate(&self) -> f64 {
        if self.scheduled == 0 {
            return 0.0;
        }
        (self.succeeded as f64 / self.scheduled as f64) * 100.0
    }
}
