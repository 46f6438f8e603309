//! Crawler coordinator - main sweep orchestration logic
//!
//! This module ties the phases together:
//! - Discovery writes the link manifest
//! - Extraction reads the manifest and appends records to the sink
//! - The browser is shut down on every exit path

use crate::config::Config;
use crate::crawler::discoverer::CategoryDiscoverer;
use crate::crawler::scheduler::CrawlScheduler;
use crate::driver::{BrowserDriver, ChromeBrowser, PageDriver};
use crate::state::{CrawlReport, LinkSet};
use crate::storage::{read_manifest, write_manifest, JsonlSink};
use crate::{Result, SweepError};
use std::path::Path;

/// Which phases a sweep runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Discovery followed by extraction
    Full,
    /// Write the link manifest and stop
    DiscoverOnly,
    /// Extract from an existing manifest
    ExtractOnly,
}

impl RunMode {
    fn discovers(self) -> bool {
        matches!(self, Self::Full | Self::DiscoverOnly)
    }

    fn extracts(self) -> bool {
        matches!(self, Self::Full | Self::ExtractOnly)
    }
}

/// Outcome of a sweep
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Product links written to the manifest, when discovery ran
    pub discovered: Option<usize>,
    /// Extraction tally, when extraction ran
    pub report: Option<CrawlReport>,
}

/// Main sweep coordinator structure
pub struct Coordinator<B: BrowserDriver> {
    config: Config,
    browser: B,
}

impl<B: BrowserDriver> Coordinator<B> {
    /// Creates a coordinator around an already launched browser
    pub fn new(config: Config, browser: B) -> Self {
        Self { config, browser }
    }

    /// Runs the requested phases and shuts the browser down
    ///
    /// # Arguments
    ///
    /// * `mode` - The phases to run
    ///
    /// # Returns
    ///
    /// * `Ok(RunSummary)` - Every requested phase completed
    /// * `Err(SweepError)` - A fatal error stopped the sweep; the browser has
    ///   still been shut down
    pub async fn run(self, mode: RunMode) -> Result<RunSummary> {
        let result = self.execute(mode).await;

        if let Err(e) = self.browser.shutdown().await {
            tracing::warn!("Failed to shut down browser: {}", e);
        }

        result
    }

    async fn execute(&self, mode: RunMode) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        if mode.discovers() {
            let links = self.discover().await?;
            summary.discovered = Some(links.len());
        }

        if mode.extracts() {
            summary.report = Some(self.extract().await?);
        }

        Ok(summary)
    }

    /// Discovers product links and writes the manifest
    pub async fn discover(&self) -> Result<LinkSet> {
        tracing::info!("Discovering products from {}", self.config.site.catalog_root);

        let page = self.browser.open_page().await?;
        let result = CategoryDiscoverer::new(&page, &self.config).discover().await;

        if let Err(e) = page.close().await {
            tracing::warn!("Failed to close discovery page: {}", e);
        }

        let links = result?;
        write_manifest(Path::new(&self.config.output.manifest_path), &links)?;
        Ok(links)
    }

    /// Extracts every product listed in the manifest
    ///
    /// An unreadable manifest or an unopenable record file is fatal.
    pub async fn extract(&self) -> Result<CrawlReport> {
        let manifest_path = &self.config.output.manifest_path;
        let links = read_manifest(Path::new(manifest_path)).map_err(|source| {
            SweepError::ManifestRead {
                path: manifest_path.clone(),
                source,
            }
        })?;

        let records_path = &self.config.output.records_path;
        let sink = JsonlSink::open(Path::new(records_path)).map_err(|source| {
            SweepError::SinkOpen {
                path: records_path.clone(),
                source,
            }
        })?;

        tracing::info!("Appending records to {}", sink.path().display());
        if links.is_empty() {
            tracing::warn!("Manifest {} lists no product links", manifest_path);
        } else {
            tracing::info!("Total unique product links: {}", links.len());
        }

        let report = CrawlScheduler::new(&self.browser, &sink, &self.config)
            .run(links.into_vec())
            .await;

        Ok(report)
    }
}

/// Launches Chrome and runs a sweep
///
/// This is the main entry point for running the pipeline against a real
/// site.
///
/// # Arguments
///
/// * `config` - The sweep configuration
/// * `mode` - The phases to run
pub async fn run_sweep(config: Config, mode: RunMode) -> Result<RunSummary> {
    let browser = ChromeBrowser::launch(&config.browser).await?;
    Coordinator::new(config, browser).run(mode).await
}
