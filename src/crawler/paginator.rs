//! Infinite-scroll pagination
//!
//! Listing pages load more items as the viewport approaches the bottom, and
//! some only react to a change of scroll direction. The paginator scrolls
//! down, up a little and down again until the number of distinct product
//! links stops growing, clicking a "load more" button when scrolling alone
//! stalls.
//!
//! Without an authoritative total this is a best-effort fixed point: a page
//! that loads nothing for `stall-limit` consecutive rounds is assumed to be
//! exhausted.

use crate::config::{CrawlerConfig, SiteConfig};
use crate::driver::{DriverResult, PageDriver};
use crate::state::LinkSet;
use crate::url::canonicalize_url;
use std::time::Duration;

/// Candidate elements for "load more" controls
const LOAD_MORE_SELECTOR: &str = "button";

/// Why pagination stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The displayed total was reached
    TargetReached,
    /// No growth and nothing left to click for `stall-limit` rounds
    Stalled,
    /// `max-scroll-iterations` rounds were spent
    IterationCap,
}

/// Result of paginating one listing
#[derive(Debug, Clone)]
pub struct Pagination {
    /// Canonical product URLs in first-seen order
    pub links: Vec<String>,
    /// Total advertised by the page, if any
    pub target: Option<u64>,
    /// Scroll rounds performed
    pub iterations: u32,
    pub stop_reason: StopReason,
}

/// Drives one listing page until lazy loading is exhausted
pub struct ScrollPaginator<'a, P: PageDriver + ?Sized> {
    page: &'a P,
    site: &'a SiteConfig,
    crawler: &'a CrawlerConfig,
}

impl<'a, P: PageDriver + ?Sized> ScrollPaginator<'a, P> {
    pub fn new(page: &'a P, site: &'a SiteConfig, crawler: &'a CrawlerConfig) -> Self {
        Self {
            page,
            site,
            crawler,
        }
    }

    /// Materializes every item of the listing the page is positioned on
    ///
    /// # Algorithm
    ///
    /// 1. Read the advertised total, if the page shows one
    /// 2. Scroll to the bottom, wait, scroll up a bit, scroll down, wait
    /// 3. Re-measure the distinct product links
    /// 4. On no growth, click a visible "load more" button if there is one
    ///    (which resets the stall counter), otherwise count a stall
    /// 5. Stop at the total, after `stall-limit` consecutive stalls, or after
    ///    `max-scroll-iterations` rounds
    pub async fn paginate(&self) -> DriverResult<Pagination> {
        let target = self.target_count().await?;
        match target {
            Some(total) => tracing::info!("Target item count: {}", total),
            None => tracing::info!("No target item count shown, relying on stall detection"),
        }

        let mut links = LinkSet::new();
        links.extend(self.visible_links().await?);

        let mut stalls = 0;
        let mut iterations = 0;

        let stop_reason = loop {
            if target.is_some_and(|total| links.len() as u64 >= total) {
                tracing::info!("Reached target item count");
                break StopReason::TargetReached;
            }
            if stalls >= self.crawler.stall_limit {
                break StopReason::Stalled;
            }
            if iterations >= self.crawler.max_scroll_iterations {
                tracing::warn!(
                    "Giving up after {} scroll rounds with {} items",
                    iterations,
                    links.len()
                );
                break StopReason::IterationCap;
            }

            iterations += 1;
            self.scroll_round().await?;

            let added = links.extend(self.visible_links().await?);
            tracing::info!("Scrolled... Products found: {}", links.len());

            if added > 0 {
                stalls = 0;
            } else if self.click_load_more().await? {
                stalls = 0;
            } else {
                stalls += 1;
            }
        };

        Ok(Pagination {
            links: links.into_vec(),
            target,
            iterations,
            stop_reason,
        })
    }

    /// Reads the advertised number of items, ignoring non-digits
    async fn target_count(&self) -> DriverResult<Option<u64>> {
        let text = self.page.inner_text(&self.site.total_count_selector).await?;
        Ok(text.and_then(|text| parse_count(&text)))
    }

    /// Canonical product links currently in the DOM
    async fn visible_links(&self) -> DriverResult<Vec<String>> {
        let hrefs = self.page.hrefs(&self.site.product_link_selector).await?;
        Ok(hrefs
            .iter()
            .filter_map(|href| canonicalize_url(href).ok())
            .collect())
    }

    /// Bottom, settle, back up, bottom again, settle
    async fn scroll_round(&self) -> DriverResult<()> {
        self.page.scroll_to_bottom().await?;
        sleep_ms(self.crawler.scroll_settle_ms).await;

        self.page.scroll_by(-self.crawler.scroll_back_px).await?;
        sleep_ms(self.crawler.scroll_retrigger_ms).await;

        self.page.scroll_to_bottom().await?;
        sleep_ms(self.crawler.scroll_final_ms).await;
        Ok(())
    }

    /// Clicks the first visible "load more" button, if any
    ///
    /// Returns true if a button was clicked.
    async fn click_load_more(&self) -> DriverResult<bool> {
        let captions = self.page.all_inner_texts(LOAD_MORE_SELECTOR).await?;

        for (index, caption) in captions.iter().enumerate() {
            if !is_load_more(caption, &self.site.load_more_labels) {
                continue;
            }
            if !self.page.is_visible(LOAD_MORE_SELECTOR, index).await? {
                continue;
            }

            tracing::info!("Clicking '{}' button...", caption.trim());
            if let Err(e) = self.page.click(LOAD_MORE_SELECTOR, index).await {
                tracing::warn!("Failed to click '{}': {}", caption.trim(), e);
                return Ok(false);
            }
            sleep_ms(self.crawler.load_more_settle_ms).await;
            return Ok(true);
        }

        Ok(false)
    }
}

/// Case-insensitive caption match against the configured labels
fn is_load_more(caption: &str, labels: &[String]) -> bool {
    let caption = caption.to_lowercase();
    labels
        .iter()
        .any(|label| caption.contains(&label.to_lowercase()))
}

/// Digits of a count label, e.g. "(1,204)" → 1204; zero means unknown
fn parse_count(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok().filter(|count| *count > 0)
}

async fn sleep_ms(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
