//! Per-product variant extraction
//!
//! A product page shows one color at a time. Each color swatch is selected in
//! turn and the page is read back: the variant code from the URL, the display
//! name and the list and sale prices. Observations are folded into a
//! [`ProductRecord`] keyed by variant code, first occurrence winning.

use crate::config::{BrowserConfig, Config, CrawlerConfig, SiteConfig};
use crate::driver::{DriverResult, PageDriver};
use crate::record::{PriceText, ProductRecord, VariantRecord};
use crate::url::variant_code_from_url;
use crate::Result;
use tokio::time::{sleep, Instant};

/// Everything read from the page for one selected swatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwatchObservation {
    /// Position of the swatch in the group
    pub index: usize,
    /// Whether the swatch carried a discount indicator
    pub has_indicator: bool,
    /// Variant code read from the URL after selection
    pub variant_code: Option<String>,
    /// Every color label on the page, in document order
    pub color_texts: Vec<String>,
    pub list_price_text: Option<String>,
    /// Only read when the indicator is present and the sale price is visible
    pub sale_price_text: Option<String>,
}

impl SwatchObservation {
    /// Turns the observation into a variant, or `None` without a variant code
    pub fn into_variant(self, separator: &str) -> Option<VariantRecord> {
        let variant_code = self.variant_code?;
        let display_name = display_name(&self.color_texts, separator);

        let list_price = match self.list_price_text {
            Some(text) => PriceText::parse(text.trim()),
            None => PriceText::missing(),
        };
        let sale_price = self
            .sale_price_text
            .map(|text| PriceText::parse(text.trim()));

        Some(VariantRecord::new(
            variant_code,
            display_name,
            list_price,
            sale_price,
        ))
    }
}

/// Picks the color name out of the page's color labels
///
/// A single label is the name itself. When several labels are present the
/// page shows "<product> — <color>" rows; the part after the separator of the
/// first such row is the name.
fn display_name(texts: &[String], separator: &str) -> String {
    if texts.len() <= 1 {
        return texts
            .first()
            .map(|text| text.trim().to_string())
            .unwrap_or_default();
    }

    texts
        .iter()
        .find(|text| text.contains(separator))
        .and_then(|text| text.split(separator).nth(1))
        .map(|name| name.trim().to_string())
        .unwrap_or_default()
}

/// Reads every color variant of a product page
pub struct VariantExtractor<'a> {
    site: &'a SiteConfig,
    browser: &'a BrowserConfig,
    crawler: &'a CrawlerConfig,
}

impl<'a> VariantExtractor<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            site: &config.site,
            browser: &config.browser,
            crawler: &config.crawler,
        }
    }

    /// Extracts one product record from `url`
    ///
    /// # Arguments
    ///
    /// * `page` - A page dedicated to this product
    /// * `url` - Canonical product URL, stored verbatim in the record
    ///
    /// # Returns
    ///
    /// * `Ok(ProductRecord)` - Variants in swatch order, possibly empty
    /// * `Err(SweepError)` - Navigation timed out, the swatch group never
    ///   appeared or any swatch could not be read; variants already read are
    ///   dropped
    pub async fn extract<P: PageDriver + ?Sized>(
        &self,
        page: &P,
        url: &str,
    ) -> Result<ProductRecord> {
        page.navigate(url, self.browser.navigation_timeout()).await?;
        page.wait_for_selector(&self.site.swatch_selector, self.browser.selector_timeout())
            .await?;

        let swatches = page.count(&self.site.swatch_selector).await?;
        tracing::debug!("{} has {} swatches", url, swatches);

        let mut record = ProductRecord::new(url);

        for index in 0..swatches {
            let observation = self.observe_swatch(page, index).await?;

            match observation.into_variant(&self.site.name_separator) {
                Some(variant) => {
                    let code = variant.variant_code.clone();
                    if !record.insert(variant) {
                        tracing::debug!("Duplicate variant {} on {}, keeping first", code, url);
                    }
                }
                None => {
                    tracing::warn!("No variant code for swatch #{} on {}, skipping", index, url);
                }
            }
        }

        Ok(record)
    }

    /// Selects the `index`-th swatch and reads the page back
    async fn observe_swatch<P: PageDriver + ?Sized>(
        &self,
        page: &P,
        index: usize,
    ) -> DriverResult<SwatchObservation> {
        let swatch = &self.site.swatch_selector;

        let has_indicator = page
            .count_within(swatch, index, &self.site.indicator_selector)
            .await?
            > 0;

        let pressed = page
            .attribute(swatch, index, "aria-pressed")
            .await?
            .is_some_and(|value| value == "true");

        if !pressed {
            let before = page.current_url().await?;
            page.click(swatch, index).await?;
            self.settle(page, &before).await?;
        }

        let variant_code =
            variant_code_from_url(&page.current_url().await?, &self.site.variant_param);
        let color_texts = page.all_inner_texts(&self.site.color_text_selector).await?;
        let list_price_text = page.inner_text(&self.site.list_price_selector).await?;

        let sale = &self.site.sale_price_selector;
        let sale_price_text =
            if has_indicator && page.count(sale).await? > 0 && page.is_visible(sale, 0).await? {
                page.inner_text(sale).await?
            } else {
                None
            };

        Ok(SwatchObservation {
            index,
            has_indicator,
            variant_code,
            color_texts,
            list_price_text,
            sale_price_text,
        })
    }

    /// Waits for a swatch click to take effect
    ///
    /// Polls the URL until it differs from `before`, then gives the labels a
    /// moment to re-render. If the URL never changes (re-selecting the same
    /// color) the full `swatch-settle` delay elapses instead.
    async fn settle<P: PageDriver + ?Sized>(&self, page: &P, before: &str) -> DriverResult<()> {
        let deadline = Instant::now() + self.crawler.swatch_settle();

        loop {
            if page.current_url().await? != before {
                sleep(self.crawler.text_settle()).await;
                return Ok(());
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            sleep(self.crawler.url_poll().min(deadline - now)).await;
        }
    }
}
