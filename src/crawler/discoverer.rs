//! Category discovery
//!
//! Walks from the catalog root to every sub-category listing and collects the
//! product links each listing exposes once fully paginated.

use crate::config::Config;
use crate::crawler::paginator::ScrollPaginator;
use crate::driver::PageDriver;
use crate::state::LinkSet;
use crate::url::{canonicalize_url, with_query_hint};
use crate::Result;

/// Enumerates categories and their products on a single page
pub struct CategoryDiscoverer<'a, P: PageDriver + ?Sized> {
    page: &'a P,
    config: &'a Config,
}

impl<'a, P: PageDriver + ?Sized> CategoryDiscoverer<'a, P> {
    pub fn new(page: &'a P, config: &'a Config) -> Self {
        Self { page, config }
    }

    /// Collects the union of product links across all categories
    ///
    /// Categories are visited one after another on the same page. A category
    /// that fails to load or paginate is logged and skipped; only a failure
    /// to read the root itself is returned as an error.
    ///
    /// # Returns
    ///
    /// * `Ok(LinkSet)` - Canonical product URLs in discovery order
    /// * `Err(SweepError)` - The catalog root could not be read
    pub async fn discover(&self) -> Result<LinkSet> {
        let categories = self.categories().await?;
        tracing::info!("Found {} subcategories.", categories.len());

        let mut products = LinkSet::new();

        for (position, category) in categories.iter().enumerate() {
            tracing::info!(
                "[{}/{}] Scraping category: {}",
                position + 1,
                categories.len(),
                category
            );

            match self.category_products(category).await {
                Ok(links) => {
                    let found = links.len();
                    let added = products.extend(links);
                    tracing::info!(
                        "Category {} yielded {} products ({} new, {} total)",
                        category,
                        found,
                        added,
                        products.len()
                    );
                }
                Err(e) => {
                    tracing::error!(url = %category, "Failed to scrape category {}: {}", category, e);
                }
            }
        }

        tracing::info!("Discovered {} unique product links", products.len());
        Ok(products)
    }

    /// Sub-category URLs linked from the catalog root
    ///
    /// Links are kept when their path contains the category filter, the root
    /// itself is excluded and duplicates are dropped.
    pub async fn categories(&self) -> Result<Vec<String>> {
        let site = &self.config.site;
        let root = canonicalize_url(&site.catalog_root)?;

        self.page
            .navigate(&site.catalog_root, self.config.browser.navigation_timeout())
            .await?;
        self.page
            .wait_for_selector(
                &site.category_link_selector,
                self.config.browser.selector_timeout(),
            )
            .await?;

        let hrefs = self.page.hrefs(&site.category_link_selector).await?;

        let categories: LinkSet = hrefs
            .into_iter()
            .map(|href| href.trim().to_string())
            .filter(|href| href.contains(&site.category_path_filter))
            .filter(|href| match canonicalize_url(href) {
                Ok(canonical) => canonical != root,
                Err(e) => {
                    tracing::warn!("Ignoring malformed category link {}: {}", href, e);
                    false
                }
            })
            .collect();

        Ok(categories.into_vec())
    }

    /// Paginates one category listing and returns its product links
    async fn category_products(&self, category: &str) -> Result<Vec<String>> {
        let site = &self.config.site;
        let url = with_query_hint(
            category,
            &site.page_size_param,
            &site.page_size_hint.to_string(),
        )?;

        self.page
            .navigate(&url, self.config.browser.navigation_timeout())
            .await?;

        let pagination = ScrollPaginator::new(self.page, site, &self.config.crawler)
            .paginate()
            .await?;

        tracing::debug!(
            "Pagination of {} stopped after {} rounds: {:?}",
            category,
            pagination.iterations,
            pagination.stop_reason
        );

        Ok(pagination.links)
    }
}
