use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Catalog-Sweep
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Page structure of the target catalog
///
/// Every selector the pipeline touches lives here; the page structure is
/// assumed stable for the duration of one run.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SiteConfig {
    /// Root catalog page listing the subcategories
    pub catalog_root: String,

    /// Anchors in the category navigation
    #[serde(default = "default_category_link_selector")]
    pub category_link_selector: String,

    /// Subcategory links must contain this path fragment
    #[serde(default = "default_category_path_filter")]
    pub category_path_filter: String,

    /// Anchors pointing at product pages
    #[serde(default = "default_product_link_selector")]
    pub product_link_selector: String,

    /// Element displaying the total number of items in a listing
    #[serde(default = "default_total_count_selector")]
    pub total_count_selector: String,

    /// Query parameter hinting the listing to render more items at once
    #[serde(default = "default_page_size_param")]
    pub page_size_param: String,

    /// Value for `page_size_param`
    #[serde(default = "default_page_size_hint")]
    pub page_size_hint: u32,

    /// Color swatch buttons on a product page
    #[serde(default = "default_swatch_selector")]
    pub swatch_selector: String,

    /// Sale/new badge inside a swatch
    #[serde(default = "default_indicator_selector")]
    pub indicator_selector: String,

    /// Color name label(s)
    #[serde(default = "default_color_text_selector")]
    pub color_text_selector: String,

    /// Regular price label
    #[serde(default = "default_list_price_selector")]
    pub list_price_selector: String,

    /// Sale price label
    #[serde(default = "default_sale_price_selector")]
    pub sale_price_selector: String,

    /// Query parameter carrying the selected variant code
    #[serde(default = "default_variant_param")]
    pub variant_param: String,

    /// Button captions that load further listing items
    #[serde(default = "default_load_more_labels")]
    pub load_more_labels: Vec<String>,

    /// Glyph separating the prefix from the color name in multi-row layouts
    #[serde(default = "default_name_separator")]
    pub name_separator: String,
}

/// Browser launch and navigation configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BrowserConfig {
    /// Run without a visible window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Extra command-line arguments for the browser process
    #[serde(default = "default_browser_args")]
    pub args: Vec<String>,

    /// Explicit browser binary; auto-detected when absent
    #[serde(default)]
    pub executable: Option<String>,

    /// Resource types aborted by request interception
    #[serde(default = "default_blocked_resource_types")]
    pub blocked_resource_types: Vec<String>,

    /// Upper bound for a single navigation (milliseconds)
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,

    /// Upper bound for a selector wait (milliseconds)
    #[serde(default = "default_selector_timeout_ms")]
    pub selector_timeout_ms: u64,
}

/// Crawl pacing and concurrency configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Number of concurrent extraction workers
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Extra attempts after a navigation timeout (0 disables retry)
    #[serde(default)]
    pub max_retries: u32,

    /// Delay before retrying a timed-out navigation (milliseconds)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Wait after scrolling to the bottom of a listing (milliseconds)
    #[serde(default = "default_scroll_settle_ms")]
    pub scroll_settle_ms: u64,

    /// Distance scrolled back up to retrigger lazy loaders (pixels)
    #[serde(default = "default_scroll_back_px")]
    pub scroll_back_px: i64,

    /// Wait after scrolling back up (milliseconds)
    #[serde(default = "default_scroll_retrigger_ms")]
    pub scroll_retrigger_ms: u64,

    /// Wait after the second scroll to the bottom (milliseconds)
    #[serde(default = "default_scroll_final_ms")]
    pub scroll_final_ms: u64,

    /// Wait after clicking a "load more" button (milliseconds)
    #[serde(default = "default_load_more_settle_ms")]
    pub load_more_settle_ms: u64,

    /// Consecutive no-growth iterations before pagination gives up
    #[serde(default = "default_stall_limit")]
    pub stall_limit: u32,

    /// Hard cap on pagination iterations per listing
    #[serde(default = "default_max_scroll_iterations")]
    pub max_scroll_iterations: u32,

    /// Longest wait for the URL to change after a swatch click (milliseconds)
    #[serde(default = "default_swatch_settle_ms")]
    pub swatch_settle_ms: u64,

    /// Extra wait for labels to re-render once the URL changed (milliseconds)
    #[serde(default = "default_text_settle_ms")]
    pub text_settle_ms: u64,

    /// Interval between URL polls while a swatch settles (milliseconds)
    #[serde(default = "default_url_poll_ms")]
    pub url_poll_ms: u64,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Link manifest written by discovery and read by extraction
    #[serde(default = "default_manifest_path")]
    pub manifest_path: String,

    /// Append-only JSONL file of product records
    #[serde(default = "default_records_path")]
    pub records_path: String,

    /// Persistent run log
    #[serde(default = "default_log_path")]
    pub log_path: String,

    /// Rendered HTML report
    #[serde(default = "default_report_path")]
    pub report_path: String,
}

impl BrowserConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn selector_timeout(&self) -> Duration {
        Duration::from_millis(self.selector_timeout_ms)
    }
}

impl CrawlerConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn swatch_settle(&self) -> Duration {
        Duration::from_millis(self.swatch_settle_ms)
    }

    pub fn text_settle(&self) -> Duration {
        Duration::from_millis(self.text_settle_ms)
    }

    pub fn url_poll(&self) -> Duration {
        Duration::from_millis(self.url_poll_ms)
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            args: default_browser_args(),
            executable: None,
            blocked_resource_types: default_blocked_resource_types(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
            selector_timeout_ms: default_selector_timeout_ms(),
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            max_retries: 0,
            retry_delay_ms: default_retry_delay_ms(),
            scroll_settle_ms: default_scroll_settle_ms(),
            scroll_back_px: default_scroll_back_px(),
            scroll_retrigger_ms: default_scroll_retrigger_ms(),
            scroll_final_ms: default_scroll_final_ms(),
            load_more_settle_ms: default_load_more_settle_ms(),
            stall_limit: default_stall_limit(),
            max_scroll_iterations: default_max_scroll_iterations(),
            swatch_settle_ms: default_swatch_settle_ms(),
            text_settle_ms: default_text_settle_ms(),
            url_poll_ms: default_url_poll_ms(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            manifest_path: default_manifest_path(),
            records_path: default_records_path(),
            log_path: default_log_path(),
            report_path: default_report_path(),
        }
    }
}

impl SiteConfig {
    /// Site configuration with the default selectors for the given root
    pub fn with_root(catalog_root: &str) -> Self {
        Self {
            catalog_root: catalog_root.to_string(),
            category_link_selector: default_category_link_selector(),
            category_path_filter: default_category_path_filter(),
            product_link_selector: default_product_link_selector(),
            total_count_selector: default_total_count_selector(),
            page_size_param: default_page_size_param(),
            page_size_hint: default_page_size_hint(),
            swatch_selector: default_swatch_selector(),
            indicator_selector: default_indicator_selector(),
            color_text_selector: default_color_text_selector(),
            list_price_selector: default_list_price_selector(),
            sale_price_selector: default_sale_price_selector(),
            variant_param: default_variant_param(),
            load_more_labels: default_load_more_labels(),
            name_separator: default_name_separator(),
        }
    }
}

fn default_category_link_selector() -> String {
    r#"a[data-testid="swiper-item"]"#.to_string()
}

fn default_category_path_filter() -> String {
    "/en/clothing".to_string()
}

fn default_product_link_selector() -> String {
    r#"a[href*="/en/product"]"#.to_string()
}

fn default_total_count_selector() -> String {
    r#"h1[data-testid="page-heading"] ~ sup"#.to_string()
}

fn default_page_size_param() -> String {
    "lastViewed".to_string()
}

fn default_page_size_hint() -> u32 {
    300
}

fn default_swatch_selector() -> String {
    r#"[data-testid="color-swatches"] button"#.to_string()
}

fn default_indicator_selector() -> String {
    r#"div[data-design-system="indicator"]"#.to_string()
}

fn default_color_text_selector() -> String {
    r#"[data-testid="product-color-text"]"#.to_string()
}

fn default_list_price_selector() -> String {
    r#"[data-testid="product-list-price-text"]"#.to_string()
}

fn default_sale_price_selector() -> String {
    r#"p[data-testid="product-list-sale-text"]"#.to_string()
}

fn default_variant_param() -> String {
    "color".to_string()
}

fn default_load_more_labels() -> Vec<String> {
    vec!["Load More".to_string(), "Show More".to_string()]
}

fn default_name_separator() -> String {
    "—".to_string()
}

fn default_headless() -> bool {
    true
}

fn default_browser_args() -> Vec<String> {
    vec!["--disable-blink-features=AutomationControlled".to_string()]
}

fn default_blocked_resource_types() -> Vec<String> {
    vec!["image".to_string(), "font".to_string(), "media".to_string()]
}

fn default_navigation_timeout_ms() -> u64 {
    60_000
}

fn default_selector_timeout_ms() -> u64 {
    10_000
}

fn default_concurrency() -> u32 {
    5
}

fn default_retry_delay_ms() -> u64 {
    5_000
}

fn default_scroll_settle_ms() -> u64 {
    6_000
}

fn default_scroll_back_px() -> i64 {
    1_000
}

fn default_scroll_retrigger_ms() -> u64 {
    1_000
}

fn default_scroll_final_ms() -> u64 {
    3_000
}

fn default_load_more_settle_ms() -> u64 {
    3_000
}

fn default_stall_limit() -> u32 {
    2
}

fn default_max_scroll_iterations() -> u32 {
    200
}

fn default_swatch_settle_ms() -> u64 {
    2_000
}

fn default_text_settle_ms() -> u64 {
    250
}

fn default_url_poll_ms() -> u64 {
    100
}

fn default_manifest_path() -> String {
    "product_links.csv".to_string()
}

fn default_records_path() -> String {
    "product_details.jsonl".to_string()
}

fn default_log_path() -> String {
    "sweep.log".to_string()
}

fn default_report_path() -> String {
    "view.html".to_string()
}
