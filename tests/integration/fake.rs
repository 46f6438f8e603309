//! Scripted catalog served through the browser driver traits

use async_trait::async_trait;
use catalog_sweep::canonicalize_url;
use catalog_sweep::config::{Config, SiteConfig};
use catalog_sweep::driver::{BrowserDriver, DriverError, DriverResult, PageDriver};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

pub const ROOT: &str = "https://shop.example.com/en/clothing";

/// Simulated page load time
const LOAD_TIME: Duration = Duration::from_millis(50);

/// One color of a fake product; a sale price implies a discount badge
#[derive(Debug, Clone)]
pub struct FakeSwatch {
    pub code: String,
    pub name: String,
    pub list: String,
    pub sale: Option<String>,
}

pub fn swatch(code: &str, name: &str, list: &str, sale: Option<&str>) -> FakeSwatch {
    FakeSwatch {
        code: code.to_string(),
        name: name.to_string(),
        list: list.to_string(),
        sale: sale.map(str::to_string),
    }
}

pub fn product_url(slug: &str) -> String {
    format!("https://shop.example.com/en/product/{}", slug)
}

/// The catalog the fake browser serves
#[derive(Default)]
pub struct FakeSite {
    categories: Vec<String>,
    listings: HashMap<String, Vec<String>>,
    products: HashMap<String, Vec<FakeSwatch>>,
    timeouts: Mutex<HashMap<String, u32>>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn product(mut self, url: &str, swatches: Vec<FakeSwatch>) -> Self {
        self.products.insert(url.to_string(), swatches);
        self
    }

    /// A category listing every given product
    pub fn category(mut self, url: &str, products: &[String]) -> Self {
        self.categories.push(url.to_string());
        self.listings.insert(url.to_string(), products.to_vec());
        self
    }

    /// Makes the next `times` navigations to `url` time out
    pub fn timeout(self, url: &str, times: u32) -> Self {
        self.timeouts
            .lock()
            .unwrap()
            .insert(url.to_string(), times);
        self
    }
}

/// Counters shared between a fake browser and the test
#[derive(Default)]
pub struct BrowserStats {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub max_open: AtomicUsize,
    pub shutdowns: AtomicUsize,
    open_now: AtomicUsize,
    navigations: Mutex<Vec<String>>,
}

impl BrowserStats {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn max_open(&self) -> usize {
        self.max_open.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    /// Navigations whose canonical form is `url`
    pub fn navigations_to(&self, url: &str) -> usize {
        self.navigations
            .lock()
            .unwrap()
            .iter()
            .filter(|visited| canonicalize_url(visited).ok().as_deref() == Some(url))
            .count()
    }
}

pub struct FakeBrowser {
    site: Arc<FakeSite>,
    selectors: SiteConfig,
    pub stats: Arc<BrowserStats>,
}

impl FakeBrowser {
    pub fn new(site: FakeSite, config: &Config) -> Self {
        Self {
            site: Arc::new(site),
            selectors: config.site.clone(),
            stats: Arc::new(BrowserStats::default()),
        }
    }
}

#[async_trait]
impl BrowserDriver for FakeBrowser {
    type Page = FakePage;

    async fn open_page(&self) -> DriverResult<FakePage> {
        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        let open = self.stats.open_now.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_open.fetch_max(open, Ordering::SeqCst);

        Ok(FakePage {
            site: Arc::clone(&self.site),
            selectors: self.selectors.clone(),
            stats: Arc::clone(&self.stats),
            state: Mutex::new(PageState::default()),
        })
    }

    async fn shutdown(&self) -> DriverResult<()> {
        self.stats.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct PageState {
    url: String,
    selected: Option<usize>,
}

pub struct FakePage {
    site: Arc<FakeSite>,
    selectors: SiteConfig,
    stats: Arc<BrowserStats>,
    state: Mutex<PageState>,
}

impl FakePage {
    fn location(&self) -> String {
        let url = self.state.lock().unwrap().url.clone();
        canonicalize_url(&url).unwrap_or(url)
    }

    fn swatches(&self) -> Option<&Vec<FakeSwatch>> {
        self.site.products.get(&self.location())
    }

    fn selected(&self) -> Option<&FakeSwatch> {
        let index = self.state.lock().unwrap().selected?;
        self.swatches()?.get(index)
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn navigate(&self, url: &str, timeout: Duration) -> DriverResult<()> {
        self.stats.navigations.lock().unwrap().push(url.to_string());
        tokio::time::sleep(LOAD_TIME).await;

        let canonical = canonicalize_url(url).unwrap_or_else(|_| url.to_string());
        if let Some(remaining) = self.site.timeouts.lock().unwrap().get_mut(&canonical) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(DriverError::NavigationTimeout {
                    url: url.to_string(),
                    timeout,
                });
            }
        }

        let mut state = self.state.lock().unwrap();
        state.url = url.to_string();
        state.selected = None;
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> DriverResult<()> {
        if self.count(selector).await? > 0 {
            return Ok(());
        }
        Err(DriverError::NotFound {
            selector: selector.to_string(),
            timeout,
        })
    }

    async fn count(&self, selector: &str) -> DriverResult<usize> {
        let s = &self.selectors;
        let count = if selector == s.swatch_selector {
            self.swatches().map_or(0, Vec::len)
        } else if selector == s.category_link_selector {
            if self.location() == ROOT {
                self.site.categories.len()
            } else {
                0
            }
        } else if selector == s.product_link_selector {
            self.site.listings.get(&self.location()).map_or(0, Vec::len)
        } else if selector == s.sale_price_selector {
            self.selected().map_or(0, |sw| sw.sale.is_some() as usize)
        } else {
            0
        };
        Ok(count)
    }

    async fn count_within(&self, _selector: &str, index: usize, _inner: &str) -> DriverResult<usize> {
        Ok(self
            .swatches()
            .and_then(|swatches| swatches.get(index))
            .map_or(0, |sw| sw.sale.is_some() as usize))
    }

    async fn attribute(&self, _selector: &str, index: usize, name: &str) -> DriverResult<Option<String>> {
        if name != "aria-pressed" {
            return Ok(None);
        }
        let pressed = self.state.lock().unwrap().selected == Some(index);
        Ok(Some(pressed.to_string()))
    }

    async fn click(&self, selector: &str, index: usize) -> DriverResult<()> {
        let code = self
            .swatches()
            .filter(|_| selector == self.selectors.swatch_selector)
            .and_then(|swatches| swatches.get(index))
            .map(|sw| sw.code.clone())
            .ok_or_else(|| DriverError::MissingElement {
                selector: selector.to_string(),
                index,
            })?;

        let location = self.location();
        let mut state = self.state.lock().unwrap();
        state.selected = Some(index);
        state.url = format!("{}?{}={}", location, self.selectors.variant_param, code);
        Ok(())
    }

    async fn inner_text(&self, selector: &str) -> DriverResult<Option<String>> {
        let Some(swatch) = self.selected() else {
            return Ok(None);
        };
        if selector == self.selectors.list_price_selector {
            return Ok(Some(swatch.list.clone()));
        }
        if selector == self.selectors.sale_price_selector {
            return Ok(swatch.sale.clone());
        }
        Ok(None)
    }

    async fn all_inner_texts(&self, selector: &str) -> DriverResult<Vec<String>> {
        if selector == self.selectors.color_text_selector {
            return Ok(self.selected().map(|sw| vec![sw.name.clone()]).unwrap_or_default());
        }
        Ok(Vec::new())
    }

    async fn is_visible(&self, selector: &str, _index: usize) -> DriverResult<bool> {
        if selector == self.selectors.sale_price_selector {
            return Ok(self.selected().is_some_and(|sw| sw.sale.is_some()));
        }
        Ok(false)
    }

    async fn hrefs(&self, selector: &str) -> DriverResult<Vec<String>> {
        if selector == self.selectors.category_link_selector && self.location() == ROOT {
            return Ok(self.site.categories.clone());
        }
        if selector == self.selectors.product_link_selector {
            return Ok(self
                .site
                .listings
                .get(&self.location())
                .map(|products| products.iter().map(|p| format!("{}?color=1", p)).collect())
                .unwrap_or_default());
        }
        Ok(Vec::new())
    }

    async fn scroll_to_bottom(&self) -> DriverResult<()> {
        Ok(())
    }

    async fn scroll_by(&self, _dy: i64) -> DriverResult<()> {
        Ok(())
    }

    async fn current_url(&self) -> DriverResult<String> {
        Ok(self.state.lock().unwrap().url.clone())
    }

    async fn close(&self) -> DriverResult<()> {
        self.stats.closed.fetch_add(1, Ordering::SeqCst);
        self.stats.open_now.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Configuration writing every output file under `dir`
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config {
        site: SiteConfig::with_root(ROOT),
        browser: Default::default(),
        crawler: Default::default(),
        output: Default::default(),
    };
    config.output.manifest_path = dir.join("links.csv").display().to_string();
    config.output.records_path = dir.join("records.jsonl").display().to_string();
    config.output.log_path = dir.join("sweep.log").display().to_string();
    config.output.report_path = dir.join("view.html").display().to_string();
    config
}

/// In-memory log sink for asserting on emitted events
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Installs a subscriber writing here for the current thread
    pub fn install() -> (Self, DefaultGuard) {
        let capture = Self::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(capture.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
