//! Chrome DevTools Protocol driver
//!
//! Launches a Chromium-family browser through `chromiumoxide`, opens every
//! page inside its own browser context, and aborts blocked resource types
//! through Fetch-domain request interception.

use crate::config::BrowserConfig;
use crate::driver::{BrowserDriver, DriverError, DriverResult, PageDriver};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as LaunchConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EventRequestPaused, FailRequestParams,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, ResourceType};
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Interval between checks while waiting for a selector
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(100);

impl From<CdpError> for DriverError {
    fn from(err: CdpError) -> Self {
        DriverError::Protocol(err.to_string())
    }
}

/// Maps a failed `goto`, treating the protocol's own request timeout as a
/// navigation timeout
fn navigation_error(err: CdpError, url: &str, timeout: Duration) -> DriverError {
    match err {
        CdpError::Timeout => DriverError::NavigationTimeout {
            url: url.to_string(),
            timeout,
        },
        other => other.into(),
    }
}

/// Maps a configured resource type name onto its CDP enum
fn resource_type(name: &str) -> Option<ResourceType> {
    match name {
        "image" => Some(ResourceType::Image),
        "font" => Some(ResourceType::Font),
        "media" => Some(ResourceType::Media),
        "stylesheet" => Some(ResourceType::Stylesheet),
        _ => None,
    }
}

/// Quotes a value as a JavaScript string literal
fn js_str(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// A running browser process
pub struct ChromeBrowser {
    browser: Arc<Mutex<Browser>>,
    handler_task: JoinHandle<()>,
    blocked: Arc<Vec<ResourceType>>,
    closed: AtomicBool,
}

impl ChromeBrowser {
    /// Launches the browser described by `config`
    ///
    /// # Returns
    ///
    /// * `Ok(ChromeBrowser)` - Browser is running and its event loop is spawned
    /// * `Err(DriverError::Launch)` - No browser could be started
    pub async fn launch(config: &BrowserConfig) -> DriverResult<Self> {
        let blocked: Vec<ResourceType> = config
            .blocked_resource_types
            .iter()
            .filter_map(|name| resource_type(name))
            .collect();

        let mut builder = LaunchConfig::builder()
            .args(config.args.clone())
            .request_timeout(config.navigation_timeout());
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &config.executable {
            builder = builder.chrome_executable(executable);
        }
        if !blocked.is_empty() {
            builder = builder.enable_request_intercept();
        }
        let launch_config = builder.build().map_err(DriverError::Launch)?;

        let (browser, mut handler) = Browser::launch(launch_config)
            .await
            .map_err(|e| DriverError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("Browser event loop error: {}", e);
                }
            }
            tracing::debug!("Browser event loop finished");
        });

        tracing::info!(
            "Browser launched (headless: {}, blocking: {:?})",
            config.headless,
            config.blocked_resource_types
        );

        Ok(Self {
            browser: Arc::new(Mutex::new(browser)),
            handler_task,
            blocked: Arc::new(blocked),
            closed: AtomicBool::new(false),
        })
    }

    /// Aborts blocked resource types and lets everything else through
    async fn spawn_interceptor(&self, page: &Page) -> DriverResult<Option<JoinHandle<()>>> {
        if self.blocked.is_empty() {
            return Ok(None);
        }

        let mut paused = page.event_listener::<EventRequestPaused>().await?;
        let intercept_page = page.clone();
        let blocked = Arc::clone(&self.blocked);

        let task = tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                let outcome = if blocked.contains(&event.resource_type) {
                    intercept_page
                        .execute(FailRequestParams::new(
                            event.request_id.clone(),
                            ErrorReason::BlockedByClient,
                        ))
                        .await
                        .map(|_| ())
                } else {
                    intercept_page
                        .execute(ContinueRequestParams::new(event.request_id.clone()))
                        .await
                        .map(|_| ())
                };
                if let Err(e) = outcome {
                    tracing::trace!("Failed to resolve intercepted request: {}", e);
                }
            }
        });

        Ok(Some(task))
    }
}

#[async_trait]
impl BrowserDriver for ChromeBrowser {
    type Page = ChromePage;

    async fn open_page(&self) -> DriverResult<ChromePage> {
        let (page, context_id) = {
            let browser = self.browser.lock().await;
            let context_id = browser
                .execute(CreateBrowserContextParams::default())
                .await?
                .result
                .browser_context_id;

            let target = CreateTargetParams::builder()
                .url("about:blank")
                .browser_context_id(context_id.clone())
                .build()
                .map_err(DriverError::Protocol)?;

            (browser.new_page(target).await?, context_id)
        };

        let interceptor = self.spawn_interceptor(&page).await?;

        Ok(ChromePage {
            page,
            context_id,
            browser: Arc::clone(&self.browser),
            interceptor,
        })
    }

    async fn shutdown(&self) -> DriverResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let mut browser = self.browser.lock().await;
        let closed = browser.close().await;
        if let Err(e) = browser.wait().await {
            tracing::warn!("Failed to wait for browser exit: {}", e);
        }
        self.handler_task.abort();
        closed?;

        tracing::info!("Browser closed");
        Ok(())
    }
}

/// A page living in its own browser context
pub struct ChromePage {
    page: Page,
    context_id: BrowserContextId,
    browser: Arc<Mutex<Browser>>,
    interceptor: Option<JoinHandle<()>>,
}

impl ChromePage {
    /// Evaluates a script whose value is JSON-encoded in the page
    ///
    /// Round-tripping through `JSON.stringify` keeps `null` and arrays intact
    /// across the protocol boundary.
    async fn eval<T: DeserializeOwned>(&self, script: &str) -> DriverResult<T> {
        let params = EvaluateParams::builder()
            .expression(format!("JSON.stringify((() => {{ {} }})())", script))
            .return_by_value(true)
            .build()
            .map_err(DriverError::Script)?;
        let json: String = self
            .page
            .evaluate_expression(params)
            .await?
            .into_value()
            .map_err(|e| DriverError::Script(e.to_string()))?;
        serde_json::from_str(&json).map_err(|e| DriverError::Script(e.to_string()))
    }

    /// Clicks via the DOM when a pointer click cannot land on the element
    async fn force_click(&self, selector: &str, index: usize) -> DriverResult<()> {
        let script = format!(
            "const el = document.querySelectorAll({})[{}]; if (!el) return false; el.click(); return true;",
            js_str(selector),
            index
        );
        if self.eval::<bool>(&script).await? {
            Ok(())
        } else {
            Err(DriverError::MissingElement {
                selector: selector.to_string(),
                index,
            })
        }
    }
}

#[async_trait]
impl PageDriver for ChromePage {
    async fn navigate(&self, url: &str, timeout: Duration) -> DriverResult<()> {
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(result) => {
                result.map_err(|e| navigation_error(e, url, timeout))?;
                Ok(())
            }
            Err(_) => Err(DriverError::NavigationTimeout {
                url: url.to_string(),
                timeout,
            }),
        }
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> DriverResult<()> {
        let started = Instant::now();
        loop {
            if self.count(selector).await? > 0 {
                return Ok(());
            }
            if started.elapsed() >= timeout {
                return Err(DriverError::NotFound {
                    selector: selector.to_string(),
                    timeout,
                });
            }
            tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    async fn count(&self, selector: &str) -> DriverResult<usize> {
        let script = format!(
            "return document.querySelectorAll({}).length;",
            js_str(selector)
        );
        self.eval(&script).await
    }

    async fn count_within(
        &self,
        selector: &str,
        index: usize,
        inner: &str,
    ) -> DriverResult<usize> {
        let script = format!(
            "const el = document.querySelectorAll({})[{}]; return el ? el.querySelectorAll({}).length : 0;",
            js_str(selector),
            index,
            js_str(inner)
        );
        self.eval(&script).await
    }

    async fn attribute(
        &self,
        selector: &str,
        index: usize,
        name: &str,
    ) -> DriverResult<Option<String>> {
        let script = format!(
            "const el = document.querySelectorAll({})[{}]; return el ? el.getAttribute({}) : null;",
            js_str(selector),
            index,
            js_str(name)
        );
        self.eval(&script).await
    }

    async fn click(&self, selector: &str, index: usize) -> DriverResult<()> {
        let elements = self.page.find_elements(selector).await.unwrap_or_default();
        let Some(element) = elements.into_iter().nth(index) else {
            return Err(DriverError::MissingElement {
                selector: selector.to_string(),
                index,
            });
        };

        if let Err(e) = element.click().await {
            tracing::debug!("Pointer click on {}[{}] failed ({}), forcing", selector, index, e);
            self.force_click(selector, index).await?;
        }
        Ok(())
    }

    async fn inner_text(&self, selector: &str) -> DriverResult<Option<String>> {
        let script = format!(
            "const el = document.querySelector({}); return el ? el.innerText : null;",
            js_str(selector)
        );
        self.eval(&script).await
    }

    async fn all_inner_texts(&self, selector: &str) -> DriverResult<Vec<String>> {
        let script = format!(
            "return Array.from(document.querySelectorAll({}), el => el.innerText);",
            js_str(selector)
        );
        self.eval(&script).await
    }

    async fn is_visible(&self, selector: &str, index: usize) -> DriverResult<bool> {
        let script = format!(
            "const el = document.querySelectorAll({})[{}];
             if (!el) return false;
             const style = window.getComputedStyle(el);
             if (style.visibility === 'hidden' || style.display === 'none') return false;
             const rect = el.getBoundingClientRect();
             return rect.width > 0 && rect.height > 0;",
            js_str(selector),
            index
        );
        self.eval(&script).await
    }

    async fn hrefs(&self, selector: &str) -> DriverResult<Vec<String>> {
        let script = format!(
            "return Array.from(document.querySelectorAll({}), a => a.href).filter(Boolean);",
            js_str(selector)
        );
        self.eval(&script).await
    }

    async fn scroll_to_bottom(&self) -> DriverResult<()> {
        self.eval::<bool>("window.scrollTo(0, document.body.scrollHeight); return true;")
            .await?;
        Ok(())
    }

    async fn scroll_by(&self, dy: i64) -> DriverResult<()> {
        let script = format!("window.scrollBy(0, {}); return true;", dy);
        self.eval::<bool>(&script).await?;
        Ok(())
    }

    async fn current_url(&self) -> DriverResult<String> {
        self.eval("return window.location.href;").await
    }

    async fn close(&self) -> DriverResult<()> {
        if let Some(interceptor) = &self.interceptor {
            interceptor.abort();
        }

        let closed = self.page.clone().close().await;

        let browser = self.browser.lock().await;
        browser
            .execute(DisposeBrowserContextParams::new(self.context_id.clone()))
            .await?;

        closed?;
        Ok(())
    }
}
