//! Browser driver abstraction
//!
//! The crawl pipeline never talks to a browser directly. It drives pages
//! through [`PageDriver`] and obtains them from a [`BrowserDriver`], which
//! keeps the extraction logic testable against scripted fakes and leaves the
//! Chrome DevTools plumbing in [`chrome`].
//!
//! Elements are addressed by `(selector, index)` pairs in document order
//! rather than by handles, so a stale element simply stops resolving.

mod chrome;

pub use chrome::{ChromeBrowser, ChromePage};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a browser driver
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Navigation to {url} timed out after {timeout:?}")]
    NavigationTimeout { url: String, timeout: Duration },

    #[error("Selector `{selector}` not found within {timeout:?}")]
    NotFound { selector: String, timeout: Duration },

    #[error("No element #{index} for selector `{selector}`")]
    MissingElement { selector: String, index: usize },

    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Browser protocol error: {0}")]
    Protocol(String),

    #[error("Unexpected script result: {0}")]
    Script(String),
}

/// Result type for driver operations
pub type DriverResult<T> = Result<T, DriverError>;

/// One rendered page
///
/// Implementations must be usable from concurrent tasks; each page is only
/// ever driven by one worker at a time.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Loads a URL, failing with `NavigationTimeout` past `timeout`
    async fn navigate(&self, url: &str, timeout: Duration) -> DriverResult<()>;

    /// Waits until `selector` matches at least one element
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> DriverResult<()>;

    /// Number of elements matching `selector`
    async fn count(&self, selector: &str) -> DriverResult<usize>;

    /// Number of elements matching `inner` inside the `index`-th `selector` match
    async fn count_within(&self, selector: &str, index: usize, inner: &str)
        -> DriverResult<usize>;

    /// Attribute of the `index`-th match
    async fn attribute(&self, selector: &str, index: usize, name: &str)
        -> DriverResult<Option<String>>;

    /// Clicks the `index`-th match
    async fn click(&self, selector: &str, index: usize) -> DriverResult<()>;

    /// Rendered text of the first match, if any
    async fn inner_text(&self, selector: &str) -> DriverResult<Option<String>>;

    /// Rendered text of every match, in document order
    async fn all_inner_texts(&self, selector: &str) -> DriverResult<Vec<String>>;

    /// Whether the `index`-th match exists and is rendered visibly
    async fn is_visible(&self, selector: &str, index: usize) -> DriverResult<bool>;

    /// Resolved `href` of every matching anchor
    async fn hrefs(&self, selector: &str) -> DriverResult<Vec<String>>;

    /// Scrolls the window to the bottom of the document
    async fn scroll_to_bottom(&self) -> DriverResult<()>;

    /// Scrolls the window vertically by `dy` pixels
    async fn scroll_by(&self, dy: i64) -> DriverResult<()>;

    /// URL currently shown, including its query string
    async fn current_url(&self) -> DriverResult<String>;

    /// Closes the page and releases its browsing context
    async fn close(&self) -> DriverResult<()>;
}

/// Source of isolated pages
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    type Page: PageDriver;

    /// Opens a blank page in a fresh browsing context
    ///
    /// Cookies and storage of the new page are not shared with any other
    /// page, so state changed by clicking on one product never leaks into
    /// another.
    async fn open_page(&self) -> DriverResult<Self::Page>;

    /// Closes every page and terminates the browser
    async fn shutdown(&self) -> DriverResult<()>;
}
