use crate::config::types::{BrowserConfig, Config, CrawlerConfig, OutputConfig, SiteConfig};
use crate::ConfigError;
use url::Url;

/// Resource types the browser driver knows how to block
pub(crate) const BLOCKABLE_RESOURCE_TYPES: &[&str] = &["image", "font", "media", "stylesheet"];

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_browser_config(&config.browser)?;
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the site description
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let root = Url::parse(&config.catalog_root)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid catalog-root: {}", e)))?;

    if root.scheme() != "http" && root.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "catalog-root must be http(s), got '{}'",
            config.catalog_root
        )));
    }

    let selectors = [
        ("category-link-selector", &config.category_link_selector),
        ("product-link-selector", &config.product_link_selector),
        ("total-count-selector", &config.total_count_selector),
        ("swatch-selector", &config.swatch_selector),
        ("indicator-selector", &config.indicator_selector),
        ("color-text-selector", &config.color_text_selector),
        ("list-price-selector", &config.list_price_selector),
        ("sale-price-selector", &config.sale_price_selector),
    ];
    for (name, selector) in selectors {
        if selector.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    if config.variant_param.is_empty() {
        return Err(ConfigError::Validation(
            "variant-param cannot be empty".to_string(),
        ));
    }

    if config.name_separator.is_empty() {
        return Err(ConfigError::Validation(
            "name-separator cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates browser configuration
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    for resource_type in &config.blocked_resource_types {
        if !BLOCKABLE_RESOURCE_TYPES.contains(&resource_type.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Unknown resource type '{}' (expected one of: {})",
                resource_type,
                BLOCKABLE_RESOURCE_TYPES.join(", ")
            )));
        }
    }

    if config.navigation_timeout_ms < 1000 {
        return Err(ConfigError::Validation(format!(
            "navigation-timeout-ms must be >= 1000ms, got {}ms",
            config.navigation_timeout_ms
        )));
    }

    if config.selector_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "selector-timeout-ms must be >= 100ms, got {}ms",
            config.selector_timeout_ms
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 32 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 32, got {}",
            config.concurrency
        )));
    }

    if config.max_retries > 5 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be <= 5, got {}",
            config.max_retries
        )));
    }

    if config.stall_limit < 1 {
        return Err(ConfigError::Validation(
            "stall-limit must be >= 1".to_string(),
        ));
    }

    if config.max_scroll_iterations < config.stall_limit {
        return Err(ConfigError::Validation(format!(
            "max-scroll-iterations ({}) must be >= stall-limit ({})",
            config.max_scroll_iterations, config.stall_limit
        )));
    }

    if config.url_poll_ms == 0 {
        return Err(ConfigError::Validation(
            "url-poll-ms must be > 0".to_string(),
        ));
    }

    if config.scroll_back_px < 0 {
        return Err(ConfigError::Validation(format!(
            "scroll-back-px must be >= 0, got {}",
            config.scroll_back_px
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    let paths = [
        ("manifest-path", &config.manifest_path),
        ("records-path", &config.records_path),
        ("log-path", &config.log_path),
        ("report-path", &config.report_path),
    ];
    for (name, path) in paths {
        if path.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    if config.manifest_path == config.records_path {
        return Err(ConfigError::Validation(
            "manifest-path and records-path must differ".to_string(),
        ));
    }

    Ok(())
}
