use crate::UrlError;
use url::Url;

/// Canonicalizes a product or category URL
///
/// # Canonicalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an HTTP or HTTPS scheme with a host
/// 3. Remove the query string (variant selection, tracking, paging hints)
/// 4. Remove the fragment
///
/// Host case is normalized by the URL parser; the path is kept verbatim
/// since catalog paths are case-sensitive on some sites.
///
/// # Examples
///
/// ```
/// use catalog_sweep::url::canonicalize_url;
///
/// let url = canonicalize_url("https://Shop.Example.com/en/product/tee/123?color=1274#reviews").unwrap();
/// assert_eq!(url, "https://shop.example.com/en/product/tee/123");
/// ```
pub fn canonicalize_url(url_str: &str) -> Result<String, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost(url_str.to_string()));
    }

    url.set_query(None);
    url.set_fragment(None);

    Ok(url.to_string())
}

/// Checks whether a manifest line looks like an absolute web URL
pub fn is_absolute_http(line: &str) -> bool {
    line.starts_with("http")
}

/// Reads a query parameter carrying the selected variant
///
/// Returns `None` when the URL is unparsable, the parameter is missing, or
/// its value is blank.
pub fn variant_code_from_url(url_str: &str, param: &str) -> Option<String> {
    let url = match Url::parse(url_str) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!("Could not parse URL {}: {}", url_str, e);
            return None;
        }
    };

    url.query_pairs()
        .find(|(key, _)| key == param)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Appends a query parameter, keeping any existing query intact
///
/// Used to ask listing pages to render a larger page in one go.
pub fn with_query_hint(url_str: &str, key: &str, value: &str) -> Result<String, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;
    url.query_pairs_mut().append_pair(key, value);
    Ok(url.to_string())
}
