//! URL handling module for Catalog-Sweep
//!
//! Product identity is the canonical URL: scheme, host and path only. The
//! helpers here canonicalize discovered links, read the selected variant
//! code back out of a product URL, and attach listing hints to category URLs.

mod normalize;

pub use normalize::{
    canonicalize_url, is_absolute_http, variant_code_from_url, with_query_hint,
};
