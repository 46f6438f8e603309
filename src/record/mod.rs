//! Extracted product data
//!
//! This module defines the records produced by variant extraction and their
//! JSONL line format:
//!
//! ```json
//! {"product_url":"https://…","colors":[{"19420":{"color_text":"Black","original_price":"$100.00","sale_price":"$75.00","sale_percent":0.25}}]}
//! ```
//!
//! `colors` is an array of single-key objects so that variant order survives
//! tools that do not preserve object key order.

mod price;
mod product;

pub use price::{discount_fraction, parse_price, PriceText, NOT_AVAILABLE};
pub use product::{ProductRecord, VariantRecord};
