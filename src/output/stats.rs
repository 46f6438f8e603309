//! Statistics over the record file
//!
//! This module summarizes the latest record of every product: how many
//! colors were seen, how many are on sale and how deep the discounts go.

use crate::output::report::latest_records;
use crate::output::traits::OutputResult;
use crate::record::ProductRecord;
use crate::storage::load_records;
use std::path::Path;

/// Summary of extracted records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordStatistics {
    /// Distinct products
    pub products: usize,

    /// Colors across all products
    pub variants: usize,

    /// Colors with a discount above zero
    pub on_sale: usize,

    /// Deepest discount with its product URL and variant code
    pub best_discount: Option<(f64, String, String)>,

    /// Mean discount over the colors on sale
    pub mean_discount: Option<f64>,

    /// Record lines that could not be parsed
    pub skipped_lines: usize,
}

/// Computes statistics over already deduplicated records
pub fn compute_statistics(records: &[ProductRecord]) -> RecordStatistics {
    let mut stats = RecordStatistics {
        products: records.len(),
        ..RecordStatistics::default()
    };
    let mut discount_sum = 0.0;

    for record in records {
        for variant in record.variants() {
            stats.variants += 1;

            let Some(fraction) = variant.discount_fraction.filter(|f| *f > 0.0) else {
                continue;
            };
            stats.on_sale += 1;
            discount_sum += fraction;

            if stats
                .best_discount
                .as_ref()
                .map_or(true, |(best, _, _)| fraction > *best)
            {
                stats.best_discount = Some((
                    fraction,
                    record.product_url.clone(),
                    variant.variant_code.clone(),
                ));
            }
        }
    }

    if stats.on_sale > 0 {
        stats.mean_discount = Some(discount_sum / stats.on_sale as f64);
    }

    stats
}

/// Loads statistics from the record file
///
/// # Arguments
///
/// * `records_path` - JSONL file written by extraction
///
/// # Returns
///
/// * `Ok(RecordStatistics)` - Statistics over the latest record per product
/// * `Err(OutputError)` - The file could not be read
pub fn load_statistics(records_path: &Path) -> OutputResult<RecordStatistics> {
    let load = load_records(records_path)?;
    let records = latest_records(load.records);

    let mut stats = compute_statistics(&records);
    stats.skipped_lines = load.skipped;
    Ok(stats)
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &RecordStatistics) {
    println!("=== Record Statistics ===\n");

    println!("Overview:");
    println!("  Products: {}", stats.products);
    println!("  Colors: {}", stats.variants);

    let share = if stats.variants > 0 {
        (stats.on_sale as f64 / stats.variants as f64) * 100.0
    } else {
        0.0
    };
    println!("  Colors on sale: {} ({:.1}%)", stats.on_sale, share);
    println!();

    if let Some((fraction, url, code)) = &stats.best_discount {
        println!("Best discount: {:.1}% ({} color {})", fraction * 100.0, url, code);
    }
    if let Some(mean) = stats.mean_discount {
        println!("Mean discount: {:.1}%", mean * 100.0);
    }

    if stats.skipped_lines > 0 {
        println!("\nUnreadable lines skipped: {}", stats.skipped_lines);
    }
}
