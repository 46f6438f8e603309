//! HTML report generation
//!
//! Records from every run are flattened to one row per color, keeping only
//! the latest line for each product, and rendered as a self-contained page
//! with a sortable and filterable Tabulator table.

use crate::output::traits::{OutputResult, ReportRow};
use crate::record::{ProductRecord, NOT_AVAILABLE};
use crate::storage::load_records;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;

const TABULATOR_VERSION: &str = "5.5.4";

/// Keeps the last record seen for each product URL
///
/// Later lines come from later runs, so they replace earlier ones. The
/// position of a product is that of its first appearance.
pub fn latest_records(records: Vec<ProductRecord>) -> Vec<ProductRecord> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut latest: Vec<ProductRecord> = Vec::new();

    for record in records {
        match positions.get(&record.product_url) {
            Some(&index) => latest[index] = record,
            None => {
                positions.insert(record.product_url.clone(), latest.len());
                latest.push(record);
            }
        }
    }

    latest
}

/// Flattens records into report rows, best discount first
///
/// Rows without a discount sort after every discounted row; ties keep
/// record order.
pub fn flatten_records(records: &[ProductRecord]) -> Vec<ReportRow> {
    let mut rows: Vec<ReportRow> = records
        .iter()
        .flat_map(|record| {
            record.variants().iter().map(|variant| ReportRow {
                link: record.product_url.clone(),
                color_code: variant.variant_code.clone(),
                color_name: variant.display_name.clone(),
                original_price: variant.list_price.text.clone(),
                sale_price: variant
                    .sale_price
                    .as_ref()
                    .map_or_else(|| NOT_AVAILABLE.to_string(), |price| price.text.clone()),
                sale_percent: variant.discount_fraction,
            })
        })
        .collect();

    rows.sort_by(|a, b| compare_discount(a.sale_percent, b.sale_percent));
    rows
}

/// Descending by discount, unknown discounts last
fn compare_discount(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Renders report rows as a standalone HTML page
///
/// # Arguments
///
/// * `rows` - Rows in display order
/// * `generated_at` - Timestamp shown in the page header
pub fn render_html(rows: &[ReportRow], generated_at: &str) -> OutputResult<String> {
    // Keep the data from closing the surrounding script element
    let data = serde_json::to_string(rows)?.replace("</", "<\\/");

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<title>Catalog Sweep Report</title>\n");
    html.push_str(&format!(
        "<link href=\"https://unpkg.com/tabulator-tables@{v}/dist/css/tabulator.min.css\" rel=\"stylesheet\">\n\
         <script src=\"https://unpkg.com/tabulator-tables@{v}/dist/js/tabulator.min.js\"></script>\n",
        v = TABULATOR_VERSION
    ));
    html.push_str(
        "<style>body{font-family:sans-serif;margin:2em}h1{margin-bottom:0}p.meta{color:#666}</style>\n",
    );
    html.push_str("</head>\n<body>\n");
    html.push_str("<h1>Catalog Sweep Report</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">{} colors, generated {}</p>\n",
        rows.len(),
        escape_html(generated_at)
    ));
    html.push_str("<div id=\"report\"></div>\n<script>\n");
    html.push_str(&format!("const rows = {};\n", data));
    html.push_str(
        r##"new Tabulator("#report", {
  data: rows,
  layout: "fitColumns",
  pagination: "local",
  paginationSize: 50,
  paginationSizeSelector: [20, 50, 100, 1000],
  initialSort: [{column: "sale_percent", dir: "desc"}],
  columns: [
    {title: "Link", field: "link", headerFilter: "input", formatter: "link", formatterParams: {target: "_blank"}},
    {title: "Color Code", field: "color_code", headerFilter: "input"},
    {title: "Color Name", field: "color_name", headerFilter: "input"},
    {title: "Original Price", field: "original_price", headerFilter: "input"},
    {title: "Sale Price", field: "sale_price", headerFilter: "input"},
    {title: "Sale %", field: "sale_percent", sorter: "number", hozAlign: "right",
     formatter: cell => cell.getValue() == null ? "" : (cell.getValue() * 100).toFixed(1) + "%"},
  ],
});
"##,
    );
    html.push_str("</script>\n</body>\n</html>\n");

    Ok(html)
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Reads the record file and writes the HTML report
///
/// # Arguments
///
/// * `records_path` - JSONL file written by extraction
/// * `report_path` - Where to write the page
///
/// # Returns
///
/// * `Ok(usize)` - Number of rows written
/// * `Err(OutputError)` - The record file could not be read or the page
///   could not be written
pub fn generate_report(records_path: &Path, report_path: &Path) -> OutputResult<usize> {
    let load = load_records(records_path)?;
    if load.skipped > 0 {
        tracing::warn!("Skipped {} unreadable record lines", load.skipped);
    }

    let records = latest_records(load.records);
    let rows = flatten_records(&records);
    tracing::info!("Rendering {} rows from {} products", rows.len(), records.len());

    let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let html = render_html(&rows, &generated_at)?;
    std::fs::write(report_path, html)?;

    Ok(rows.len())
}
