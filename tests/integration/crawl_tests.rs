//! Integration tests for extraction scheduling
//!
//! Every test runs the scheduler over the fake browser with virtual time, so
//! settle delays cost nothing.

use crate::fake::{product_url, swatch, test_config, FakeBrowser, FakeSite, LogCapture};
use catalog_sweep::config::Config;
use catalog_sweep::crawler::CrawlScheduler;
use catalog_sweep::state::CrawlReport;
use catalog_sweep::storage::{load_records, JsonlSink};
use std::path::Path;
use tempfile::TempDir;

/// Ten products with a mix of regular and discounted colors
fn catalog(count: usize) -> (FakeSite, Vec<String>) {
    let mut site = FakeSite::new();
    let mut urls = Vec::new();

    for i in 0..count {
        let url = product_url(&format!("item-{}", i));
        let swatches = vec![
            swatch(&format!("{}01", i), "Black", "$50.00", None),
            swatch(&format!("{}02", i), "Sand", "$50.00", Some("$40.00")),
        ];
        site = site.product(&url, swatches);
        urls.push(url);
    }

    (site, urls)
}

async fn run(
    browser: &FakeBrowser,
    records: &Path,
    config: &Config,
    urls: Vec<String>,
) -> CrawlReport {
    let sink = JsonlSink::open(records).unwrap();
    CrawlScheduler::new(browser, &sink, config).run(urls).await
}

fn sorted_lines(path: &Path) -> Vec<String> {
    let mut lines: Vec<String> = std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();
    lines.sort();
    lines
}

#[tokio::test(start_paused = true)]
async fn test_timeout_drops_only_that_product() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());

    let a = product_url("a");
    let b = product_url("b");
    let c = product_url("c");
    let site = FakeSite::new()
        .product(&a, vec![swatch("1", "Black", "$20.00", None)])
        .product(&b, vec![swatch("2", "Navy", "$30.00", Some("$15.00"))])
        .product(&c, vec![swatch("3", "Sand", "$40.00", None)])
        .timeout(&b, u32::MAX);
    let browser = FakeBrowser::new(site, &config);

    let (logs, _guard) = LogCapture::install();
    let records = temp.path().join("records.jsonl");
    let report = run(&browser, &records, &config, vec![a.clone(), b.clone(), c.clone()]).await;

    assert_eq!(report.scheduled, 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].url, b);

    let load = load_records(&records).unwrap();
    let mut urls: Vec<&str> = load.records.iter().map(|r| r.product_url.as_str()).collect();
    urls.sort();
    assert_eq!(urls, vec![a.as_str(), c.as_str()]);

    let errors: Vec<String> = logs
        .lines()
        .into_iter()
        .filter(|line| line.contains("ERROR"))
        .collect();
    assert_eq!(errors.len(), 1, "unexpected error lines: {:?}", errors);
    assert!(errors[0].contains(&b));
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_does_not_change_records() {
    let temp = TempDir::new().unwrap();
    let (site, urls) = catalog(10);

    let mut serial = test_config(temp.path());
    serial.crawler.concurrency = 1;
    let serial_browser = FakeBrowser::new(site, &serial);
    let serial_records = temp.path().join("serial.jsonl");
    run(&serial_browser, &serial_records, &serial, urls.clone()).await;

    let (site, _) = catalog(10);
    let mut parallel = test_config(temp.path());
    parallel.crawler.concurrency = 4;
    let parallel_browser = FakeBrowser::new(site, &parallel);
    let parallel_records = temp.path().join("parallel.jsonl");
    let report = run(&parallel_browser, &parallel_records, &parallel, urls).await;

    assert_eq!(report.succeeded, 10);
    assert_eq!(report.variants_written, 20);
    assert_eq!(sorted_lines(&serial_records), sorted_lines(&parallel_records));
    assert_eq!(serial_browser.stats.max_open(), 1);
    assert_eq!(parallel_browser.stats.max_open(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_every_page_is_closed() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());

    let (site, mut urls) = catalog(5);
    let broken = product_url("broken");
    let site = site.product(&broken, Vec::new());
    urls.insert(2, broken.clone());
    let browser = FakeBrowser::new(site, &config);

    let report = run(&browser, &temp.path().join("records.jsonl"), &config, urls).await;

    assert_eq!(report.succeeded, 5);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].url, broken);
    // One page per product, each closed again
    assert_eq!(browser.stats.opened(), 6);
    assert_eq!(browser.stats.closed(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_rerun_appends_after_existing_records() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());
    let records = temp.path().join("records.jsonl");

    let (site, urls) = catalog(2);
    let browser = FakeBrowser::new(site, &config);

    run(&browser, &records, &config, vec![urls[0].clone()]).await;
    let first_run = std::fs::read_to_string(&records).unwrap();
    assert_eq!(first_run.lines().count(), 1);

    run(&browser, &records, &config, vec![urls[1].clone()]).await;
    let content = std::fs::read_to_string(&records).unwrap();

    assert!(content.starts_with(&first_run));
    assert_eq!(content.lines().count(), 2);
    assert!(content.lines().nth(1).unwrap().contains(&urls[1]));
}

#[tokio::test(start_paused = true)]
async fn test_navigation_timeout_is_retried_when_enabled() {
    let temp = TempDir::new().unwrap();
    let mut config = test_config(temp.path());
    config.crawler.max_retries = 1;

    let slow = product_url("slow");
    let site = FakeSite::new()
        .product(&slow, vec![swatch("1", "Black", "$20.00", None)])
        .timeout(&slow, 1);
    let browser = FakeBrowser::new(site, &config);

    let report = run(&browser, &temp.path().join("records.jsonl"), &config, vec![slow.clone()]).await;

    assert_eq!(report.succeeded, 1);
    assert!(report.failed.is_empty());
    assert_eq!(browser.stats.navigations_to(&slow), 2);
    assert_eq!(browser.stats.opened(), browser.stats.closed());
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_not_retried_by_default() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());

    let slow = product_url("slow");
    let site = FakeSite::new()
        .product(&slow, vec![swatch("1", "Black", "$20.00", None)])
        .timeout(&slow, 1);
    let browser = FakeBrowser::new(site, &config);

    let report = run(&browser, &temp.path().join("records.jsonl"), &config, vec![slow.clone()]).await;

    assert_eq!(report.succeeded, 0);
    assert_eq!(report.failed[0].attempts, 1);
    assert_eq!(browser.stats.navigations_to(&slow), 1);
}

#[tokio::test(start_paused = true)]
async fn test_missing_swatches_are_not_retried() {
    let temp = TempDir::new().unwrap();
    let mut config = test_config(temp.path());
    config.crawler.max_retries = 3;

    let bare = product_url("bare");
    let site = FakeSite::new().product(&bare, Vec::new());
    let browser = FakeBrowser::new(site, &config);

    let report = run(&browser, &temp.path().join("records.jsonl"), &config, vec![bare.clone()]).await;

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].attempts, 1);
    assert_eq!(browser.stats.navigations_to(&bare), 1);
}

#[tokio::test(start_paused = true)]
async fn test_records_carry_prices_and_discounts() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());
    let records = temp.path().join("records.jsonl");

    let (site, urls) = catalog(1);
    let browser = FakeBrowser::new(site, &config);
    run(&browser, &records, &config, urls.clone()).await;

    let load = load_records(&records).unwrap();
    let record = &load.records[0];
    assert_eq!(record.product_url, urls[0]);
    assert_eq!(record.codes(), vec!["001", "002"]);

    let sand = record.get("002").unwrap();
    assert_eq!(sand.display_name, "Sand");
    assert_eq!(sand.list_price.text, "$50.00");
    assert_eq!(sand.sale_price.as_ref().unwrap().text, "$40.00");
    assert_eq!(sand.discount_fraction, Some(0.2));

    assert_eq!(record.get("001").unwrap().discount_fraction, None);
}

#[tokio::test(start_paused = true)]
async fn test_empty_queue_opens_no_pages() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());
    let browser = FakeBrowser::new(FakeSite::new(), &config);

    let report = run(&browser, &temp.path().join("records.jsonl"), &config, Vec::new()).await;

    assert_eq!(report.scheduled, 0);
    assert_eq!(report.completed(), 0);
    assert_eq!(browser.stats.opened(), 0);
}
