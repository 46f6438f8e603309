//! Integration tests for whole sweeps through the coordinator

use crate::fake::{product_url, swatch, test_config, FakeBrowser, FakeSite, ROOT};
use catalog_sweep::crawler::{Coordinator, RunMode};
use catalog_sweep::storage::{load_records, read_manifest};
use catalog_sweep::SweepError;
use std::path::Path;
use tempfile::TempDir;

fn small_catalog() -> (FakeSite, Vec<String>) {
    let tee = product_url("tee");
    let pants = product_url("pants");
    let hat = product_url("hat");

    let site = FakeSite::new()
        .category(&format!("{}/tops", ROOT), &[tee.clone(), hat.clone()])
        .category(&format!("{}/bottoms", ROOT), &[pants.clone(), tee.clone()])
        .product(
            &tee,
            vec![
                swatch("10", "White", "$25.00", None),
                swatch("11", "Black", "$25.00", Some("$20.00")),
            ],
        )
        .product(&pants, vec![swatch("20", "Khaki", "$60.00", None)])
        .product(&hat, vec![swatch("30", "Red", "$15.00", Some("$9.00"))]);

    (site, vec![tee, hat, pants])
}

#[tokio::test(start_paused = true)]
async fn test_full_sweep_discovers_then_extracts() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());
    let (site, expected) = small_catalog();
    let browser = FakeBrowser::new(site, &config);
    let stats = browser.stats.clone();
    let output = config.output.clone();

    let summary = Coordinator::new(config, browser)
        .run(RunMode::Full)
        .await
        .unwrap();

    assert_eq!(summary.discovered, Some(3));
    let report = summary.report.unwrap();
    assert_eq!(report.succeeded, 3);
    assert_eq!(report.variants_written, 4);

    let manifest = std::fs::read_to_string(&output.manifest_path).unwrap();
    assert!(manifest.starts_with("URL\n"));
    assert_eq!(
        read_manifest(Path::new(&output.manifest_path)).unwrap().into_vec(),
        expected
    );

    let load = load_records(Path::new(&output.records_path)).unwrap();
    assert_eq!(load.records.len(), 3);
    assert_eq!(stats.shutdowns(), 1);
    assert_eq!(stats.opened(), stats.closed());
}

#[tokio::test(start_paused = true)]
async fn test_discover_only_leaves_records_untouched() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());
    let (site, _) = small_catalog();
    let browser = FakeBrowser::new(site, &config);
    let output = config.output.clone();

    let summary = Coordinator::new(config, browser)
        .run(RunMode::DiscoverOnly)
        .await
        .unwrap();

    assert_eq!(summary.discovered, Some(3));
    assert!(summary.report.is_none());
    assert!(Path::new(&output.manifest_path).exists());
    assert!(!Path::new(&output.records_path).exists());
}

#[tokio::test(start_paused = true)]
async fn test_extract_only_schedules_each_manifest_url_once() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());
    let (site, urls) = small_catalog();
    let browser = FakeBrowser::new(site, &config);
    let stats = browser.stats.clone();

    std::fs::write(
        &config.output.manifest_path,
        format!(
            "URL\n{tee}\n{tee}?color=11\n{hat}\n\n{tee}#reviews\n",
            tee = urls[0],
            hat = urls[1]
        ),
    )
    .unwrap();

    let summary = Coordinator::new(config, browser)
        .run(RunMode::ExtractOnly)
        .await
        .unwrap();

    let report = summary.report.unwrap();
    assert_eq!(report.scheduled, 2);
    assert_eq!(report.succeeded, 2);
    assert_eq!(stats.navigations_to(&urls[0]), 1);
    assert_eq!(stats.navigations_to(&urls[1]), 1);
}

#[tokio::test(start_paused = true)]
async fn test_missing_manifest_is_fatal_and_browser_closed() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());
    let browser = FakeBrowser::new(FakeSite::new(), &config);
    let stats = browser.stats.clone();

    let result = Coordinator::new(config, browser)
        .run(RunMode::ExtractOnly)
        .await;

    assert!(matches!(result, Err(SweepError::ManifestRead { .. })));
    assert_eq!(stats.shutdowns(), 1);
    assert_eq!(stats.opened(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unopenable_sink_is_fatal() {
    let temp = TempDir::new().unwrap();
    let mut config = test_config(temp.path());
    let (site, urls) = small_catalog();

    std::fs::write(&config.output.manifest_path, format!("URL\n{}\n", urls[0])).unwrap();
    // A directory cannot be opened for appending
    let blocked = temp.path().join("records-dir");
    std::fs::create_dir(&blocked).unwrap();
    config.output.records_path = blocked.display().to_string();

    let browser = FakeBrowser::new(site, &config);
    let stats = browser.stats.clone();

    let result = Coordinator::new(config, browser)
        .run(RunMode::ExtractOnly)
        .await;

    assert!(matches!(result, Err(SweepError::SinkOpen { .. })));
    assert_eq!(stats.shutdowns(), 1);
    assert_eq!(stats.opened(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_catalog_root_fails_discovery() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());
    let site = FakeSite::new().timeout(ROOT, u32::MAX);
    let browser = FakeBrowser::new(site, &config);
    let stats = browser.stats.clone();
    let manifest = config.output.manifest_path.clone();

    let result = Coordinator::new(config, browser).run(RunMode::Full).await;

    assert!(result.unwrap_err().is_navigation_timeout());
    assert!(!Path::new(&manifest).exists());
    assert_eq!(stats.shutdowns(), 1);
    assert_eq!(stats.opened(), stats.closed());
}
