//! Catalog-Sweep main entry point
//!
//! This is the command-line interface for the Catalog-Sweep price harvester.

use catalog_sweep::config::{load_config_with_hash, Config};
use catalog_sweep::crawler::{run_sweep, RunMode};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Catalog-Sweep: a variant price harvester for retail catalogs
///
/// Catalog-Sweep discovers every product of a catalog, reads the list and
/// sale price of each color through a real browser, and appends the results
/// to a JSONL file that can be turned into a sortable HTML report.
#[derive(Parser, Debug)]
#[command(name = "catalog-sweep")]
#[command(version)]
#[command(about = "A variant price harvester for retail catalogs", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Only discover product links and write the manifest
    #[arg(long, group = "mode")]
    discover_only: bool,

    /// Only extract products listed in an existing manifest
    #[arg(long, group = "mode")]
    extract_only: bool,

    /// Render the HTML report from existing records and exit
    #[arg(long, group = "mode")]
    report: bool,

    /// Show statistics from existing records and exit
    #[arg(long, group = "mode")]
    stats: bool,

    /// Validate config and show what would be swept without opening a browser
    #[arg(long, group = "mode")]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // The log file location comes from the config, so it is loaded first
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let _guard = setup_logging(cli.verbose, cli.quiet, Path::new(&config.output.log_path))?;
    tracing::info!(
        "Configuration loaded from {} (hash: {})",
        cli.config.display(),
        config_hash
    );

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.report {
        handle_report(&config)?;
    } else {
        let mode = if cli.discover_only {
            RunMode::DiscoverOnly
        } else if cli.extract_only {
            RunMode::ExtractOnly
        } else {
            RunMode::Full
        };
        handle_sweep(config, mode).await?;
    }

    Ok(())
}

/// Sets up console and file logging based on verbosity level
///
/// The returned guard flushes the file writer when dropped and must be held
/// until the process exits.
fn setup_logging(
    verbose: u8,
    quiet: bool,
    log_path: &Path,
) -> Result<WorkerGuard, Box<dyn std::error::Error>> {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_sweep=info,warn"),
            1 => EnvFilter::new("catalog_sweep=debug,info"),
            2 => EnvFilter::new("catalog_sweep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let log_dir = log_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(log_dir)?;
    let file_name = log_path
        .file_name()
        .ok_or("log-path must name a file")?;

    let (file_writer, guard) = non_blocking(rolling::never(log_dir, file_name));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(false),
        )
        .init();

    Ok(guard)
}

/// Handles the --dry-run mode: validates config and shows what would be swept
fn handle_dry_run(config: &Config) {
    println!("=== Catalog-Sweep Dry Run ===\n");

    println!("Site:");
    println!("  Catalog root: {}", config.site.catalog_root);
    println!("  Category filter: {}", config.site.category_path_filter);
    println!(
        "  Page size hint: {}={}",
        config.site.page_size_param, config.site.page_size_hint
    );
    println!("  Variant parameter: {}", config.site.variant_param);

    println!("\nBrowser:");
    println!("  Headless: {}", config.browser.headless);
    if let Some(executable) = &config.browser.executable {
        println!("  Executable: {}", executable);
    }
    println!(
        "  Blocked resources: {}",
        config.browser.blocked_resource_types.join(", ")
    );
    println!(
        "  Navigation timeout: {}ms",
        config.browser.navigation_timeout_ms
    );

    println!("\nCrawler:");
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!("  Max retries: {}", config.crawler.max_retries);
    println!("  Stall limit: {}", config.crawler.stall_limit);
    println!(
        "  Max scroll iterations: {}",
        config.crawler.max_scroll_iterations
    );

    println!("\nOutput:");
    println!("  Manifest: {}", config.output.manifest_path);
    println!("  Records: {}", config.output.records_path);
    println!("  Log: {}", config.output.log_path);
    println!("  Report: {}", config.output.report_path);

    println!("\n✓ Configuration is valid");
    match catalog_sweep::storage::read_manifest(Path::new(&config.output.manifest_path)) {
        Ok(links) => println!(
            "✓ Manifest lists {} products for --extract-only",
            links.len()
        ),
        Err(_) => println!("✓ No manifest yet; a full sweep would start with discovery"),
    }
}

/// Handles the --stats mode: shows statistics from the record file
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use catalog_sweep::output::{load_statistics, print_statistics};

    println!("Records: {}\n", config.output.records_path);

    let stats = load_statistics(Path::new(&config.output.records_path))?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --report mode: renders the HTML report
fn handle_report(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use catalog_sweep::output::generate_report;

    println!("=== Rendering Report ===\n");
    println!("Records: {}", config.output.records_path);
    println!("Output: {}", config.output.report_path);
    println!();

    let rows = generate_report(
        Path::new(&config.output.records_path),
        Path::new(&config.output.report_path),
    )?;

    println!("✓ {} rows written to: {}", rows, config.output.report_path);

    Ok(())
}

/// Handles the discovery and extraction phases
async fn handle_sweep(config: Config, mode: RunMode) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Starting sweep ({:?})", mode);

    match run_sweep(config, mode).await {
        Ok(summary) => {
            if let Some(discovered) = summary.discovered {
                tracing::info!("Discovered {} product links", discovered);
            }
            if let Some(report) = summary.report {
                tracing::info!(
                    "Saved {}/{} products ({} colors, {:.1}% success, {:.2} products/s)",
                    report.succeeded,
                    report.scheduled,
                    report.variants_written,
                    report.success_rate(),
                    report.rate()
                );
                for failed in &report.failed {
                    tracing::warn!(
                        "Dropped {} after {} attempt(s): {}",
                        failed.url,
                        failed.attempts,
                        failed.error
                    );
                }
            }
            tracing::info!("Sweep completed");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Sweep failed: {}", e);
            Err(e.into())
        }
    }
}
