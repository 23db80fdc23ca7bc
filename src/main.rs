//! onion-checker main entry point
//!
//! This is the command-line interface for the onion directory reachability
//! checker.

use anyhow::{bail, Context};
use clap::Parser;
use onion_checker::config::{load_unvalidated_config_with_hash, validate, Config};
use onion_checker::crawler::crawl;
use onion_checker::storage::{JsonFileStore, SiteStore};
use onion_checker::CrawlPhase;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// onion-checker: sweeps an onion link directory for live sites
///
/// Walks the directory's listing pages through a Tor SOCKS proxy, probes
/// every listed .onion address, and records the ones that answer in a JSON
/// document.
#[derive(Parser, Debug)]
#[command(name = "onion-checker")]
#[command(version = "1.0.0")]
#[command(about = "Checks which onion sites in a directory are reachable", long_about = None)]
struct Cli {
    /// Path to an optional TOML configuration file
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// First listing page to check
    #[arg(long)]
    start_page: Option<u128>,

    /// Maximum number of listing pages to check
    #[arg(long)]
    max_pages: Option<u32>,

    /// Output file for accessible sites
    #[arg(long, value_name = "PATH")]
    output: Option<String>,

    /// Minimum delay between site probes, in seconds
    #[arg(long)]
    min_delay: Option<f64>,

    /// Maximum delay between site probes, in seconds
    #[arg(long)]
    max_delay: Option<f64>,

    /// Tor proxy host
    #[arg(long)]
    proxy_host: Option<String>,

    /// Tor proxy port
    #[arg(long)]
    proxy_port: Option<u16>,

    /// Log file, written alongside stdout
    #[arg(long, value_name = "PATH")]
    log_file: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show statistics from the output file and exit
    #[arg(long, conflicts_with = "export_summary")]
    stats: bool,

    /// Write a markdown summary of the output file to PATH and exit
    #[arg(long, value_name = "PATH", conflicts_with = "stats")]
    export_summary: Option<PathBuf>,
}

impl Cli {
    /// Applies command-line overrides on top of the loaded configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(page) = self.start_page {
            config.crawl.start_page = page;
        }
        if let Some(pages) = self.max_pages {
            config.crawl.max_pages = pages;
        }
        if let Some(output) = &self.output {
            config.output.sites_path = output.clone();
        }
        if let Some(min) = self.min_delay {
            config.crawl.min_delay_secs = min;
        }
        if let Some(max) = self.max_delay {
            config.crawl.max_delay_secs = max;
        }
        if let Some(host) = &self.proxy_host {
            config.proxy.host = host.clone();
        }
        if let Some(port) = self.proxy_port {
            config.proxy.port = port;
        }
        if let Some(log_file) = &self.log_file {
            config.output.log_path = log_file.clone();
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            let (config, hash) = load_unvalidated_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };
    cli.apply_overrides(&mut config);

    setup_logging(cli.verbose, cli.quiet, Path::new(&config.output.log_path));

    if let (Some(path), Some(hash)) = (&cli.config, &config_hash) {
        tracing::info!(
            "Configuration loaded from {} (hash: {})",
            path.display(),
            hash
        );
    }

    validate(&config).context("Invalid configuration")?;

    if cli.stats {
        handle_stats(&config)
    } else if let Some(path) = &cli.export_summary {
        handle_export_summary(&config, path)
    } else {
        handle_crawl(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Events go to stdout and, without ANSI colors, to `log_path`. If the log
/// file cannot be opened, logging continues on stdout only.
fn setup_logging(verbose: u8, quiet: bool, log_path: &Path) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("onion_checker=info,warn"),
            1 => EnvFilter::new("onion_checker=debug,info"),
            2 => EnvFilter::new("onion_checker=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    let (file_layer, file_error) = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
    {
        Ok(file) => {
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file));
            (Some(layer), None)
        }
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    if let Some(e) = file_error {
        eprintln!(
            "Could not open log file {}: {}; logging to stdout only",
            log_path.display(),
            e
        );
    }
}

/// Handles the --stats mode: summarizes the stored accessible sites
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use onion_checker::output::{print_summary, summarize};

    println!("Sites file: {}\n", config.output.sites_path);

    let store = JsonFileStore::new(&config.output.sites_path);
    let sites = store.load()?;

    print_summary(&summarize(&sites));

    Ok(())
}

/// Handles the --export-summary mode: writes a markdown table of the sites
fn handle_export_summary(config: &Config, output_path: &Path) -> anyhow::Result<()> {
    use onion_checker::output::generate_markdown_summary;

    println!("=== Exporting Accessible Sites ===\n");
    println!("Sites file: {}", config.output.sites_path);
    println!("Output: {}", output_path.display());
    println!();

    let store = JsonFileStore::new(&config.output.sites_path);
    let sites = store.load()?;

    tracing::info!("Generating markdown summary...");
    generate_markdown_summary(&sites, output_path)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    println!("✓ Summary exported to: {}", output_path.display());

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    tracing::info!("Directory: {}", config.directory.base_url);
    tracing::info!("Proxy: {}", config.proxy.url());
    tracing::info!("Output: {}", config.output.sites_path);
    tracing::info!(
        "Delays: {}-{}s between sites, {}-{}s between pages",
        config.crawl.min_delay_secs,
        config.crawl.max_delay_secs,
        config.crawl.min_page_delay_secs,
        config.crawl.max_page_delay_secs
    );

    let report = match crawl(config).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    if report.phase == CrawlPhase::Aborted {
        bail!("Tor connectivity check failed; nothing was crawled");
    }

    tracing::info!(
        "Crawl completed{}: {} accessible sites recorded",
        if report.interrupted { " (interrupted)" } else { "" },
        report.total_accessible
    );

    Ok(())
}
