//! Sumi-Swarm main entry point
//!
//! This is the command-line interface for the Sumi-Swarm fetch-and-crawl toolkit.

use anyhow::Context;
use clap::Parser;
use serde_json::{Map, Value};
use std::path::PathBuf;
use sumi_swarm::config::{load_config_with_hash, CachePolicy, Config};
use sumi_swarm::crawler::{describe_chain, print_statistics, run, RunResults};
use tracing_subscriber::EnvFilter;

/// Sumi-Swarm: a concurrent fetch-and-crawl toolkit
///
/// Sumi-Swarm drains a set of URLs with a pool of concurrent workers,
/// optionally following discovered links, with caching, retries and proxy
/// rotation layered around every fetch.
#[derive(Parser, Debug)]
#[command(name = "sumi-swarm")]
#[command(version)]
#[command(about = "A concurrent fetch-and-crawl toolkit", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Additional seed URL (repeatable)
    #[arg(long = "seed", value_name = "URL")]
    seeds: Vec<String>,

    /// Write JSON results to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Validate config and show the planned run without fetching anything
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config, &cli.seeds);
        return Ok(());
    }

    handle_run(&config, cli.seeds, cli.output, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_swarm=info,warn"),
            1 => EnvFilter::new("sumi_swarm=debug,info"),
            2 => EnvFilter::new("sumi_swarm=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Logs go to stderr; stdout carries the JSON results
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows what would be fetched
fn handle_dry_run(config: &Config, extra_seeds: &[String]) {
    println!("=== Sumi-Swarm Dry Run ===\n");

    println!("Workers:");
    println!("  Count: {}", config.workers.count);
    println!("  Idle poll: {}ms", config.workers.idle_poll_ms);
    println!("  Crawl: {}", config.workers.crawl);
    if config.workers.crawl {
        println!("  Same host only: {}", config.workers.same_host);
    }

    println!("\nClient chain:");
    println!("  {}", describe_chain(config));
    if config.cache.policy != CachePolicy::None {
        println!(
            "  Cache directory: {}",
            config.cache.directory.as_deref().unwrap_or_default()
        );
    }

    println!("\nSessions:");
    if config.session.proxies.is_empty() {
        println!("  One direct session");
    } else {
        println!(
            "  Up to {} sessions over {} proxies",
            config.session.pool_size,
            config.session.proxies.len()
        );
    }
    println!(
        "  Timeouts: {}s total, {}s connect",
        config.session.timeout_secs, config.session.connect_timeout_secs
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    let seeds: Vec<&String> = config.seeds.iter().chain(extra_seeds).collect();
    println!("\nSeeds ({}):", seeds.len());
    for seed in &seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main run: fetches, writes JSON results and prints statistics
async fn handle_run(
    config: &Config,
    seeds: Vec<String>,
    output: Option<PathBuf>,
    quiet: bool,
) -> anyhow::Result<()> {
    let outcome = run(config, seeds).await.context("Run failed")?;

    let json = serde_json::to_string_pretty(&render_results(&outcome.results))?;
    match &output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write results to {}", path.display()))?;
            tracing::info!("Wrote {} results to {}", outcome.results.len(), path.display());
        }
        None => println!("{}", json),
    }

    if !quiet {
        print_statistics(&outcome.stats);
    }

    Ok(())
}

/// Text results map URL to body; byte results map URL to body length
fn render_results(results: &RunResults) -> Value {
    let map: Map<String, Value> = match results {
        RunResults::Text(results) => results
            .iter()
            .map(|(url, body)| (url.clone(), Value::from(body.as_str())))
            .collect(),
        RunResults::Bytes(results) => results
            .iter()
            .map(|(url, body)| (url.clone(), Value::from(body.len())))
            .collect(),
    };
    Value::Object(map)
}
