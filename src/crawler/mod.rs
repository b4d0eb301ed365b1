//! Concurrent work dispatch
//!
//! This module contains the engine that drains a set of keys:
//! - [`Frontier`]: all / pending / done bookkeeping shared by every worker
//! - [`Worker`]: one loop pulling keys, fetching them and feeding discoveries back
//! - [`Master`]: runs workers concurrently and merges their results
//!
//! [`run`] wires all of it, plus the session pool and client chain, from a
//! [`Config`].

mod frontier;
mod master;
mod stats;
mod worker;

pub use frontier::{Frontier, FrontierEmpty};
pub use master::Master;
pub use stats::{print_statistics, RunStats, WorkerStats};
pub use worker::{Crawled, Worker, DEFAULT_IDLE_POLL};

use crate::cache::FileCache;
use crate::client::{
    CacheClient, CacheOnlyClient, CacheSkipClient, Client, ImageClient, LinkCrawlerClient,
    LinkScope, RetryClient, WebByteClient, WebTextClient,
};
use crate::config::{validate_seeds, CachePolicy, ClientMode, Config};
use crate::session::{ProxyPool, ProxySessionPool, SessionBuilder, SessionPool, SingleSessionPool};
use crate::SwarmError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Values collected by a run, by client mode
#[derive(Debug, Clone)]
pub enum RunResults {
    /// Page bodies, keyed by URL
    Text(HashMap<String, String>),

    /// Raw bodies, keyed by URL
    Bytes(HashMap<String, Vec<u8>>),
}

impl RunResults {
    pub fn len(&self) -> usize {
        match self {
            Self::Text(results) => results.len(),
            Self::Bytes(results) => results.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything a completed run produced
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub results: RunResults,
    pub stats: RunStats,
}

/// Runs a complete fetch or crawl
///
/// This is the main entry point. It will:
/// 1. Open the session pool (proxied, or one direct session)
/// 2. Build the client chain: transport, cache policy, retry, and the link
///    crawler when crawling
/// 3. Seed a frontier with the configured seeds plus `seeds`
/// 4. Run the configured number of workers until the frontier is drained
/// 5. Close the session pool
///
/// # Arguments
///
/// * `config` - Validated configuration
/// * `seeds` - Extra seed URLs appended to the configured ones
///
/// # Returns
///
/// * `Ok(RunOutput)` - Results for every key that succeeded, plus statistics
/// * `Err(SwarmError)` - Run construction failed or a worker panicked
pub async fn run(
    config: &Config,
    seeds: impl IntoIterator<Item = String>,
) -> Result<RunOutput, SwarmError> {
    let seeds: Vec<String> = config.seeds.iter().cloned().chain(seeds).collect();
    let seeds = validate_seeds(&seeds)?;

    tracing::info!("Starting run with {} seeds: {}", seeds.len(), describe_chain(config));

    let pool = build_session_pool(config)?;
    let frontier = Arc::new(Frontier::new(seeds));

    let outcome = execute(config, pool.clone(), frontier).await;

    // Sessions are released whether or not the run succeeded
    let sessions = pool.close();
    tracing::info!(
        "Closed session pool ({} opened, {} closed)",
        sessions.opened,
        sessions.closed
    );

    let (results, mut stats) = outcome?;
    stats.sessions = Some(sessions);

    Ok(RunOutput { results, stats })
}

/// Builds the client chain for the configured mode and drains the frontier
async fn execute(
    config: &Config,
    pool: Arc<dyn SessionPool>,
    frontier: Arc<Frontier<String>>,
) -> Result<(RunResults, RunStats), SwarmError> {
    match config.client.mode {
        ClientMode::Text => {
            let client = with_policies(config, WebTextClient::new(pool))?;
            let workers = if config.workers.crawl {
                let scope = if config.workers.same_host {
                    LinkScope::SameHost
                } else {
                    LinkScope::AnyHost
                };
                let crawler = Arc::new(LinkCrawlerClient::new(client, scope));
                build_workers(config, || {
                    Worker::crawler(frontier.clone(), crawler.clone())
                })
            } else {
                build_workers(config, || Worker::simple(frontier.clone(), client.clone()))
            };
            let (results, stats) = Master::new(workers).run_with_stats().await?;
            Ok((RunResults::Text(results), stats))
        }
        ClientMode::Bytes | ClientMode::Image => {
            let client = if config.client.mode == ClientMode::Image {
                with_policies(config, ImageClient::new(pool))?
            } else {
                with_policies(config, WebByteClient::new(pool))?
            };
            let workers =
                build_workers(config, || Worker::simple(frontier.clone(), client.clone()));
            let (results, stats) = Master::new(workers).run_with_stats().await?;
            Ok((RunResults::Bytes(results), stats))
        }
    }
}

/// Human-readable description of the client chain a config produces
pub fn describe_chain(config: &Config) -> String {
    let transport = match config.client.mode {
        ClientMode::Text => "web-text",
        ClientMode::Bytes => "web-bytes",
        ClientMode::Image => "image",
    };

    let mut chain = match config.cache.policy {
        CachePolicy::None => transport.to_string(),
        CachePolicy::Through => format!("{} -> cache-through", transport),
        CachePolicy::Skip => format!("{} -> cache-skip", transport),
        CachePolicy::Only => "cache-only".to_string(),
    };
    chain.push_str(&format!(" -> retry({})", config.client.retry_count));

    if config.workers.crawl {
        chain.push_str(if config.workers.same_host {
            " -> link-crawler(same-host)"
        } else {
            " -> link-crawler(any-host)"
        });
    }

    chain
}

/// Opens the session pool described by the configuration
///
/// Without proxies, the pool holds one direct session.
pub fn build_session_pool(config: &Config) -> Result<Arc<dyn SessionPool>, SwarmError> {
    let builder = SessionBuilder::from_config(&config.user_agent, &config.session)?;

    if config.session.proxies.is_empty() {
        return Ok(Arc::new(SingleSessionPool::new(&builder)?));
    }

    let proxies = ProxyPool::new(config.session.proxies.iter().cloned());
    Ok(Arc::new(ProxySessionPool::new(
        proxies,
        config.session.pool_size,
        builder,
    )?))
}

/// Layers the configured cache policy and retry around a transport client
fn with_policies<C, V>(
    config: &Config,
    transport: C,
) -> Result<Arc<dyn Client<String, V>>, SwarmError>
where
    C: Client<String, V> + 'static,
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    let cache = || FileCache::new(config.cache.directory.clone().unwrap_or_default());

    let cached: Arc<dyn Client<String, V>> = match config.cache.policy {
        CachePolicy::None => Arc::new(transport),
        CachePolicy::Through => Arc::new(CacheClient::new(transport, cache())),
        CachePolicy::Only => Arc::new(CacheOnlyClient::new(cache())),
        CachePolicy::Skip => Arc::new(CacheSkipClient::new(transport, cache())),
    };

    Ok(Arc::new(RetryClient::new(cached, config.client.retry_count)?))
}

fn build_workers<V>(
    config: &Config,
    make: impl Fn() -> Worker<String, V>,
) -> Vec<Worker<String, V>>
where
    V: Send + 'static,
{
    let idle_poll = Duration::from_millis(config.workers.idle_poll_ms);
    (0..config.workers.count)
        .map(|_| make().with_idle_poll(idle_poll))
        .collect()
}
