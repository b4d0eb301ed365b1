use crate::client::Client;
use crate::crawler::frontier::{Frontier, FrontierEmpty};
use crate::crawler::stats::WorkerStats;
use crate::FetchError;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

/// Default upper bound on an idle worker's wait before it re-checks the frontier
pub const DEFAULT_IDLE_POLL: Duration = Duration::from_millis(50);

/// Result of a crawling fetch: the value plus keys discovered along the way
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crawled<K, V> {
    pub discovered: Vec<K>,
    pub value: V,
}

impl<K, V> Crawled<K, V> {
    pub fn new(discovered: Vec<K>, value: V) -> Self {
        Self { discovered, value }
    }
}

/// The fetch variant a worker was built with
enum Fetcher<K, V> {
    Simple(Box<dyn Client<K, V>>),
    Crawler(Box<dyn Client<K, Crawled<K, V>>>),
}

/// Acknowledges a key when dropped
///
/// Runs on success, on fetch failure, and while unwinding from a panic, so a
/// key taken from the frontier is always acknowledged.
struct AckGuard<'a, K>
where
    K: Eq + Hash + Clone,
{
    frontier: &'a Frontier<K>,
    key: &'a K,
}

impl<K> Drop for AckGuard<'_, K>
where
    K: Eq + Hash + Clone,
{
    fn drop(&mut self) {
        self.frontier.ack(self.key);
    }
}

/// One loop draining a shared frontier through a client chain
pub struct Worker<K, V> {
    id: usize,
    frontier: Arc<Frontier<K>>,
    fetcher: Fetcher<K, V>,
    idle_poll: Duration,
}

impl<K, V> Worker<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Send + 'static,
{
    /// Worker that stores `client.fetch(key)` for every key
    pub fn simple(frontier: Arc<Frontier<K>>, client: impl Client<K, V> + 'static) -> Self {
        Self::with_fetcher(frontier, Fetcher::Simple(Box::new(client)))
    }

    /// Worker that also feeds discovered keys back into the frontier
    pub fn crawler(
        frontier: Arc<Frontier<K>>,
        client: impl Client<K, Crawled<K, V>> + 'static,
    ) -> Self {
        Self::with_fetcher(frontier, Fetcher::Crawler(Box::new(client)))
    }

    fn with_fetcher(frontier: Arc<Frontier<K>>, fetcher: Fetcher<K, V>) -> Self {
        Self {
            id: 0,
            frontier,
            fetcher,
            idle_poll: DEFAULT_IDLE_POLL,
        }
    }

    /// Sets the upper bound on how long an idle worker waits for frontier
    /// changes before re-checking
    pub fn with_idle_poll(mut self, idle_poll: Duration) -> Self {
        self.idle_poll = idle_poll;
        self
    }

    /// Sets the identifier used in log lines
    pub fn with_id(mut self, id: usize) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn frontier(&self) -> &Arc<Frontier<K>> {
        &self.frontier
    }

    /// Runs until the frontier is drained and returns the successful results
    pub async fn run(self) -> HashMap<K, V> {
        self.run_with_stats().await.0
    }

    /// Like [`Worker::run`], also returning this worker's counters
    pub async fn run_with_stats(self) -> (HashMap<K, V>, WorkerStats) {
        let mut results = HashMap::new();
        let mut stats = WorkerStats::default();

        tracing::debug!("Worker {} started", self.id);

        loop {
            // Register for wakeups before looking, so a change that lands
            // between the check and the wait is not missed
            let changed = self.frontier.changed();
            tokio::pin!(changed);
            changed.as_mut().enable();

            if self.frontier.is_drained() {
                break;
            }

            match self.frontier.get() {
                Ok(key) => self.process(key, &mut results, &mut stats).await,
                Err(FrontierEmpty) => {
                    tracing::trace!("Worker {} idle", self.id);
                    let _ = tokio::time::timeout(self.idle_poll, changed).await;
                }
            }
        }

        tracing::info!(
            "Worker {} finished: {} attempted, {} succeeded, {} failed",
            self.id,
            stats.attempted,
            stats.succeeded,
            stats.failed
        );

        (results, stats)
    }

    async fn process(&self, key: K, results: &mut HashMap<K, V>, stats: &mut WorkerStats) {
        let _ack = AckGuard {
            frontier: &self.frontier,
            key: &key,
        };
        stats.attempted += 1;

        let outcome = match &self.fetcher {
            Fetcher::Simple(client) => keep_unpersisted(self.id, &key, client.fetch(&key).await),
            Fetcher::Crawler(client) => {
                keep_unpersisted(self.id, &key, client.fetch(&key).await).map(|crawled| {
                    for discovered in crawled.discovered {
                        if self.frontier.add(discovered) {
                            stats.discovered += 1;
                        }
                    }
                    crawled.value
                })
            }
        };

        match outcome {
            Ok(value) => {
                tracing::debug!("Worker {} fetched {:?}", self.id, key);
                results.insert(key.clone(), value);
                stats.succeeded += 1;
            }
            Err(e) => {
                stats.failed += 1;
                log_failure(self.id, &key, &e);
            }
        }
    }
}

/// Keeps a value that was fetched but could not be written to the cache
fn keep_unpersisted<K, T>(
    worker: usize,
    key: &K,
    outcome: Result<T, FetchError>,
) -> Result<T, FetchError>
where
    K: Debug,
    T: 'static,
{
    outcome.or_else(|error| {
        if !error.is_cache_write() {
            return Err(error);
        }
        tracing::warn!("Worker {} keeping uncached {:?}: {}", worker, key, error);
        error.into_unpersisted()
    })
}

fn log_failure<K: Debug>(worker: usize, key: &K, error: &FetchError) {
    if error.is_cache_write() || error.is_exhausted() {
        tracing::warn!("Worker {} dropped {:?}: {}", worker, key, error);
    } else {
        tracing::debug!("Worker {} dropped {:?}: {}", worker, key, error);
    }
}
