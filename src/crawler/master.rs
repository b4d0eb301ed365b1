use crate::crawler::stats::RunStats;
use crate::crawler::worker::Worker;
use crate::SwarmError;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Instant;
use tokio::task::JoinSet;

/// Runs a set of workers concurrently and merges their results
pub struct Master<K, V> {
    workers: Vec<Worker<K, V>>,
}

impl<K, V> Master<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Send + 'static,
{
    pub fn new(workers: Vec<Worker<K, V>>) -> Self {
        Self { workers }
    }

    /// Runs every worker to completion and returns the merged results
    pub async fn run(self) -> Result<HashMap<K, V>, SwarmError> {
        Ok(self.run_with_stats().await?.0)
    }

    /// Runs every worker to completion
    ///
    /// Results are merged in completion order, so on a duplicate key the
    /// worker that finished last wins.
    ///
    /// # Returns
    ///
    /// * `Ok((results, stats))` - Every worker finished
    /// * `Err(SwarmError::WorkerPanicked)` - A worker task panicked; the
    ///   remaining workers were still run to completion first
    pub async fn run_with_stats(self) -> Result<(HashMap<K, V>, RunStats), SwarmError> {
        let started = Instant::now();
        let frontier = self.workers.first().map(|worker| worker.frontier().clone());

        tracing::info!("Starting {} workers", self.workers.len());

        let mut tasks = JoinSet::new();
        for (id, worker) in self.workers.into_iter().enumerate() {
            tasks.spawn(worker.with_id(id).run_with_stats());
        }

        let mut results = HashMap::new();
        let mut stats = RunStats::default();
        let mut failure = None;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((worker_results, worker_stats)) => {
                    results.extend(worker_results);
                    stats.absorb(&worker_stats);
                }
                Err(e) => {
                    tracing::error!("Worker task failed: {}", e);
                    failure.get_or_insert_with(|| e.to_string());
                }
            }
        }

        if let Some(message) = failure {
            return Err(SwarmError::WorkerPanicked(message));
        }

        stats.frontier_size = frontier.map_or(0, |frontier| frontier.len());
        stats.elapsed = started.elapsed();

        tracing::info!(
            "Run finished in {:.2}s: {} of {} keys succeeded",
            stats.elapsed.as_secs_f64(),
            stats.succeeded,
            stats.attempted
        );

        Ok((results, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::{EchoClient, ReduceStringClient, SlowClient};
    use crate::client::Client;
    use crate::crawler::Frontier;
    use crate::FetchError;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    fn frontier(keys: &[&str]) -> Arc<Frontier<String>> {
        Arc::new(Frontier::new(keys.iter().map(|k| k.to_string())))
    }

    #[tokio::test]
    async fn test_two_echo_workers_merge() {
        let frontier = frontier(&["key1", "key2", "key3"]);
        let workers = vec![
            Worker::simple(frontier.clone(), EchoClient),
            Worker::simple(frontier.clone(), EchoClient),
        ];

        let (results, stats) = Master::new(workers).run_with_stats().await.unwrap();

        let expected: HashMap<String, String> = ["key1", "key2", "key3"]
            .iter()
            .map(|k| (k.to_string(), k.to_string()))
            .collect();
        assert_eq!(results, expected);
        assert_eq!(stats.workers, 2);
        assert_eq!(stats.attempted, 3);
        assert_eq!(stats.frontier_size, 3);
        assert!(frontier.is_drained());
    }

    #[tokio::test]
    async fn test_crawler_workers_share_discoveries() {
        let frontier = frontier(&["abc", "asd"]);
        let workers = (0..3)
            .map(|_| Worker::crawler(frontier.clone(), ReduceStringClient))
            .collect();

        let (results, stats) = Master::new(workers).run_with_stats().await.unwrap();

        let mut keys: Vec<_> = results.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["a", "ab", "abc", "as", "asd"]);

        // Every key is processed exactly once across workers
        assert_eq!(stats.attempted, 6);
        assert_eq!(stats.discovered, 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_slow_workers_drain_frontier() {
        let keys: Vec<String> = (0..20).map(|i| format!("key{}", i)).collect();
        let frontier = Arc::new(Frontier::new(keys.clone()));
        let client = Arc::new(SlowClient(Duration::from_millis(10)));

        let workers = (0..4)
            .map(|_| {
                Worker::simple(frontier.clone(), client.clone())
                    .with_idle_poll(Duration::from_millis(5))
            })
            .collect();

        let results = Master::new(workers).run().await.unwrap();

        assert_eq!(results.len(), keys.len());
        assert_eq!(frontier.done_len(), keys.len());
    }

    struct PanicClient;

    #[async_trait]
    impl Client<String, String> for PanicClient {
        async fn fetch(&self, key: &String) -> Result<String, FetchError> {
            if key == "boom" {
                panic!("client exploded");
            }
            Ok(key.clone())
        }
    }

    #[tokio::test]
    async fn test_worker_panic_is_reported() {
        let frontier = frontier(&["boom", "fine1", "fine2"]);
        let workers = vec![
            Worker::simple(frontier.clone(), PanicClient),
            Worker::simple(frontier.clone(), PanicClient),
        ];

        let result = Master::new(workers).run().await;

        assert!(matches!(result, Err(SwarmError::WorkerPanicked(_))));
        // The panicking key was still acknowledged, so the survivor finished
        assert!(frontier.is_drained());
    }

    #[tokio::test]
    async fn test_no_workers() {
        let master: Master<String, String> = Master::new(Vec::new());
        let (results, stats) = master.run_with_stats().await.unwrap();
        assert!(results.is_empty());
        assert_eq!(stats.workers, 0);
    }
}
