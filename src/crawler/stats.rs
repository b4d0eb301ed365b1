//! Run statistics
//!
//! Each worker counts what it did; the master folds the per-worker counts
//! into one [`RunStats`] for the whole run.

use crate::session::PoolStats;
use std::time::Duration;

/// Counters kept by a single worker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Keys taken from the frontier
    pub attempted: usize,

    /// Keys that produced a value
    pub succeeded: usize,

    /// Keys dropped after a fetch error
    pub failed: usize,

    /// New keys this worker registered in the frontier
    pub discovered: usize,
}

/// Statistics for a complete run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Number of workers that finished
    pub workers: usize,

    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub discovered: usize,

    /// Keys registered in the frontier over the run
    pub frontier_size: usize,

    /// Wall-clock duration of the run
    pub elapsed: Duration,

    /// Session bookkeeping, when the run owned a session pool
    pub sessions: Option<PoolStats>,
}

impl RunStats {
    /// Folds one worker's counters into the run totals
    pub fn absorb(&mut self, worker: &WorkerStats) {
        self.workers += 1;
        self.attempted += worker.attempted;
        self.succeeded += worker.succeeded;
        self.failed += worker.failed;
        self.discovered += worker.discovered;
    }

    /// Share of attempted keys that succeeded, in percent
    pub fn success_rate(&self) -> f64 {
        if self.attempted > 0 {
            (self.succeeded as f64 / self.attempted as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Prints statistics to stderr in a formatted manner
///
/// Stdout is left alone so it can carry the run's JSON output.
pub fn print_statistics(stats: &RunStats) {
    eprintln!("=== Run Statistics ===\n");

    eprintln!("Overview:");
    eprintln!("  Workers: {}", stats.workers);
    eprintln!("  Keys in frontier: {}", stats.frontier_size);
    eprintln!("  Elapsed: {:.2}s", stats.elapsed.as_secs_f64());
    eprintln!();

    eprintln!("Fetches:");
    eprintln!("  Attempted: {}", stats.attempted);
    eprintln!(
        "  Succeeded: {} ({:.1}%)",
        stats.succeeded,
        stats.success_rate()
    );
    eprintln!("  Failed: {}", stats.failed);
    eprintln!("  Discovered: {}", stats.discovered);
    eprintln!();

    if let Some(sessions) = &stats.sessions {
        eprintln!("Sessions:");
        eprintln!("  Opened: {}", sessions.opened);
        eprintln!("  Closed: {}", sessions.closed);
        eprintln!();
    }
}
