//! Crawl frontier
//!
//! The frontier tracks every key ever registered for a run, which of them are
//! still waiting to be handed out, and which have been acknowledged as done.
//! A key that has been handed out but not yet acknowledged is "in flight";
//! that state is implicit and not tracked as its own set.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::futures::Notified;
use tokio::sync::Notify;

/// Transient "nothing to hand out right now" condition
///
/// Returned by [`Frontier::get`] when no key is pending. This can happen
/// while other workers still hold keys in flight, so callers should back off
/// and poll again rather than treat it as fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no pending keys in frontier")]
pub struct FrontierEmpty;

struct FrontierState<K> {
    all: HashSet<K>,
    pending: Vec<K>,
    done: HashSet<K>,
}

/// Shared work frontier for one run
///
/// Every operation is a single short critical section, so the frontier can be
/// shared between worker tasks running on different threads.
pub struct Frontier<K> {
    state: Mutex<FrontierState<K>>,
    changed: Notify,
}

impl<K> Frontier<K>
where
    K: Eq + Hash + Clone,
{
    /// Creates a frontier seeded with the deduplicated initial keys
    pub fn new(initial: impl IntoIterator<Item = K>) -> Self {
        let mut all = HashSet::new();
        let mut pending = Vec::new();

        for key in initial {
            if all.insert(key.clone()) {
                pending.push(key);
            }
        }

        Self {
            state: Mutex::new(FrontierState {
                all,
                pending,
                done: HashSet::new(),
            }),
            changed: Notify::new(),
        }
    }

    /// Registers a key
    ///
    /// Keys that were seen before (pending, in flight or done) are ignored.
    ///
    /// # Returns
    ///
    /// * `true` - The key was new and is now pending
    /// * `false` - The key was already known
    pub fn add(&self, key: K) -> bool {
        let added = {
            let mut state = self.lock();
            if state.all.insert(key.clone()) {
                state.pending.push(key);
                true
            } else {
                false
            }
        };

        if added {
            self.changed.notify_waiters();
        }
        added
    }

    /// Removes and returns an arbitrary pending key
    pub fn get(&self) -> Result<K, FrontierEmpty> {
        self.lock().pending.pop().ok_or(FrontierEmpty)
    }

    /// Marks a key as done
    ///
    /// Acknowledging a key that was never registered, or one that is already
    /// done, is a no-op.
    ///
    /// # Returns
    ///
    /// * `true` - The key transitioned to done
    /// * `false` - Unknown or already-done key
    pub fn ack(&self, key: &K) -> bool {
        let acked = {
            let mut state = self.lock();
            state.all.contains(key) && state.done.insert(key.clone())
        };

        if acked {
            self.changed.notify_waiters();
        }
        acked
    }

    /// Returns true once every registered key has been acknowledged
    pub fn is_drained(&self) -> bool {
        let state = self.lock();
        state.done.len() == state.all.len()
    }

    /// Returns a future that resolves on the next `add` or `ack`
    ///
    /// Call `enable()` on the pinned future before polling the frontier so
    /// that a change landing in between is not missed.
    pub fn changed(&self) -> Notified<'_> {
        self.changed.notified()
    }

    /// Number of keys ever registered
    pub fn len(&self) -> usize {
        self.lock().all.len()
    }

    /// Returns true if no key was ever registered
    pub fn is_empty(&self) -> bool {
        self.lock().all.is_empty()
    }

    /// Number of keys waiting to be handed out
    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }

    /// Number of acknowledged keys
    pub fn done_len(&self) -> usize {
        self.lock().done.len()
    }

    fn lock(&self) -> MutexGuard<'_, FrontierState<K>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
