//! Cache backends for the cache-aware clients
//!
//! This module provides:
//! - The [`Cache`] trait the cache decorators are written against
//! - [`FileCache`]: one file per key under a directory, addressed by key hash
//! - [`MemoryCache`]: an in-process map, mostly useful for tests and replay

mod file;
mod memory;

pub use file::FileCache;
pub use memory::MemoryCache;

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Key not found")]
    NotFound,

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Key-value storage consulted by the cache decorators
///
/// Implementations must be safe to share between workers.
#[async_trait]
pub trait Cache<K, V>: Send + Sync {
    /// Looks up a key
    ///
    /// Returns [`CacheError::NotFound`] on a miss.
    async fn get(&self, key: &K) -> CacheResult<V>;

    /// Stores a value for a key, replacing any previous value
    async fn set(&self, key: &K, value: &V) -> CacheResult<()>;
}

#[async_trait]
impl<K, V, C> Cache<K, V> for std::sync::Arc<C>
where
    C: Cache<K, V> + ?Sized,
    K: Sync,
    V: Sync,
{
    async fn get(&self, key: &K) -> CacheResult<V> {
        (**self).get(key).await
    }

    async fn set(&self, key: &K, value: &V) -> CacheResult<()> {
        (**self).set(key, value).await
    }
}
