//! Cache-aware client decorators
//!
//! Three policies are provided:
//!
//! | Client | Cached key | Missing key |
//! |--------|------------|-------------|
//! | [`CacheClient`] | return cached value | fetch, store, return |
//! | [`CacheOnlyClient`] | return cached value | fail with `NotCached` |
//! | [`CacheSkipClient`] | fail with `AlreadyCached` | fetch, store, return |
//!
//! A failed write always surfaces as [`FetchError::CacheWrite`] so callers can
//! tell "couldn't get the data" from "got it but couldn't persist it". The
//! error still holds the fetched value.

use crate::cache::{Cache, CacheError};
use crate::client::Client;
use crate::FetchError;
use async_trait::async_trait;
use std::fmt::Display;

/// Cache-through client: serves hits from the cache, fills it on a miss
pub struct CacheClient<C, S> {
    client: C,
    cache: S,
}

impl<C, S> CacheClient<C, S> {
    pub fn new(client: C, cache: S) -> Self {
        Self { client, cache }
    }
}

#[async_trait]
impl<K, V, C, S> Client<K, V> for CacheClient<C, S>
where
    C: Client<K, V>,
    S: Cache<K, V>,
    K: Display + Sync,
    V: Send + Sync + 'static,
{
    async fn fetch(&self, key: &K) -> Result<V, FetchError> {
        match self.cache.get(key).await {
            Ok(value) => {
                tracing::trace!("Cache hit for {}", key);
                return Ok(value);
            }
            Err(CacheError::NotFound) => {}
            Err(e) => tracing::warn!("Unreadable cache entry for {}, refetching: {}", key, e),
        }

        let value = self.client.fetch(key).await?;
        store(&self.cache, key, value).await
    }
}

/// Read-only replay client: never consults a transport
///
/// Useful to re-run a crawl against a previously populated cache.
pub struct CacheOnlyClient<S> {
    cache: S,
}

impl<S> CacheOnlyClient<S> {
    pub fn new(cache: S) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl<K, V, S> Client<K, V> for CacheOnlyClient<S>
where
    S: Cache<K, V>,
    K: Display + Sync,
    V: Send,
{
    async fn fetch(&self, key: &K) -> Result<V, FetchError> {
        match self.cache.get(key).await {
            Ok(value) => Ok(value),
            Err(CacheError::NotFound) => Err(FetchError::NotCached {
                key: key.to_string(),
            }),
            Err(e) => {
                tracing::warn!("Unreadable cache entry for {}: {}", key, e);
                Err(FetchError::NotCached {
                    key: key.to_string(),
                })
            }
        }
    }
}

/// Duplicate-work detector: refuses keys that are already cached
///
/// A key present in the cache fails with [`FetchError::AlreadyCached`];
/// anything else is fetched through the inner client and stored.
pub struct CacheSkipClient<C, S> {
    client: C,
    cache: S,
}

impl<C, S> CacheSkipClient<C, S> {
    pub fn new(client: C, cache: S) -> Self {
        Self { client, cache }
    }
}

#[async_trait]
impl<K, V, C, S> Client<K, V> for CacheSkipClient<C, S>
where
    C: Client<K, V>,
    S: Cache<K, V>,
    K: Display + Sync,
    V: Send + Sync + 'static,
{
    async fn fetch(&self, key: &K) -> Result<V, FetchError> {
        match self.cache.get(key).await {
            Ok(_) => {
                return Err(FetchError::AlreadyCached {
                    key: key.to_string(),
                })
            }
            Err(CacheError::NotFound) => {}
            Err(e) => tracing::warn!("Unreadable cache entry for {}, refetching: {}", key, e),
        }

        let value = self.client.fetch(key).await?;
        store(&self.cache, key, value).await
    }
}

/// Writes `value` back and hands it on; a failed write keeps the value
/// inside the error
async fn store<K, V, S>(cache: &S, key: &K, value: V) -> Result<V, FetchError>
where
    S: Cache<K, V>,
    K: Display + Sync,
    V: Send + Sync + 'static,
{
    match cache.set(key, &value).await {
        Ok(()) => Ok(value),
        Err(source) => Err(FetchError::CacheWrite {
            key: key.to_string(),
            source,
            value: Box::new(value),
        }),
    }
}
