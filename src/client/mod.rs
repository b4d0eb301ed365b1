//! Fetch clients
//!
//! Everything a worker can call to turn a key into a value implements
//! [`Client`]. Policies are layered as decorators that wrap an inner client
//! of the same shape:
//!
//! - [`WebClient`] and friends: transport through a session pool
//! - [`CacheClient`], [`CacheOnlyClient`], [`CacheSkipClient`]: cache policies
//! - [`RetryClient`]: retry on failure
//! - [`LinkCrawlerClient`]: turns a page client into a link-discovering one
//!
//! ```no_run
//! use std::sync::Arc;
//! use sumi_swarm::client::{CacheClient, Client, RetryClient, WebTextClient};
//! use sumi_swarm::{MemoryCache, SingleSessionPool};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = Arc::new(SingleSessionPool::direct()?);
//! let client = RetryClient::new(
//!     CacheClient::new(WebTextClient::new(pool), MemoryCache::<String, String>::new()),
//!     3,
//! )?;
//! let body: String = client.fetch(&"https://example.com/".to_string()).await?;
//! # Ok(())
//! # }
//! ```

mod cache;
mod links;
mod retry;
mod web;

pub use cache::{CacheClient, CacheOnlyClient, CacheSkipClient};
pub use links::{LinkCrawlerClient, LinkScope};
pub use retry::RetryClient;
pub use web::{ImageClient, WebByteClient, WebClient, WebResponse, WebTextClient};

use crate::FetchError;
use async_trait::async_trait;
use std::sync::Arc;

/// A fetch capability: turns a key into a value or fails with [`FetchError`]
#[async_trait]
pub trait Client<K, V>: Send + Sync {
    async fn fetch(&self, key: &K) -> Result<V, FetchError>;
}

#[async_trait]
impl<K, V, C> Client<K, V> for Arc<C>
where
    C: Client<K, V> + ?Sized,
    K: Sync,
    V: Send,
{
    async fn fetch(&self, key: &K) -> Result<V, FetchError> {
        (**self).fetch(key).await
    }
}

#[async_trait]
impl<K, V, C> Client<K, V> for Box<C>
where
    C: Client<K, V> + ?Sized,
    K: Sync,
    V: Send,
{
    async fn fetch(&self, key: &K) -> Result<V, FetchError> {
        (**self).fetch(key).await
    }
}
