use crate::client::Client;
use crate::{ConfigError, FetchError};
use async_trait::async_trait;
use std::num::NonZeroU32;

/// Retries the inner client up to a fixed number of attempts
///
/// Failures of all but the last attempt are swallowed; the last attempt's
/// error is returned untouched. Wrapped around a proxy-backed client, each
/// attempt samples a fresh session from the pool.
pub struct RetryClient<C> {
    client: C,
    retry_count: NonZeroU32,
}

impl<C> RetryClient<C> {
    /// Wraps `client` with `retry_count` total attempts
    ///
    /// # Returns
    ///
    /// * `Ok(RetryClient)` - `retry_count` is at least one
    /// * `Err(ConfigError::Validation)` - `retry_count` is zero
    pub fn new(client: C, retry_count: u32) -> Result<Self, ConfigError> {
        let retry_count = NonZeroU32::new(retry_count).ok_or_else(|| {
            ConfigError::Validation("retry_count must be greater than zero".to_string())
        })?;

        Ok(Self {
            client,
            retry_count,
        })
    }

    /// Total number of attempts made per key
    pub fn retry_count(&self) -> u32 {
        self.retry_count.get()
    }
}

#[async_trait]
impl<K, V, C> Client<K, V> for RetryClient<C>
where
    C: Client<K, V>,
    K: Sync,
    V: Send,
{
    async fn fetch(&self, key: &K) -> Result<V, FetchError> {
        for attempt in 1..self.retry_count.get() {
            match self.client.fetch(key).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::debug!("Attempt {}/{} failed: {}", attempt, self.retry_count, e);
                }
            }
        }

        self.client.fetch(key).await
    }
}
