//! Sumi-Swarm: a concurrent fetch-and-crawl toolkit
//!
//! This crate drains a set of keys (usually URLs) with a pool of concurrent
//! workers, optionally following links discovered along the way. Caching,
//! retrying and proxy rotation are layered around a single fetch abstraction
//! as composable decorators.

pub mod cache;
pub mod client;
pub mod config;
pub mod crawler;
pub mod html;
pub mod session;

use std::any::Any;
use thiserror::Error;

/// Main error type for run-level Sumi-Swarm operations
///
/// These errors abort run construction or the run itself. Per-key failures
/// are reported as [`FetchError`] and never escape a worker.
#[derive(Debug, Error)]
pub enum SwarmError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session pool error: {0}")]
    Session(#[from] session::SessionError),

    #[error("Worker task failed: {0}")]
    WorkerPanicked(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors produced by a client chain for a single key
///
/// A fetch error means "this key produced no result". Workers drop the key
/// and move on; the run itself is never aborted by one of these.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Proxy {proxy} failed for {url}: {source}")]
    Proxy {
        proxy: String,
        url: String,
        source: reqwest::Error,
    },

    #[error("Unexpected HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Invalid content type {content_type:?} for {url}")]
    ContentType {
        url: String,
        content_type: Option<String>,
    },

    #[error("No sessions left")]
    NoSessionLeft,

    /// The value was fetched but could not be persisted
    ///
    /// `value` holds the fetched value; see [`FetchError::into_unpersisted`].
    #[error("Cannot set key '{key}' to cache: {source}")]
    CacheWrite {
        key: String,
        source: cache::CacheError,
        value: Box<dyn Any + Send + Sync>,
    },

    #[error("Key '{key}' does not exist in cache")]
    NotCached { key: String },

    #[error("Key '{key}' is already cached")]
    AlreadyCached { key: String },

    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: ::url::ParseError,
    },

    #[error("Fetch rejected for '{key}': {reason}")]
    Rejected { key: String, reason: String },
}

impl FetchError {
    /// Returns true if the data was fetched but could not be persisted
    pub fn is_cache_write(&self) -> bool {
        matches!(self, Self::CacheWrite { .. })
    }

    /// Takes back the value a [`FetchError::CacheWrite`] carries
    ///
    /// Returns the error unchanged if it is another variant or holds a value
    /// of a different type.
    pub fn into_unpersisted<V: 'static>(self) -> std::result::Result<V, Self> {
        match self {
            Self::CacheWrite { key, source, value } => match value.downcast::<V>() {
                Ok(value) => Ok(*value),
                Err(value) => Err(Self::CacheWrite { key, source, value }),
            },
            other => Err(other),
        }
    }

    /// Transforms the value a [`FetchError::CacheWrite`] carries, leaving
    /// every other error untouched
    pub fn map_unpersisted<T, U>(self, f: impl FnOnce(T) -> U) -> Self
    where
        T: 'static,
        U: Send + Sync + 'static,
    {
        match self {
            Self::CacheWrite { key, source, value } => {
                let value: Box<dyn Any + Send + Sync> = match value.downcast::<T>() {
                    Ok(value) => Box::new(f(*value)),
                    Err(value) => value,
                };
                Self::CacheWrite { key, source, value }
            }
            other => other,
        }
    }

    /// Returns true if the failure signals an exhausted session pool rather
    /// than a problem with this particular request
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::NoSessionLeft)
    }

    /// Shorthand for a [`FetchError::Rejected`] failure
    pub fn rejected(key: impl ToString, reason: impl Into<String>) -> Self {
        Self::Rejected {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for run-level operations
pub type Result<T> = std::result::Result<T, SwarmError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use cache::{Cache, CacheError, FileCache, MemoryCache};
pub use client::{
    CacheClient, CacheOnlyClient, CacheSkipClient, Client, ImageClient, LinkCrawlerClient,
    RetryClient, WebByteClient, WebClient, WebTextClient,
};
pub use config::Config;
pub use crawler::{Crawled, Frontier, FrontierEmpty, Master, RunStats, Worker};
pub use session::{ProxyPool, ProxySessionPool, Session, SessionPool, SingleSessionPool};
