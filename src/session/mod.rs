//! Session and proxy pools
//!
//! A session is a live HTTP client, optionally bound to a proxy. Transport
//! clients draw a random session per request from a [`SessionPool`]; when a
//! proxy misbehaves its session is evicted and, if the backing [`ProxyPool`]
//! still has proxies, replaced.
//!
//! # Components
//!
//! - [`ProxyPool`]: proxies not yet assigned to a session
//! - [`ProxySessionPool`]: bounded set of proxied sessions with eviction and refill
//! - [`SingleSessionPool`]: one direct session, never evicted
//! - [`SessionBuilder`]: shared settings used to open every session

mod builder;
mod pool;
mod proxy;

pub use builder::SessionBuilder;
pub use pool::{ProxySessionPool, SingleSessionPool};
pub use proxy::ProxyPool;

use thiserror::Error;

/// Errors raised by proxy and session pools
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No sessions left")]
    Exhausted,

    #[error("No proxies left")]
    NoProxiesLeft,

    #[error("Failed to open session for {proxy}: {source}")]
    Build {
        proxy: String,
        source: reqwest::Error,
    },

    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

/// A live transport session, optionally routed through a proxy
#[derive(Debug, Clone)]
pub struct Session {
    proxy: Option<String>,
    client: reqwest::Client,
}

impl Session {
    pub(crate) fn new(proxy: Option<String>, client: reqwest::Client) -> Self {
        Self { proxy, client }
    }

    /// The proxy this session is bound to, `None` for a direct session
    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    /// The underlying HTTP client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

/// Session bookkeeping reported when a pool is closed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Sessions opened over the pool's lifetime
    pub opened: usize,

    /// Sessions closed, by eviction or by closing the pool
    pub closed: usize,
}

/// A pool of sessions shared by transport clients
pub trait SessionPool: Send + Sync {
    /// Returns a uniformly random open session
    ///
    /// Fails with [`SessionError::Exhausted`] if no session is open.
    fn rand(&self) -> Result<Session, SessionError>;

    /// Evicts the session bound to `proxy`
    ///
    /// Pools that can refill try to open exactly one replacement session.
    /// Unknown proxies are ignored.
    fn pop(&self, proxy: &str);

    /// Closes every open session
    ///
    /// After closing, the pool reports exhaustion. Closing twice closes
    /// nothing new.
    fn close(&self) -> PoolStats;

    /// Number of currently open sessions
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
