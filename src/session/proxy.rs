use crate::session::SessionError;
use rand::seq::IteratorRandom;
use std::collections::HashSet;

/// Set of proxies not yet assigned to a session
///
/// The pool only shrinks: proxies are removed as sessions are opened for
/// them and never come back.
#[derive(Debug, Clone, Default)]
pub struct ProxyPool {
    proxies: HashSet<String>,
}

impl ProxyPool {
    pub fn new<I, S>(proxies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            proxies: proxies.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns a uniformly random proxy without removing it
    pub fn rand(&self) -> Result<String, SessionError> {
        self.proxies
            .iter()
            .choose(&mut rand::rng())
            .cloned()
            .ok_or(SessionError::NoProxiesLeft)
    }

    /// Removes a proxy if present
    pub fn pop(&mut self, proxy: &str) {
        self.proxies.remove(proxy);
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }
}
