use crate::session::{PoolStats, ProxyPool, Session, SessionBuilder, SessionError, SessionPool};
use rand::seq::IteratorRandom;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

struct PoolState {
    proxies: ProxyPool,
    sessions: HashMap<String, Session>,
    opened: usize,
    closed: usize,
    shut: bool,
}

impl PoolState {
    /// Draws a fresh proxy and removes it from the backing pool
    ///
    /// A drawn proxy is never drawn again, even if its session fails to open.
    fn take_proxy(&mut self) -> Option<String> {
        let proxy = self.proxies.rand().ok()?;
        self.proxies.pop(&proxy);
        Some(proxy)
    }

    fn insert(&mut self, proxy: String, session: Session) {
        self.sessions.insert(proxy, session);
        self.opened += 1;
    }
}

/// Bounded pool of proxied sessions
///
/// The pool opens up to `size` sessions, one per proxy drawn from the backing
/// [`ProxyPool`]. Evicting a proxy closes its session and opens at most one
/// replacement; once the proxy pool runs dry the session pool shrinks.
pub struct ProxySessionPool {
    builder: SessionBuilder,
    state: Mutex<PoolState>,
}

impl ProxySessionPool {
    /// Opens up to `size` sessions from `proxies`
    ///
    /// # Returns
    ///
    /// * `Ok(ProxySessionPool)` - Sessions opened (fewer than `size` if the
    ///   proxy pool is smaller)
    /// * `Err(SessionError)` - A session could not be opened
    pub fn new(
        proxies: ProxyPool,
        size: usize,
        builder: SessionBuilder,
    ) -> Result<Self, SessionError> {
        let mut state = PoolState {
            proxies,
            sessions: HashMap::new(),
            opened: 0,
            closed: 0,
            shut: false,
        };

        for _ in 0..size {
            let Some(proxy) = state.take_proxy() else {
                break;
            };
            let session = builder.build(Some(&proxy))?;
            state.insert(proxy, session);
        }

        tracing::info!(
            "Opened {} proxy sessions ({} spare proxies)",
            state.sessions.len(),
            state.proxies.len()
        );

        Ok(Self {
            builder,
            state: Mutex::new(state),
        })
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionPool for ProxySessionPool {
    fn rand(&self) -> Result<Session, SessionError> {
        self.lock()
            .sessions
            .values()
            .choose(&mut rand::rng())
            .cloned()
            .ok_or(SessionError::Exhausted)
    }

    fn pop(&self, proxy: &str) {
        let replacement = {
            let mut state = self.lock();
            if state.shut || state.sessions.remove(proxy).is_none() {
                return;
            }
            state.closed += 1;
            tracing::warn!("Evicted session for proxy {}", proxy);
            state.take_proxy()
        };

        let Some(replacement) = replacement else {
            tracing::warn!("No spare proxies, pool shrinks to {} sessions", self.len());
            return;
        };

        // Built without holding the lock; other workers keep sampling meanwhile
        let session = match self.builder.build(Some(&replacement)) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Failed to open replacement session: {}", e);
                return;
            }
        };

        let mut state = self.lock();
        if state.shut {
            // The pool closed while the replacement was being built
            state.opened += 1;
            state.closed += 1;
            return;
        }
        state.insert(replacement, session);
        tracing::debug!("Replacement session opened");
    }

    fn close(&self) -> PoolStats {
        let mut state = self.lock();
        state.shut = true;

        let open = state.sessions.len();
        state.sessions.clear();
        state.closed += open;

        tracing::debug!("Closed {} proxy sessions", open);
        PoolStats {
            opened: state.opened,
            closed: state.closed,
        }
    }

    fn len(&self) -> usize {
        self.lock().sessions.len()
    }
}

/// One direct session without a proxy
///
/// Eviction is a no-op: there is nothing to replace the session with.
pub struct SingleSessionPool {
    session: Mutex<Option<Session>>,
}

impl SingleSessionPool {
    pub fn new(builder: &SessionBuilder) -> Result<Self, SessionError> {
        Ok(Self {
            session: Mutex::new(Some(builder.build(None)?)),
        })
    }

    /// Direct session with default settings
    pub fn direct() -> Result<Self, SessionError> {
        Self::new(&SessionBuilder::default())
    }

    fn lock(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionPool for SingleSessionPool {
    fn rand(&self) -> Result<Session, SessionError> {
        self.lock().clone().ok_or(SessionError::Exhausted)
    }

    fn pop(&self, _proxy: &str) {}

    fn close(&self) -> PoolStats {
        self.lock().take();
        PoolStats {
            opened: 1,
            closed: 1,
        }
    }

    fn len(&self) -> usize {
        usize::from(self.lock().is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROXIES: [&str; 3] = ["127.0.0.1:8080", "127.0.0.2:8081", "127.0.0.3:8082"];

    #[test]
    fn test_proxy_session_pool_evicts_and_refills() {
        let pool =
            ProxySessionPool::new(ProxyPool::new(PROXIES), 2, SessionBuilder::default()).unwrap();
        assert_eq!(pool.len(), 2);

        // First eviction is replaced by the spare proxy
        let session = pool.rand().unwrap();
        let proxy = session.proxy().unwrap().to_string();
        assert!(PROXIES.contains(&proxy.as_str()));
        pool.pop(&proxy);
        assert_eq!(pool.len(), 2);

        // No spares left, the pool shrinks from here on
        let proxy = pool.rand().unwrap().proxy().unwrap().to_string();
        pool.pop(&proxy);
        assert_eq!(pool.len(), 1);

        let proxy = pool.rand().unwrap().proxy().unwrap().to_string();
        pool.pop(&proxy);
        assert!(pool.is_empty());
        assert!(matches!(pool.rand(), Err(SessionError::Exhausted)));

        let stats = pool.close();
        assert_eq!(stats, PoolStats { opened: 3, closed: 3 });
    }

    #[test]
    fn test_pop_unknown_proxy_is_ignored() {
        let pool = ProxySessionPool::new(
            ProxyPool::new(["127.0.0.1:8080"]),
            1,
            SessionBuilder::default(),
        )
        .unwrap();
        pool.pop("10.0.0.1:3128");
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_pool_smaller_than_size() {
        let pool = ProxySessionPool::new(
            ProxyPool::new(["127.0.0.1:8080"]),
            5,
            SessionBuilder::default(),
        )
        .unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.rand().unwrap().proxy(), Some("127.0.0.1:8080"));
    }

    #[test]
    fn test_close_closes_every_session_once() {
        let pool =
            ProxySessionPool::new(ProxyPool::new(PROXIES), 2, SessionBuilder::default()).unwrap();
        let proxy = pool.rand().unwrap().proxy().unwrap().to_string();
        pool.pop(&proxy);

        let stats = pool.close();
        assert_eq!(stats.opened, 3);
        assert_eq!(stats.closed, 3);

        // Closed pools hand out nothing and close nothing new
        assert!(matches!(pool.rand(), Err(SessionError::Exhausted)));
        assert_eq!(pool.close(), stats);
    }

    #[test]
    fn test_concurrent_evictions_keep_accounting() {
        let proxies: Vec<String> = (1..=40).map(|i| format!("127.0.0.{}:8080", i)).collect();
        let pool =
            ProxySessionPool::new(ProxyPool::new(proxies), 4, SessionBuilder::default()).unwrap();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..8 {
                        if let Ok(session) = pool.rand() {
                            if let Some(proxy) = session.proxy() {
                                pool.pop(proxy);
                            }
                        }
                    }
                });
            }
        });

        // Every eviction was refilled from the spares
        assert_eq!(pool.len(), 4);

        let stats = pool.close();
        assert_eq!(stats.opened, stats.closed);
        assert!(stats.opened > 4);
        assert!(stats.opened <= 36);
    }

    #[test]
    fn test_single_session_pool() {
        let pool = SingleSessionPool::direct().unwrap();

        let session = pool.rand().unwrap();
        assert_eq!(session.proxy(), None);
        pool.pop("anything");
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.rand().unwrap().proxy(), None);

        assert_eq!(pool.close(), PoolStats { opened: 1, closed: 1 });
        assert!(matches!(pool.rand(), Err(SessionError::Exhausted)));
        assert_eq!(pool.close(), PoolStats { opened: 1, closed: 1 });
    }
}
