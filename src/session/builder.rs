//! Session construction
//!
//! Every session in a pool is opened from the same [`SessionBuilder`], which
//! carries the user agent, timeouts, default headers and per-proxy cookies.

use crate::config::{SessionConfig, UserAgentConfig};
use crate::session::{Session, SessionError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use std::collections::HashMap;
use std::time::Duration;

/// Settings shared by every session a pool opens
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    user_agent: Option<String>,
    timeout: Duration,
    connect_timeout: Duration,
    headers: HeaderMap,
    cookies: HashMap<String, HeaderValue>,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self {
            user_agent: None,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            headers: HeaderMap::new(),
            cookies: HashMap::new(),
        }
    }
}

impl SessionBuilder {
    /// Builds session settings from configuration
    ///
    /// # Arguments
    ///
    /// * `user_agent` - Identification sent with every request
    /// * `config` - Timeouts, default headers and per-proxy cookies
    ///
    /// # Returns
    ///
    /// * `Ok(SessionBuilder)` - All headers and cookies are valid
    /// * `Err(SessionError::InvalidHeader)` - A header name or value is malformed
    pub fn from_config(
        user_agent: &UserAgentConfig,
        config: &SessionConfig,
    ) -> Result<Self, SessionError> {
        let mut builder = Self::default()
            .user_agent(user_agent.header_value())
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs));

        for (name, value) in &config.headers {
            builder = builder.header(name, value)?;
        }

        for (proxy, jar) in &config.cookies {
            let cookie = jar
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.cookie(proxy, &cookie)?;
        }

        Ok(builder)
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Adds a default header sent by every session
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, SessionError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| SessionError::InvalidHeader(format!("{}: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| SessionError::InvalidHeader(format!("{}: {}", name, e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Sets the `Cookie` header sent by the session bound to `proxy`
    pub fn cookie(mut self, proxy: &str, cookie: &str) -> Result<Self, SessionError> {
        let value = HeaderValue::from_str(cookie)
            .map_err(|e| SessionError::InvalidHeader(format!("cookie for {}: {}", proxy, e)))?;
        self.cookies.insert(proxy.to_string(), value);
        Ok(self)
    }

    /// Default headers the session for `proxy` would send
    pub fn headers_for(&self, proxy: Option<&str>) -> HeaderMap {
        let mut headers = self.headers.clone();
        if let Some(cookie) = proxy.and_then(|p| self.cookies.get(p)) {
            headers.insert(COOKIE, cookie.clone());
        }
        headers
    }

    /// Opens a session, routed through `proxy` when given
    pub fn build(&self, proxy: Option<&str>) -> Result<Session, SessionError> {
        let build_error = |source| SessionError::Build {
            proxy: proxy.unwrap_or("direct").to_string(),
            source,
        };

        let mut builder = reqwest::Client::builder()
            .default_headers(self.headers_for(proxy))
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .gzip(true)
            .brotli(true);

        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }

        if let Some(proxy) = proxy {
            let route = reqwest::Proxy::all(proxy_url(proxy)).map_err(build_error)?;
            builder = builder.proxy(route);
        }

        let client = builder.build().map_err(build_error)?;
        Ok(Session::new(proxy.map(str::to_string), client))
    }
}

/// Proxy identifiers without a scheme are plain HTTP proxies
fn proxy_url(proxy: &str) -> String {
    if proxy.contains("://") {
        proxy.to_string()
    } else {
        format!("http://{}", proxy)
    }
}
