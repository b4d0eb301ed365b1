//! Session-backed transport clients
//!
//! These clients sit at the bottom of a chain. Each request draws a random
//! session from the shared pool:
//!
//! | Outcome | Result |
//! |---------|--------|
//! | Pool exhausted | `FetchError::NoSessionLeft` |
//! | Proxy connection failure | proxy evicted, `FetchError::Proxy` |
//! | Any other transport error | `FetchError::Http` |
//!
//! Because the session is re-sampled per call, wrapping one of these in a
//! [`RetryClient`](crate::client::RetryClient) retries through a different
//! proxy whenever the pool has more than one.

use crate::client::Client;
use crate::session::SessionPool;
use crate::FetchError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::StatusCode;
use std::sync::Arc;

/// A fully read HTTP response
#[derive(Debug, Clone)]
pub struct WebResponse {
    /// Final URL after redirects
    pub url: String,

    /// HTTP status code
    pub status: StatusCode,

    /// Response headers
    pub headers: HeaderMap,

    /// Response body
    pub body: Vec<u8>,
}

impl WebResponse {
    /// Content-Type header value, if present and valid UTF-8
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    fn require_success(&self) -> Result<(), FetchError> {
        if self.status.is_success() {
            Ok(())
        } else {
            Err(FetchError::Status {
                url: self.url.clone(),
                status: self.status.as_u16(),
            })
        }
    }
}

/// Issues GET requests through a random session of the pool
#[derive(Clone)]
pub struct WebClient {
    pool: Arc<dyn SessionPool>,
}

impl WebClient {
    pub fn new(pool: Arc<dyn SessionPool>) -> Self {
        Self { pool }
    }

    /// Fetches `url` and reads the whole body
    ///
    /// The status code is not checked here; the typed clients below decide
    /// what counts as success.
    pub async fn get(&self, url: &str) -> Result<WebResponse, FetchError> {
        let session = self.pool.rand().map_err(|_| FetchError::NoSessionLeft)?;
        let proxy = session.proxy();

        tracing::debug!("GET {} via {}", url, proxy.unwrap_or("direct"));

        let classify = |source: reqwest::Error| match proxy {
            Some(proxy) if source.is_connect() => {
                tracing::warn!("Proxy {} failed for {}: {}", proxy, url, source);
                self.pool.pop(proxy);
                FetchError::Proxy {
                    proxy: proxy.to_string(),
                    url: url.to_string(),
                    source,
                }
            }
            _ => FetchError::Http {
                url: url.to_string(),
                source,
            },
        };

        let response = session.client().get(url).send().await.map_err(classify)?;

        let final_url = response.url().to_string();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(classify)?.to_vec();

        Ok(WebResponse {
            url: final_url,
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl Client<String, WebResponse> for WebClient {
    async fn fetch(&self, key: &String) -> Result<WebResponse, FetchError> {
        self.get(key).await
    }
}

/// Fetches a page as text, rejecting non-2xx responses
#[derive(Clone)]
pub struct WebTextClient {
    client: WebClient,
}

impl WebTextClient {
    pub fn new(pool: Arc<dyn SessionPool>) -> Self {
        Self {
            client: WebClient::new(pool),
        }
    }
}

#[async_trait]
impl Client<String, String> for WebTextClient {
    async fn fetch(&self, key: &String) -> Result<String, FetchError> {
        let response = self.client.get(key).await?;
        response.require_success()?;
        Ok(response.text())
    }
}

/// Fetches a resource as raw bytes, rejecting non-2xx responses
#[derive(Clone)]
pub struct WebByteClient {
    client: WebClient,
}

impl WebByteClient {
    pub fn new(pool: Arc<dyn SessionPool>) -> Self {
        Self {
            client: WebClient::new(pool),
        }
    }
}

#[async_trait]
impl Client<String, Vec<u8>> for WebByteClient {
    async fn fetch(&self, key: &String) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(key).await?;
        response.require_success()?;
        Ok(response.body)
    }
}

/// Fetches images: requires HTTP 200 and an `image/*` content type
#[derive(Clone)]
pub struct ImageClient {
    client: WebClient,
}

impl ImageClient {
    pub fn new(pool: Arc<dyn SessionPool>) -> Self {
        Self {
            client: WebClient::new(pool),
        }
    }
}

#[async_trait]
impl Client<String, Vec<u8>> for ImageClient {
    async fn fetch(&self, key: &String) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(key).await?;

        if response.status != StatusCode::OK {
            return Err(FetchError::Status {
                url: response.url,
                status: response.status.as_u16(),
            });
        }

        match response.content_type() {
            Some(content_type) if content_type.starts_with("image") => Ok(response.body),
            content_type => Err(FetchError::ContentType {
                url: response.url.clone(),
                content_type: content_type.map(str::to_string),
            }),
        }
    }
}
