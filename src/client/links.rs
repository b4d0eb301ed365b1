use crate::client::Client;
use crate::crawler::Crawled;
use crate::html::extract_links;
use crate::FetchError;
use async_trait::async_trait;
use url::Url;

/// Which discovered links a [`LinkCrawlerClient`] reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkScope {
    /// Every http(s) link
    #[default]
    AnyHost,

    /// Only links on the same host as the page they were found on
    SameHost,
}

/// Crawler client that reports the links found in each fetched page
///
/// Wraps a text client; the page body is returned unchanged alongside the
/// discovered URLs.
pub struct LinkCrawlerClient<C> {
    client: C,
    scope: LinkScope,
}

impl<C> LinkCrawlerClient<C> {
    pub fn new(client: C, scope: LinkScope) -> Self {
        Self { client, scope }
    }

    fn crawl(&self, base: &Url, body: String) -> Crawled<String, String> {
        let discovered: Vec<String> = extract_links(&body, base)
            .into_iter()
            .filter(|link| match self.scope {
                LinkScope::AnyHost => true,
                LinkScope::SameHost => link.host_str() == base.host_str(),
            })
            .map(String::from)
            .collect();

        tracing::debug!("Discovered {} links on {}", discovered.len(), base);

        Crawled::new(discovered, body)
    }
}

#[async_trait]
impl<C> Client<String, Crawled<String, String>> for LinkCrawlerClient<C>
where
    C: Client<String, String>,
{
    async fn fetch(&self, key: &String) -> Result<Crawled<String, String>, FetchError> {
        let base = Url::parse(key).map_err(|source| FetchError::InvalidUrl {
            url: key.clone(),
            source,
        })?;

        match self.client.fetch(key).await {
            Ok(body) => Ok(self.crawl(&base, body)),
            // Links of a page that could not be cached are still reported
            Err(e) => Err(e.map_unpersisted(|body: String| self.crawl(&base, body))),
        }
    }
}
