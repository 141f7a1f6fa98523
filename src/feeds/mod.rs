use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::domain::entry::RawEntry;

pub mod atom;
pub mod rss;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to build HTTP client: {0}")]
    Build(String),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("document is neither RSS nor Atom: {0}")]
    Parse(String),
}

pub type FeedResult<T> = Result<T, FeedError>;

/// Source of raw entries for one feed URL.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch_entries(&self, feed_url: &str) -> FeedResult<Vec<RawEntry>>;
}

pub(crate) fn build_reqwest_client(timeout: Duration) -> FeedResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .map_err(|e| FeedError::Build(e.to_string()))
}

/// Parse a feed document, trying RSS first and Atom second.
pub fn parse_feed(bytes: &[u8]) -> FeedResult<Vec<RawEntry>> {
    let rss_error = match ::rss::Channel::read_from(bytes) {
        Ok(channel) => return Ok(rss::channel_entries(&channel)),
        Err(error) => error,
    };

    match ::atom_syndication::Feed::read_from(bytes) {
        Ok(feed) => Ok(atom::feed_entries(&feed)),
        Err(atom_error) => Err(FeedError::Parse(format!(
            "rss: {rss_error}; atom: {atom_error}"
        ))),
    }
}

/// HTTP fetcher that limits concurrent requests using a [`Semaphore`].
pub struct HttpFeedFetcher {
    client: reqwest::Client,
    semaphore: Arc<Semaphore>,
}

impl HttpFeedFetcher {
    /// `concurrency` controls how many requests may be in flight at the same
    /// time; `timeout` bounds each request.
    pub fn new(concurrency: usize, timeout: Duration) -> FeedResult<Self> {
        Ok(Self {
            client: build_reqwest_client(timeout)?,
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
        })
    }

    async fn fetch_bytes(&self, url: &str) -> FeedResult<Vec<u8>> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| FeedError::Build(e.to_string()))?;

        let request_error = |source| FeedError::Request {
            url: url.to_string(),
            source,
        };

        let res = self.client.get(url).send().await.map_err(request_error)?;
        if !res.status().is_success() {
            return Err(FeedError::Status {
                url: url.to_string(),
                status: res.status().as_u16(),
            });
        }
        let bytes = res.bytes().await.map_err(request_error)?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch_entries(&self, feed_url: &str) -> FeedResult<Vec<RawEntry>> {
        let bytes = self.fetch_bytes(feed_url).await?;
        parse_feed(&bytes)
    }
}
