//! FeedIngester: fetch the proxied feed, parse it, publish it to the player.

use std::future::Future;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::episode::Episode;
use crate::error::FeedError;
use crate::feed::parse_feed;
use crate::player::{AudioSink, PlayerState, PlayerSurface};

/// Characters of the body echoed to the debug log.
const BODY_PREVIEW_CHARS: usize = 400;

/// Where feed XML comes from.
pub trait FeedSource {
    fn fetch_xml(&self) -> impl Future<Output = Result<String, FeedError>> + Send;
}

/// Fetches the feed from the `/api/podcast` proxy over HTTP.
#[derive(Clone)]
pub struct HttpFeedSource {
    client: Client,
    url: String,
}

impl HttpFeedSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl FeedSource for HttpFeedSource {
    async fn fetch_xml(&self) -> Result<String, FeedError> {
        debug!("feed: GET {}", self.url);
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                FeedError::Network(format!("proxy timed out: {}", e))
            } else {
                FeedError::Network(format!("proxy unreachable: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Network(format!("proxy returned {}", status)));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.contains("xml") {
            warn!("feed: response is not XML (content-type {:?})", content_type);
        }

        let body = response
            .text()
            .await
            .map_err(|e| FeedError::Network(format!("failed to read feed body: {}", e)))?;
        info!("feed: received {} bytes from {}", body.len(), self.url);
        debug!(
            "feed: body starts with {:?}",
            body.chars().take(BODY_PREVIEW_CHARS).collect::<String>()
        );
        Ok(body)
    }
}

#[derive(Clone)]
pub struct FeedIngester<F> {
    source: F,
}

impl<F: FeedSource> FeedIngester<F> {
    pub fn new(source: F) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &F {
        &self.source
    }

    /// Fetch and parse, newest episode first. Does not touch any player.
    pub async fn fetch(&self) -> Result<Vec<Episode>, FeedError> {
        let xml = self.source.fetch_xml().await?;
        let episodes = parse_feed(&xml)?;
        info!("feed: {} episodes parsed", episodes.len());
        Ok(episodes)
    }

    /// Show the loading placeholder, fetch, then publish the episodes or the
    /// error message to `player`.
    pub async fn fetch_episodes<A, S>(&self, player: &mut PlayerState<A, S>)
    where
        A: AudioSink,
        S: PlayerSurface,
    {
        player.show_loading();
        let result = self.fetch().await;
        player.apply_feed(result);
    }
}
