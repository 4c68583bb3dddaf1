//! HTTP adapter: fetches a source's raw items as JSON from its `feed_url`.
//!
//! The feed is whatever sits in front of the portal's HTML (an extractor
//! service, a cached export); this side only expects a JSON array of
//! [`RawItem`]s.

use std::time::Duration;

use async_trait::async_trait;
use regwatch_core::{RawItem, SourceDescriptor};
use tracing::{info, warn};

use crate::source::{SourceAdapter, SourceError};

const USER_AGENT: &str = concat!("regwatch/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared client for every HTTP source in a run.
pub fn http_client() -> Result<reqwest::Client, SourceError> {
    Ok(reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()?)
}

pub struct HttpSource {
    client: reqwest::Client,
    descriptor: SourceDescriptor,
    url: String,
}

impl HttpSource {
    /// `None` when the descriptor has no feed to fetch.
    pub fn new(client: reqwest::Client, descriptor: SourceDescriptor) -> Option<Self> {
        let url = descriptor.feed_url.clone()?.trim().to_string();
        if url.is_empty() {
            return None;
        }
        Some(Self {
            client,
            descriptor,
            url,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SourceAdapter for HttpSource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    async fn fetch(&self) -> Result<Vec<RawItem>, SourceError> {
        info!(source = %self.descriptor.id, url = %self.url, "fetching feed");
        let resp = self.client.get(&self.url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SourceError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let items: Vec<RawItem> = resp.json().await?;
        info!(source = %self.descriptor.id, count = items.len(), "fetched feed");
        Ok(items)
    }
}

/// One [`HttpSource`] per planned source that has a feed; the rest are
/// skipped with a warning.
pub fn http_sources(
    client: &reqwest::Client,
    plan: Vec<SourceDescriptor>,
) -> Vec<Box<dyn SourceAdapter>> {
    plan.into_iter()
        .filter_map(|descriptor| {
            let id = descriptor.id.clone();
            match HttpSource::new(client.clone(), descriptor) {
                Some(source) => Some(Box::new(source) as Box<dyn SourceAdapter>),
                None => {
                    warn!(source = %id, "no feed_url configured, skipping source");
                    None
                }
            }
        })
        .collect()
}
