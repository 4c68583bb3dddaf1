//! The adapter seam between site-specific extraction and the pipeline.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use regwatch_core::{RawItem, SourceDescriptor};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum SourceError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("source unavailable: {0}")]
    Unavailable(String),
}

/// One portal's extraction step. Returns raw items in listing order.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn descriptor(&self) -> &SourceDescriptor;

    async fn fetch(&self) -> Result<Vec<RawItem>, SourceError>;
}

/// In-memory adapter, used for tests and replaying captured listings.
pub struct StaticSource {
    descriptor: SourceDescriptor,
    items: Result<Vec<RawItem>, String>,
}

impl StaticSource {
    pub fn new(descriptor: SourceDescriptor, items: Vec<RawItem>) -> Self {
        Self {
            descriptor,
            items: Ok(items),
        }
    }

    /// An adapter whose every fetch fails with `reason`.
    pub fn failing(descriptor: SourceDescriptor, reason: impl Into<String>) -> Self {
        Self {
            descriptor,
            items: Err(reason.into()),
        }
    }
}

#[async_trait]
impl SourceAdapter for StaticSource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    async fn fetch(&self) -> Result<Vec<RawItem>, SourceError> {
        self.items
            .clone()
            .map_err(SourceError::Unavailable)
    }
}

/// Reads a JSON array of raw items from disk.
pub struct FileSource {
    descriptor: SourceDescriptor,
    path: PathBuf,
}

impl FileSource {
    pub fn new(descriptor: SourceDescriptor, path: impl Into<PathBuf>) -> Self {
        Self {
            descriptor,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SourceAdapter for FileSource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    async fn fetch(&self) -> Result<Vec<RawItem>, SourceError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SourceError::Io {
                path: self.path.clone(),
                source,
            })?;
        let items: Vec<RawItem> = serde_json::from_str(&text)?;
        debug!(path = %self.path.display(), count = items.len(), "read fixture items");
        Ok(items)
    }
}

/// One [`FileSource`] per planned source, reading `<dir>/<source id>.json`.
pub fn file_sources(dir: &Path, plan: Vec<SourceDescriptor>) -> Vec<Box<dyn SourceAdapter>> {
    plan.into_iter()
        .map(|descriptor| {
            let path = dir.join(format!("{}.json", descriptor.id));
            Box::new(FileSource::new(descriptor, path)) as Box<dyn SourceAdapter>
        })
        .collect()
}
