use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("corpus file {path} is not valid JSON: {source}")]
    CorruptCorpus {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("config file {path} is not valid JSON: {source}")]
    CorruptConfig {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("config file {0} is not a JSON object")]
    ConfigNotObject(PathBuf),

    #[error("JSON encode error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("could not replace {path}: {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
