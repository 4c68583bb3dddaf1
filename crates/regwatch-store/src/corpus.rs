//! File-backed corpus store.
//!
//! The corpus is a single JSON document rewritten whole on every mutation.
//! Mutating cycles (load → change → save) hold an exclusive advisory lock on
//! a sidecar `<corpus>.lock` file so an ingest and a moderation run started
//! close together cannot lose each other's writes.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use regwatch_core::{Corpus, Regulation, dedup_against, timestamp};
use tracing::{debug, info};

use crate::StoreError;
use crate::atomic::write_json;

/// Result of staging one ingest batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageSummary {
    /// Records handed to the store.
    pub offered: usize,
    /// Records that survived deduplication and were appended to `pending`.
    pub staged: usize,
}

impl StageSummary {
    pub fn duplicates(&self) -> usize {
        self.offered - self.staged
    }
}

pub struct CorpusStore {
    path: PathBuf,
}

impl CorpusStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the corpus. A missing file is an empty corpus; a file that does
    /// not parse is an error and is left untouched.
    pub fn load(&self) -> Result<Corpus, StoreError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no corpus file, starting empty");
                return Ok(Corpus::default());
            }
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };
        let corpus: Corpus =
            serde_json::from_str(&text).map_err(|source| StoreError::CorruptCorpus {
                path: self.path.clone(),
                source,
            })?;
        debug!(
            published = corpus.published.len(),
            pending = corpus.pending.len(),
            "loaded corpus"
        );
        Ok(corpus)
    }

    pub fn save(&self, corpus: &Corpus) -> Result<(), StoreError> {
        write_json(&self.path, corpus)?;
        info!(
            path = %self.path.display(),
            published = corpus.published.len(),
            pending = corpus.pending.len(),
            "saved corpus"
        );
        Ok(())
    }

    /// Block until this process holds the corpus write lock.
    pub fn lock(&self) -> Result<CorpusLock, StoreError> {
        CorpusLock::acquire(lock_path(&self.path))
    }

    /// Deduplicate `batch` against the stored corpus and append the survivors
    /// to `pending`. Nothing is written when every record is a duplicate.
    pub fn stage(
        &self,
        batch: Vec<Regulation>,
        now: DateTime<Utc>,
    ) -> Result<StageSummary, StoreError> {
        let _lock = self.lock()?;
        let mut corpus = self.load()?;

        let offered = batch.len();
        let fresh = dedup_against(&corpus, batch);
        let staged = fresh.len();
        if staged > 0 {
            corpus.merge_pending(fresh, &timestamp(&now));
            self.save(&corpus)?;
        }

        let summary = StageSummary { offered, staged };
        info!(offered, staged, duplicates = summary.duplicates(), "staged batch");
        Ok(summary)
    }
}

/// `regulations.json` → `regulations.json.lock`.
fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

/// Exclusive advisory lock on the corpus sidecar file, released on drop.
#[derive(Debug)]
pub struct CorpusLock {
    file: File,
    path: PathBuf,
}

impl CorpusLock {
    fn acquire(path: PathBuf) -> Result<Self, StoreError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| StoreError::io(&path, e))?;
        file.lock().map_err(|e| StoreError::io(&path, e))?;
        debug!(path = %path.display(), "corpus lock acquired");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CorpusLock {
    fn drop(&mut self) {
        // The lock also goes away when the descriptor closes.
        let _ = self.file.unlock();
    }
}
