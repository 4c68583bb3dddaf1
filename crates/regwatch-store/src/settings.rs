//! The `config.json` document.
//!
//! Reads go through the typed [`PipelineConfig`]; `update_config` patches go
//! through the raw JSON object so keys the pipeline does not know about are
//! kept.

use std::path::{Path, PathBuf};

use regwatch_core::{ConfigPatch, PipelineConfig};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::StoreError;
use crate::atomic::write_json;

pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Typed config for one run. A missing file yields the built-in defaults.
    pub fn load_config(&self) -> Result<PipelineConfig, StoreError> {
        let Some(text) = self.read()? else {
            debug!(path = %self.path.display(), "no config file, using built-in defaults");
            return Ok(PipelineConfig::default());
        };
        serde_json::from_str(&text).map_err(|source| StoreError::CorruptConfig {
            path: self.path.clone(),
            source,
        })
    }

    /// Raw config document. A missing file yields the built-in defaults, so a
    /// first patch keeps every source setting it does not touch.
    pub fn load_document(&self) -> Result<Map<String, Value>, StoreError> {
        let Some(text) = self.read()? else {
            return Ok(PipelineConfig::default().to_document()?);
        };
        let value: Value =
            serde_json::from_str(&text).map_err(|source| StoreError::CorruptConfig {
                path: self.path.clone(),
                source,
            })?;
        match value {
            Value::Object(doc) => Ok(doc),
            _ => Err(StoreError::ConfigNotObject(self.path.clone())),
        }
    }

    pub fn save_document(&self, doc: &Map<String, Value>) -> Result<(), StoreError> {
        write_json(&self.path, doc)
    }

    /// Shallow-merge `patch` into the stored document and write it back.
    /// Returns the dotted keys that were written.
    pub fn apply_patch(
        &self,
        patch: &ConfigPatch,
        updated_by: &str,
        now: &str,
    ) -> Result<Vec<String>, StoreError> {
        let mut doc = self.load_document()?;
        let written = patch.apply(&mut doc, updated_by, now);
        self.save_document(&doc)?;
        info!(keys = written.len(), updated_by, "config saved");
        Ok(written)
    }

    fn read(&self) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(&self.path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> (tempfile::TempDir, SettingsStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("config.json"));
        (dir, store)
    }

    fn patch(v: Value) -> ConfigPatch {
        match v {
            Value::Object(m) => ConfigPatch::from_map(&m),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn missing_file_gives_defaults() {
        let (_dir, store) = store();
        assert_eq!(store.load_config().unwrap(), PipelineConfig::default());
        let doc = store.load_document().unwrap();
        assert_eq!(doc, PipelineConfig::default().to_document().unwrap());
    }

    #[test]
    fn corrupt_and_non_object_files_error() {
        let (_dir, store) = store();
        std::fs::write(store.path(), "[1, 2").unwrap();
        assert!(matches!(store.load_config(), Err(StoreError::CorruptConfig { .. })));
        assert!(matches!(store.load_document(), Err(StoreError::CorruptConfig { .. })));

        std::fs::write(store.path(), "[1, 2]").unwrap();
        assert!(matches!(store.load_document(), Err(StoreError::ConfigNotObject(_))));
    }

    #[test]
    fn patch_preserves_unrelated_keys() {
        let (_dir, store) = store();
        std::fs::write(
            store.path(),
            json!({
                "scraper": { "esdm": { "limit": 10, "keywords": ["mineral"] } },
                "general": { "auto_publish_days": 7 },
                "display": { "theme": "dark" }
            })
            .to_string(),
        )
        .unwrap();

        let written = store
            .apply_patch(
                &patch(json!({ "esdm": { "limit": 3 } })),
                "admin",
                "2024-06-01T00:00:00.000Z",
            )
            .unwrap();
        assert_eq!(written, vec!["scraper.esdm.limit"]);

        let doc = store.load_document().unwrap();
        assert_eq!(doc["scraper"]["esdm"]["limit"], 3);
        assert_eq!(doc["scraper"]["esdm"]["keywords"], json!(["mineral"]));
        assert_eq!(doc["display"]["theme"], "dark");
        assert_eq!(doc["updated_by"], "admin");

        let config = store.load_config().unwrap();
        assert_eq!(config.scraper.source("esdm").limit, 3);
    }

    #[test]
    fn patch_on_missing_file_keeps_built_in_sources() {
        let (_dir, store) = store();
        let defaults = PipelineConfig::default();

        store
            .apply_patch(&patch(json!({ "esdm": { "limit": 5 } })), "x", "t")
            .unwrap();

        let config = store.load_config().unwrap();
        let esdm = config.scraper.source("esdm");
        assert_eq!(esdm.limit, 5);
        assert_eq!(esdm.keywords, defaults.scraper.source("esdm").keywords);
        assert_eq!(esdm.types, defaults.scraper.source("esdm").types);
        assert_eq!(config.scraper.source("klhk"), defaults.scraper.source("klhk"));
        assert_eq!(config.scraper.source("perda").provinces.len(), 2);
        assert_eq!(config.general, defaults.general);
    }

    #[test]
    fn general_patch_on_missing_file() {
        let (_dir, store) = store();
        store
            .apply_patch(&patch(json!({ "general": { "auto_publish_days": 2 } })), "x", "t")
            .unwrap();
        let config = store.load_config().unwrap();
        assert_eq!(config.general.auto_publish_days, 2);
        assert_eq!(config.general.request_delay_ms, 500);
        assert_eq!(config.scraper, PipelineConfig::default().scraper);
    }
}
