//! Typed pipeline configuration and the shallow per-section patching applied
//! by `update_config` triggers.
//!
//! The typed view ([`PipelineConfig`]) is built once per run and handed to
//! each component. Patching works on the raw JSON document instead so that
//! keys the typed view ignores (display settings written by the web
//! interface) survive an update.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

pub const DEFAULT_LIMIT: usize = 10;
pub const DEFAULT_AUTO_PUBLISH_DAYS: i64 = 7;
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 500;
pub const DEFAULT_UPDATED_BY: &str = "web_interface";

fn default_true() -> bool {
    true
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

fn default_auto_publish_days() -> i64 {
    DEFAULT_AUTO_PUBLISH_DAYS
}

fn default_request_delay_ms() -> u64 {
    DEFAULT_REQUEST_DELAY_MS
}

/// Whole-run configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl PipelineConfig {
    /// The config as a raw JSON document. Patches on a missing config file
    /// start from the built-in defaults rendered this way.
    pub fn to_document(&self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(doc) => Ok(doc),
            other => Err(<serde_json::Error as serde::ser::Error>::custom(format!(
                "config rendered as {other}, not an object"
            ))),
        }
    }
}

/// Per-source settings keyed by source config key (`esdm`, `klhk`, `perda`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScraperConfig(pub BTreeMap<String, SourceConfig>);

impl Default for ScraperConfig {
    /// Built-in source set used when no config file exists.
    fn default() -> Self {
        let mining_types = vec![
            "Peraturan Menteri".to_string(),
            "Keputusan Menteri".to_string(),
        ];
        let mut sources = BTreeMap::new();
        sources.insert(
            "esdm".to_string(),
            SourceConfig {
                keywords: strings(&["pertambangan", "mineral", "batubara"]),
                types: mining_types.clone(),
                ..SourceConfig::default()
            },
        );
        sources.insert(
            "klhk".to_string(),
            SourceConfig {
                keywords: strings(&["pertambangan", "lingkungan", "kehutanan"]),
                types: mining_types,
                ..SourceConfig::default()
            },
        );
        sources.insert(
            "perda".to_string(),
            SourceConfig {
                keywords: strings(&["pertambangan", "tambang", "mineral", "galian"]),
                limit: 20,
                provinces: vec![
                    Province::new("Sulawesi Utara", "SULUT", "https://jdih.sulutprov.go.id/"),
                    Province::new("Kalimantan Utara", "KALTARA", "https://jdih.kaltaraprov.go.id/"),
                ],
                ..SourceConfig::default()
            },
        );
        Self(sources)
    }
}

impl ScraperConfig {
    /// Settings for a source; sources missing from the file get per-field defaults.
    pub fn source(&self, key: &str) -> SourceConfig {
        self.0.get(key).cloned().unwrap_or_default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Title keywords; empty matches everything.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Accepted regulation kinds; empty matches everything.
    #[serde(default)]
    pub types: Vec<String>,
    /// Maximum accepted records per run (per province for Perda).
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provinces: Vec<Province>,
    /// Base URL relative links are resolved against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Endpoint serving this source's raw items as a JSON array.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_url: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            keywords: Vec::new(),
            types: Vec::new(),
            limit: DEFAULT_LIMIT,
            provinces: Vec::new(),
            base_url: None,
            feed_url: None,
        }
    }
}

impl SourceConfig {
    pub fn matches_keywords(&self, title: &str) -> bool {
        self.keywords.is_empty() || !self.matched_keywords(title).is_empty()
    }

    /// Keywords contained in `title`, in config order.
    pub fn matched_keywords(&self, title: &str) -> Vec<String> {
        let lower = title.to_lowercase();
        self.keywords
            .iter()
            .filter(|kw| !kw.trim().is_empty() && lower.contains(&kw.to_lowercase()))
            .cloned()
            .collect()
    }

    /// A record with no known kind passes the type filter.
    pub fn matches_type(&self, kind: Option<&str>) -> bool {
        let Some(kind) = kind else {
            return true;
        };
        if self.types.is_empty() {
            return true;
        }
        let lower = kind.to_lowercase();
        self.types.iter().any(|t| lower.contains(&t.to_lowercase()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Province {
    pub name: String,
    pub code: String,
    pub url: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_url: Option<String>,
}

impl Province {
    pub fn new(name: &str, code: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            code: code.to_string(),
            url: url.to_string(),
            enabled: true,
            feed_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_auto_publish_days")]
    pub auto_publish_days: i64,
    /// Politeness delay between source adapter calls.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            auto_publish_days: DEFAULT_AUTO_PUBLISH_DAYS,
            request_delay_ms: DEFAULT_REQUEST_DELAY_MS,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ── Config patching ──

/// Top-level sections an `update_config` trigger may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigSection {
    Esdm,
    Klhk,
    Perda,
    General,
}

impl ConfigSection {
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "esdm" => Some(Self::Esdm),
            "klhk" => Some(Self::Klhk),
            "perda" => Some(Self::Perda),
            "general" => Some(Self::General),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Esdm => "esdm",
            Self::Klhk => "klhk",
            Self::Perda => "perda",
            Self::General => "general",
        }
    }

    /// Parent object in the config document, if the section is nested.
    fn parent(&self) -> Option<&'static str> {
        match self {
            Self::General => None,
            _ => Some("scraper"),
        }
    }
}


/// Validated `config` payload of an `update_config` trigger.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigPatch {
    sections: BTreeMap<ConfigSection, Map<String, Value>>,
}

impl ConfigPatch {
    /// Keep recognised sections whose value is an object; skip the rest.
    pub fn from_map(payload: &Map<String, Value>) -> Self {
        let mut sections = BTreeMap::new();
        for (key, value) in payload {
            let Some(section) = ConfigSection::parse(key) else {
                warn!(section = %key, "ignoring unknown config section");
                continue;
            };
            match value {
                Value::Object(fields) => {
                    sections.insert(section, fields.clone());
                }
                other => warn!(section = %key, value = %other, "config section is not an object"),
            }
        }
        Self { sections }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn sections(&self) -> impl Iterator<Item = ConfigSection> + '_ {
        self.sections.keys().copied()
    }

    /// Shallow-merge each section's keys into `doc` and stamp update metadata.
    ///
    /// Returns the dotted keys written, e.g. `scraper.esdm.limit`. A missing
    /// or non-object section (or parent) is replaced by an object.
    pub fn apply(&self, doc: &mut Map<String, Value>, updated_by: &str, now: &str) -> Vec<String> {
        let mut written = Vec::new();
        for (section, fields) in &self.sections {
            let prefix = match section.parent() {
                Some(parent) => format!("{parent}.{}", section.key()),
                None => section.key().to_string(),
            };
            for (key, value) in fields {
                let path = format!("{prefix}.{key}");
                info!(key = %path, value = %value, "config updated");
                written.push(path);
            }

            match section.parent() {
                Some(parent) => {
                    let mut outer = take_object(doc, parent);
                    merge_section(&mut outer, section.key(), fields);
                    doc.insert(parent.to_string(), Value::Object(outer));
                }
                None => merge_section(doc, section.key(), fields),
            }
        }
        doc.insert("last_updated".to_string(), Value::String(now.to_string()));
        doc.insert("updated_by".to_string(), Value::String(updated_by.to_string()));
        written
    }
}

fn merge_section(map: &mut Map<String, Value>, key: &str, fields: &Map<String, Value>) {
    let mut section = take_object(map, key);
    section.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
    map.insert(key.to_string(), Value::Object(section));
}

/// Remove `map[key]`, keeping it only if it is an object.
fn take_object(map: &mut Map<String, Value>, key: &str) -> Map<String, Value> {
    match map.remove(key) {
        Some(Value::Object(inner)) => inner,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn built_in_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.general.auto_publish_days, 7);
        let esdm = config.scraper.source("esdm");
        assert!(esdm.enabled);
        assert_eq!(esdm.limit, 10);
        assert!(esdm.keywords.contains(&"batubara".to_string()));
        let perda = config.scraper.source("perda");
        assert_eq!(perda.limit, 20);
        assert_eq!(perda.provinces.len(), 2);
        assert_eq!(perda.provinces[0].code, "SULUT");
    }

    #[test]
    fn partial_file_gets_field_defaults() {
        let json = r#"{
            "scraper": { "esdm": { "limit": 5 } },
            "general": {},
            "display": { "itemsPerPage": 20 }
        }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        let esdm = config.scraper.source("esdm");
        assert_eq!(esdm.limit, 5);
        assert!(esdm.enabled);
        assert!(esdm.keywords.is_empty());
        assert_eq!(config.general.auto_publish_days, 7);
        assert_eq!(config.general.request_delay_ms, 500);
        // Source absent from the file.
        assert_eq!(config.scraper.source("klhk"), SourceConfig::default());
    }

    #[test]
    fn empty_keywords_match_all() {
        let cfg = SourceConfig::default();
        assert!(cfg.matches_keywords("Apa saja"));
        assert!(cfg.matched_keywords("Apa saja").is_empty());
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        let cfg = SourceConfig {
            keywords: strings(&["Tambang", "mineral"]),
            ..SourceConfig::default()
        };
        assert!(cfg.matches_keywords("Izin TAMBANG Rakyat"));
        assert_eq!(cfg.matched_keywords("tambang mineral"), vec!["Tambang", "mineral"]);
        assert!(!cfg.matches_keywords("Retribusi Parkir"));
    }

    #[test]
    fn type_filter() {
        let cfg = SourceConfig {
            types: strings(&["Peraturan Menteri"]),
            ..SourceConfig::default()
        };
        assert!(cfg.matches_type(Some("PERATURAN MENTERI")));
        assert!(!cfg.matches_type(Some("Keputusan Menteri")));
        assert!(cfg.matches_type(None));
    }

    #[test]
    fn patch_is_shallow_per_section() {
        let mut doc = as_map(json!({
            "scraper": {
                "esdm": { "enabled": true, "keywords": ["mineral"], "limit": 10 },
                "klhk": { "limit": 10, "keywords": ["hutan"] }
            },
            "general": { "auto_publish_days": 7 },
            "display": { "itemsPerPage": 20 }
        }));
        let payload = as_map(json!({ "esdm": { "limit": 5 } }));
        let patch = ConfigPatch::from_map(&payload);

        let written = patch.apply(&mut doc, "admin", "2024-06-01T00:00:00.000Z");

        assert_eq!(written, vec!["scraper.esdm.limit"]);
        assert_eq!(doc["scraper"]["esdm"]["limit"], 5);
        assert_eq!(doc["scraper"]["esdm"]["keywords"], json!(["mineral"]));
        assert_eq!(doc["scraper"]["klhk"], json!({ "limit": 10, "keywords": ["hutan"] }));
        assert_eq!(doc["display"]["itemsPerPage"], 20);
        assert_eq!(doc["updated_by"], "admin");
        assert_eq!(doc["last_updated"], "2024-06-01T00:00:00.000Z");
    }

    #[test]
    fn patch_replaces_nested_values_wholesale() {
        let mut doc = PipelineConfig::default().to_document().unwrap();
        let payload = as_map(json!({
            "perda": { "provinces": [{ "name": "Kalimantan Utara", "code": "KALTARA", "url": "https://jdih.kaltaraprov.go.id/", "enabled": false }] },
            "general": { "auto_publish_days": 3 }
        }));
        ConfigPatch::from_map(&payload).apply(&mut doc, DEFAULT_UPDATED_BY, "t");
        assert_eq!(doc["scraper"]["perda"]["provinces"][0]["enabled"], false);
        assert_eq!(doc["scraper"]["perda"]["provinces"].as_array().unwrap().len(), 1);
        assert_eq!(doc["scraper"]["perda"]["keywords"][1], "tambang");
        assert_eq!(doc["general"]["auto_publish_days"], 3);
        assert_eq!(doc["general"]["request_delay_ms"], 500);
    }

    #[test]
    fn default_document_reads_back_as_defaults() {
        let doc = PipelineConfig::default().to_document().unwrap();
        assert!(doc["scraper"]["esdm"]["keywords"].is_array());
        let back: PipelineConfig = serde_json::from_value(Value::Object(doc)).unwrap();
        assert_eq!(back, PipelineConfig::default());
    }

    #[test]
    fn patch_skips_unknown_and_non_object_sections() {
        let payload = as_map(json!({
            "display": { "itemsPerPage": 5 },
            "klhk": "disabled",
            "esdm": { "enabled": false }
        }));
        let patch = ConfigPatch::from_map(&payload);
        assert_eq!(patch.sections().collect::<Vec<_>>(), vec![ConfigSection::Esdm]);
    }

    #[test]
    fn patch_creates_missing_parents() {
        let mut doc = Map::new();
        doc.insert("scraper".into(), Value::Null);
        let payload = as_map(json!({ "klhk": { "limit": 2 } }));
        ConfigPatch::from_map(&payload).apply(&mut doc, "x", "t");
        assert_eq!(doc["scraper"]["klhk"]["limit"], 2);
    }

    #[test]
    fn empty_patch() {
        assert!(ConfigPatch::from_map(&Map::new()).is_empty());
    }
}
