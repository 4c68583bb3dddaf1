//! Regulation records shared by the ingest pipeline, the corpus and the web interface.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Format a UTC instant the way every timestamp in the corpus is written.
pub fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Whether a regulation is still in force.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegulationStatus {
    #[default]
    #[serde(alias = "aktif")]
    Aktif,
    #[serde(alias = "dicabut")]
    Dicabut,
}

impl RegulationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aktif => "Aktif",
            Self::Dicabut => "Dicabut",
        }
    }
}

/// One raw field set as extracted by a source adapter.
///
/// Every field except the title is optional: portals differ in what they list,
/// and the normaliser fills the gaps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub date_text: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub status_text: Option<String>,
    /// Regulation kind as printed by the portal (`Peraturan Menteri`, `PERMENHUT`, ...).
    #[serde(default)]
    pub kind: Option<String>,
}

/// The canonical regulation record stored in `regulations.json`.
///
/// Field names follow the JSON document consumed by the web interface, which
/// mixes camelCase and snake_case. Unknown fields are carried in `extra` so a
/// load/save round trip never drops data written by other tools.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Regulation {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Deduplication key.
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub ministry: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provinsi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provinsi_code: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub category: String,
    /// `YYYY-MM-DD`.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub status: RegulationStatus,
    #[serde(rename = "scrapedDate", default)]
    pub scraped_date: String,
    #[serde(rename = "autoPublishDate", default)]
    pub auto_publish_date: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(rename = "publishedDate", default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords_matched: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
