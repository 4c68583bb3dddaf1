//! The corpus document: published and pending regulation lists.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::regulation::Regulation;
use crate::trigger::DeleteSelector;

/// Which list a record lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Pending,
    Published,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Published => "published",
        }
    }
}

/// Count of records removed by a delete, per list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Removed {
    pub published: usize,
    pub pending: usize,
}

impl Removed {
    pub fn total(&self) -> usize {
        self.published + self.pending
    }
}

/// The persisted `regulations.json` document.
///
/// `published` is most-recent-first. Unknown top-level keys are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    #[serde(default)]
    pub published: Vec<Regulation>,
    #[serde(default)]
    pub pending: Vec<Regulation>,
    #[serde(rename = "lastUpdated", default, deserialize_with = "null_as_empty")]
    pub last_updated: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

impl Corpus {
    /// Every regulation number across both lists.
    pub fn numbers(&self) -> impl Iterator<Item = &str> {
        self.published
            .iter()
            .chain(&self.pending)
            .map(|r| r.number.as_str())
    }

    pub fn contains_number(&self, number: &str) -> bool {
        self.numbers().any(|n| n == number)
    }

    pub fn find(&self, id: &str) -> Option<(Stage, &Regulation)> {
        self.published
            .iter()
            .find(|r| r.id == id)
            .map(|r| (Stage::Published, r))
            .or_else(|| {
                self.pending
                    .iter()
                    .find(|r| r.id == id)
                    .map(|r| (Stage::Pending, r))
            })
    }

    pub fn touch(&mut self, at: &str) {
        self.last_updated = at.to_string();
    }

    /// Append already-deduplicated records to `pending`, preserving order.
    pub fn merge_pending(&mut self, records: Vec<Regulation>, at: &str) -> usize {
        let count = records.len();
        self.pending.extend(records);
        self.touch(at);
        count
    }

    /// Move a pending record to the head of `published`, marking it verified.
    pub fn approve(&mut self, id: &str, published_at: &str) -> Option<&Regulation> {
        let idx = self.pending.iter().position(|r| r.id == id)?;
        let mut reg = self.pending.remove(idx);
        reg.verified = true;
        reg.published_date = Some(published_at.to_string());
        info!(id = %reg.id, number = %reg.number, "regulation approved");
        self.published.insert(0, reg);
        self.published.first()
    }

    /// Insert straight at the head of `published`; no deduplication.
    pub fn add_manual(&mut self, reg: Regulation) {
        self.published.insert(0, reg);
    }

    /// Remove every record the selector matches from both lists.
    pub fn delete(&mut self, selector: &DeleteSelector) -> Removed {
        let before = (self.published.len(), self.pending.len());
        self.published.retain(|r| !selector.matches(r));
        self.pending.retain(|r| !selector.matches(r));
        Removed {
            published: before.0 - self.published.len(),
            pending: before.1 - self.pending.len(),
        }
    }
}
