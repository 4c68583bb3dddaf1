//! Trigger files: single-use moderation and config commands written by the
//! web interface.
//!
//! A trigger is parsed into a [`TriggerCommand`]; anything that cannot become
//! a command (bad JSON, unknown action, missing payload) is a
//! [`TriggerError`], which the processor treats as a no-op.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::config::{ConfigPatch, DEFAULT_UPDATED_BY};
use crate::regulation::Regulation;

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("trigger is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
    #[error("trigger is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("trigger has no action")]
    MissingAction,
    #[error("unknown trigger action `{0}`")]
    UnknownAction(String),
    #[error("`{action}` trigger is missing `{field}`")]
    MissingField {
        action: &'static str,
        field: &'static str,
    },
    #[error("manual regulation is invalid: {0}")]
    InvalidRegulation(String),
}

/// Records a delete removes: id match OR case-insensitive title keyword match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteSelector {
    id: Option<String>,
    keyword: Option<String>,
}

impl DeleteSelector {
    /// Blank selectors are dropped.
    pub fn new(id: Option<String>, keyword: Option<String>) -> Self {
        Self {
            id: non_blank(id),
            keyword: non_blank(keyword).map(|k| k.to_lowercase()),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.keyword.is_none()
    }

    pub fn matches(&self, reg: &Regulation) -> bool {
        let by_id = self.id.as_deref().is_some_and(|id| reg.id == id);
        let by_keyword = self
            .keyword
            .as_deref()
            .is_some_and(|kw| reg.title.to_lowercase().contains(kw));
        by_id || by_keyword
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TriggerCommand {
    Approve { id: String },
    Delete(DeleteSelector),
    AddManual(Box<Regulation>),
    UpdateConfig { patch: ConfigPatch, updated_by: String },
}

impl TriggerCommand {
    pub fn action(&self) -> &'static str {
        match self {
            Self::Approve { .. } => "approve",
            Self::Delete(_) => "delete",
            Self::AddManual(_) => "add_manual",
            Self::UpdateConfig { .. } => "update_config",
        }
    }
}

/// A parsed trigger file.
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub command: TriggerCommand,
    /// Client-side time of the action, used as the corpus `lastUpdated`.
    /// `None` when absent or not RFC 3339.
    pub timestamp: Option<DateTime<Utc>>,
}

/// Wire shape shared by every trigger kind.
#[derive(Debug, Default, Deserialize)]
struct TriggerFile {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    regulation_id: Option<String>,
    #[serde(default)]
    delete_id: Option<String>,
    #[serde(default)]
    delete_keyword: Option<String>,
    #[serde(default)]
    regulation: Option<Value>,
    #[serde(default)]
    config: Option<Map<String, Value>>,
    #[serde(default)]
    updated_by: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
}

impl Trigger {
    pub fn parse(text: &str) -> Result<Self, TriggerError> {
        let file: TriggerFile = serde_json::from_str(text)?;
        let timestamp = non_blank(file.timestamp.clone()).and_then(|ts| parse_timestamp(&ts));
        let command = command_from(file)?;
        Ok(Self { command, timestamp })
    }

    /// Parse raw file contents, which need not be UTF-8.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TriggerError> {
        Self::parse(std::str::from_utf8(bytes)?)
    }
}

fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(ts) {
        Ok(at) => Some(at.with_timezone(&Utc)),
        Err(e) => {
            warn!(timestamp = %ts, error = %e, "ignoring trigger timestamp that is not RFC 3339");
            None
        }
    }
}

fn command_from(file: TriggerFile) -> Result<TriggerCommand, TriggerError> {
    let action = non_blank(file.action.clone());
    match action.as_deref() {
        Some("approve") => {
            let id = non_blank(file.regulation_id).ok_or(TriggerError::MissingField {
                action: "approve",
                field: "regulation_id",
            })?;
            Ok(TriggerCommand::Approve { id })
        }
        Some("delete") => delete_command(file),
        // Early web-interface builds wrote `{ "delete_id": ... }` with no action.
        None if non_blank(file.delete_id.clone()).is_some() => delete_command(file),
        Some("add_manual") => {
            let value = file.regulation.ok_or(TriggerError::MissingField {
                action: "add_manual",
                field: "regulation",
            })?;
            let reg: Regulation = serde_json::from_value(value)
                .map_err(|e| TriggerError::InvalidRegulation(e.to_string()))?;
            if reg.title.trim().is_empty() || reg.number.trim().is_empty() {
                return Err(TriggerError::InvalidRegulation(
                    "title and number are required".into(),
                ));
            }
            Ok(TriggerCommand::AddManual(Box::new(reg)))
        }
        Some("update_config") => {
            let payload = file.config.ok_or(TriggerError::MissingField {
                action: "update_config",
                field: "config",
            })?;
            let patch = ConfigPatch::from_map(&payload);
            if patch.is_empty() {
                return Err(TriggerError::MissingField {
                    action: "update_config",
                    field: "config",
                });
            }
            let updated_by =
                non_blank(file.updated_by).unwrap_or_else(|| DEFAULT_UPDATED_BY.to_string());
            Ok(TriggerCommand::UpdateConfig { patch, updated_by })
        }
        Some(other) => Err(TriggerError::UnknownAction(other.to_string())),
        None => Err(TriggerError::MissingAction),
    }
}

fn delete_command(file: TriggerFile) -> Result<TriggerCommand, TriggerError> {
    let selector = DeleteSelector::new(file.delete_id.or(file.regulation_id), file.delete_keyword);
    if selector.is_empty() {
        return Err(TriggerError::MissingField {
            action: "delete",
            field: "delete_id",
        });
    }
    Ok(TriggerCommand::Delete(selector))
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
