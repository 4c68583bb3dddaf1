//! Trigger-driven moderation.
//!
//! One invocation consumes at most one trigger file:
//!
//! | action          | effect                                                   |
//! |-----------------|----------------------------------------------------------|
//! | `approve`       | pending → head of published, `verified`, `publishedDate` |
//! | `delete`        | remove id / title-keyword matches from both lists        |
//! | `add_manual`    | insert at head of published, no deduplication            |
//! | `update_config` | shallow per-section merge into `config.json`             |
//!
//! The trigger is deleted once handled, whether or not it matched anything.
//! It stays in place only when the run fails on a corrupt or unwritable
//! corpus or config, so the action can be retried.

use std::path::Path;

use chrono::{DateTime, Utc};
use regwatch_core::{Corpus, Regulation, Removed, Trigger, TriggerCommand, timestamp};
use tracing::{info, warn};

use crate::{CorpusStore, SettingsStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationOutcome {
    /// No trigger file present.
    NoTrigger,
    /// Trigger could not be turned into a command.
    Rejected { reason: String },
    Approved { id: String },
    /// Precondition unmet: nothing matched.
    NotFound { action: &'static str, target: String },
    Deleted { removed: Removed },
    Added { id: String },
    ConfigUpdated { keys: Vec<String> },
}

impl ModerationOutcome {
    /// Whether a document was rewritten.
    pub fn changed(&self) -> bool {
        matches!(
            self,
            Self::Approved { .. } | Self::Deleted { .. } | Self::Added { .. } | Self::ConfigUpdated { .. }
        )
    }
}

pub struct ModerationProcessor<'a> {
    corpus: &'a CorpusStore,
    settings: &'a SettingsStore,
}

impl<'a> ModerationProcessor<'a> {
    pub fn new(corpus: &'a CorpusStore, settings: &'a SettingsStore) -> Self {
        Self { corpus, settings }
    }

    /// Read, apply and clear the trigger at `path`.
    pub fn process_trigger(
        &self,
        path: &Path,
        now: DateTime<Utc>,
    ) -> Result<ModerationOutcome, StoreError> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no trigger file");
                return Ok(ModerationOutcome::NoTrigger);
            }
            Err(e) => return Err(StoreError::io(path, e)),
        };

        let outcome = match Trigger::from_slice(&bytes) {
            Ok(trigger) => {
                info!(action = trigger.command.action(), "processing trigger");
                self.apply(&trigger, now)?
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring invalid trigger");
                ModerationOutcome::Rejected {
                    reason: e.to_string(),
                }
            }
        };

        clear_trigger(path);
        Ok(outcome)
    }

    /// Apply an already-parsed trigger.
    pub fn apply(
        &self,
        trigger: &Trigger,
        now: DateTime<Utc>,
    ) -> Result<ModerationOutcome, StoreError> {
        let now_ts = timestamp(&now);
        let touched_at = trigger
            .timestamp
            .as_ref()
            .map_or_else(|| now_ts.clone(), timestamp);

        match &trigger.command {
            TriggerCommand::Approve { id } => self.mutate(&touched_at, |corpus| {
                match corpus.approve(id, &now_ts) {
                    Some(_) => ModerationOutcome::Approved { id: id.clone() },
                    None => {
                        info!(id = %id, "approve: no pending regulation with this id");
                        ModerationOutcome::NotFound {
                            action: "approve",
                            target: id.clone(),
                        }
                    }
                }
            }),
            TriggerCommand::Delete(selector) => self.mutate(&touched_at, |corpus| {
                let removed = corpus.delete(selector);
                if removed.total() == 0 {
                    let target = selector
                        .id()
                        .or(selector.keyword())
                        .unwrap_or_default()
                        .to_string();
                    info!(target = %target, "delete: nothing matched");
                    return ModerationOutcome::NotFound {
                        action: "delete",
                        target,
                    };
                }
                info!(
                    id = selector.id().unwrap_or(""),
                    keyword = selector.keyword().unwrap_or(""),
                    published = removed.published,
                    pending = removed.pending,
                    "regulations deleted"
                );
                ModerationOutcome::Deleted { removed }
            }),
            TriggerCommand::AddManual(reg) => {
                let reg = prepare_manual(reg.as_ref().clone(), &now);
                self.mutate(&touched_at, |corpus| {
                    if corpus.contains_number(&reg.number) {
                        warn!(number = %reg.number, "manual regulation duplicates an existing number");
                    }
                    let id = reg.id.clone();
                    info!(id = %id, number = %reg.number, "manual regulation added");
                    corpus.add_manual(reg);
                    ModerationOutcome::Added { id }
                })
            }
            TriggerCommand::UpdateConfig { patch, updated_by } => {
                let keys = self.settings.apply_patch(patch, updated_by, &now_ts)?;
                Ok(ModerationOutcome::ConfigUpdated { keys })
            }
        }
    }

    /// Run one locked load → change → save cycle. The corpus is only written
    /// when `change` reports a mutation.
    fn mutate(
        &self,
        touched_at: &str,
        change: impl FnOnce(&mut Corpus) -> ModerationOutcome,
    ) -> Result<ModerationOutcome, StoreError> {
        let _lock = self.corpus.lock()?;
        let mut corpus = self.corpus.load()?;
        let outcome = change(&mut corpus);
        if outcome.changed() {
            corpus.touch(touched_at);
            self.corpus.save(&corpus)?;
        }
        Ok(outcome)
    }
}

/// Fill the fields a manual payload may leave out.
fn prepare_manual(mut reg: Regulation, now: &DateTime<Utc>) -> Regulation {
    if reg.id.trim().is_empty() {
        reg.id = format!("manual-{}", now.timestamp_millis());
    }
    if reg.published_date.is_none() {
        reg.published_date = Some(timestamp(now));
    }
    reg
}

/// Deletion failure is logged; the next run will see the same trigger again.
fn clear_trigger(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        warn!(path = %path.display(), error = %e, "could not remove trigger file");
    }
}
