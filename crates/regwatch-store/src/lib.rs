//! Storage layer: the JSON corpus and config documents, plus the
//! trigger-driven moderation processor that mutates them.

mod atomic;
mod corpus;
mod error;
mod moderation;
mod settings;

pub use atomic::write_json;
pub use corpus::{CorpusLock, CorpusStore, StageSummary};
pub use error::StoreError;
pub use moderation::{ModerationOutcome, ModerationProcessor};
pub use settings::SettingsStore;
