//! Core domain types for regwatch: regulation records, the corpus document,
//! normalisation, categorisation, deduplication, pipeline config and trigger
//! commands. Nothing here touches the filesystem or the network.

pub mod category;
pub mod config;
pub mod corpus;
pub mod dedup;
pub mod normalize;
pub mod number;
pub mod regulation;
pub mod source;
pub mod trigger;

pub use category::{Categorizer, Category, CategoryRule};
pub use config::{ConfigPatch, ConfigSection, GeneralConfig, PipelineConfig, Province, SourceConfig};
pub use corpus::{Corpus, Removed, Stage};
pub use dedup::dedup_against;
pub use normalize::{NormalizeContext, NormalizeError, normalize};
pub use regulation::{RawItem, Regulation, RegulationStatus, timestamp};
pub use source::{ProvinceRef, SourceDescriptor, plan_sources};
pub use trigger::{DeleteSelector, Trigger, TriggerCommand, TriggerError};
