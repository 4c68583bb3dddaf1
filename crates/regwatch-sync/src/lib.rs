//! Source adapters and the ingest pipeline that stages their output in the
//! corpus.

pub mod ingest;
pub mod source;

#[cfg(feature = "http")]
pub mod http;

pub use ingest::{IngestReport, SourceRun, run_ingest};
pub use source::{FileSource, SourceAdapter, SourceError, StaticSource, file_sources};

#[cfg(feature = "http")]
pub use http::{HttpSource, http_client, http_sources};
