//! One ingest run: fetch → filter → normalize → categorize → dedup → stage.

use std::time::Duration;

use chrono::{DateTime, Utc};
use regwatch_core::{
    Categorizer, NormalizeContext, PipelineConfig, RawItem, Regulation, SourceConfig, normalize,
};
use regwatch_store::{CorpusStore, StageSummary, StoreError};
use tracing::{debug, info, warn};

use crate::source::SourceAdapter;

/// Per-source tally for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRun {
    pub id: String,
    pub fetched: usize,
    /// Records that passed the filters and normalised.
    pub accepted: usize,
    pub skipped: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub sources: Vec<SourceRun>,
    pub stage: StageSummary,
}

impl IngestReport {
    pub fn failed_sources(&self) -> usize {
        self.sources.iter().filter(|s| s.error.is_some()).count()
    }
}

/// Run every adapter in order and stage the combined batch.
///
/// The corpus is loaded once up front so a corrupt file aborts the run before
/// any portal is contacted. Source failures are logged and skipped; only
/// store errors are returned.
pub async fn run_ingest(
    adapters: &[Box<dyn SourceAdapter>],
    config: &PipelineConfig,
    store: &CorpusStore,
    now: DateTime<Utc>,
) -> Result<IngestReport, StoreError> {
    store.load()?;

    let ctx = NormalizeContext::new(now, config.general.auto_publish_days);
    let delay = Duration::from_millis(config.general.request_delay_ms);
    let mut batch = Vec::new();
    let mut runs = Vec::with_capacity(adapters.len());
    let mut seq = 0usize;
    let mut contacted = false;

    for adapter in adapters {
        let source = adapter.descriptor();
        let settings = config.scraper.source(&source.config_key);
        let mut run = SourceRun {
            id: source.id.clone(),
            ..SourceRun::default()
        };

        if !settings.enabled {
            info!(source = %source.id, "source disabled, skipping");
            run.skipped = true;
            runs.push(run);
            continue;
        }

        if contacted && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        contacted = true;

        let items = match adapter.fetch().await {
            Ok(items) => items,
            Err(e) => {
                warn!(source = %source.id, error = %e, "source fetch failed, skipping");
                run.error = Some(e.to_string());
                runs.push(run);
                continue;
            }
        };
        run.fetched = items.len();

        let categorizer = Categorizer::for_source(&source.config_key);
        for raw in items.iter().filter(|raw| passes_filters(raw, &settings)) {
            if run.accepted >= settings.limit {
                debug!(source = %source.id, limit = settings.limit, "source limit reached");
                break;
            }
            match normalize(raw, source, &ctx, seq) {
                Ok(reg) => {
                    seq += 1;
                    run.accepted += 1;
                    batch.push(classify(reg, &categorizer, &settings));
                }
                Err(e) => warn!(source = %source.id, error = %e, "skipping malformed item"),
            }
        }

        info!(
            source = %source.id,
            fetched = run.fetched,
            accepted = run.accepted,
            "source done"
        );
        runs.push(run);
    }

    let stage = store.stage(batch, now)?;
    let report = IngestReport {
        sources: runs,
        stage,
    };
    info!(
        sources = report.sources.len(),
        failed = report.failed_sources(),
        staged = stage.staged,
        duplicates = stage.duplicates(),
        "ingest complete"
    );
    Ok(report)
}

fn passes_filters(raw: &RawItem, settings: &SourceConfig) -> bool {
    settings.matches_type(raw.kind.as_deref()) && settings.matches_keywords(&raw.title)
}

fn classify(mut reg: Regulation, categorizer: &Categorizer, settings: &SourceConfig) -> Regulation {
    reg.category = categorizer.categorize(&reg.title).as_str().to_string();
    reg.keywords_matched = settings.matched_keywords(&reg.title);
    reg
}
