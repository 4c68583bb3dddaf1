//! regwatch: stage JDIH regulation listings for moderation and apply the
//! web interface's trigger files to the corpus.

mod display;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use regwatch_core::{SourceDescriptor, Stage, plan_sources};
use regwatch_store::{CorpusStore, ModerationProcessor, SettingsStore};
use regwatch_sync::{SourceAdapter, file_sources, run_ingest};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "regwatch", version)]
#[command(about = "Regulation ingestion and moderation pipeline for JDIH portals")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Paths {
    /// Corpus document
    #[arg(long, env = "REGWATCH_CORPUS", default_value = "regulations.json")]
    corpus: PathBuf,

    /// Pipeline configuration document
    #[arg(long, env = "REGWATCH_CONFIG", default_value = "config.json")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch every enabled source and stage new regulations as pending
    Ingest {
        #[command(flatten)]
        paths: Paths,

        /// Read each source from `<DIR>/<source-id>.json` instead of its feed
        #[arg(long, value_name = "DIR")]
        fixtures: Option<PathBuf>,
    },
    /// Consume one trigger file
    Apply {
        #[command(flatten)]
        paths: Paths,

        #[arg(long, env = "REGWATCH_TRIGGER", default_value = "trigger/update.json")]
        trigger: PathBuf,
    },
    /// Print corpus counts and regulation cards
    Show {
        #[arg(long, env = "REGWATCH_CORPUS", default_value = "regulations.json")]
        corpus: PathBuf,

        /// List pending records instead of published ones
        #[arg(long)]
        pending: bool,

        /// Show one record in full
        #[arg(long)]
        id: Option<String>,

        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Ingest { paths, fixtures } => ingest(&paths, fixtures.as_deref()).await,
        Command::Apply { paths, trigger } => apply(&paths, &trigger),
        Command::Show {
            corpus,
            pending,
            id,
            limit,
        } => show(&corpus, pending, id.as_deref(), limit),
    }
}

async fn ingest(paths: &Paths, fixtures: Option<&Path>) -> Result<()> {
    let settings = SettingsStore::new(&paths.config);
    let config = settings
        .load_config()
        .with_context(|| format!("loading config {}", paths.config.display()))?;
    let store = CorpusStore::new(&paths.corpus);

    let plan = plan_sources(&config);
    info!(sources = plan.len(), "ingest starting");
    let adapters = build_adapters(plan, fixtures)?;

    let report = run_ingest(&adapters, &config, &store, Utc::now())
        .await
        .context("ingest aborted")?;
    display::print_ingest_report(&report);
    Ok(())
}

fn build_adapters(
    plan: Vec<SourceDescriptor>,
    fixtures: Option<&Path>,
) -> Result<Vec<Box<dyn SourceAdapter>>> {
    if let Some(dir) = fixtures {
        info!(dir = %dir.display(), "reading sources from fixtures");
        return Ok(file_sources(dir, plan));
    }
    feed_adapters(plan)
}

#[cfg(feature = "http")]
fn feed_adapters(plan: Vec<SourceDescriptor>) -> Result<Vec<Box<dyn SourceAdapter>>> {
    let client = regwatch_sync::http_client().context("building HTTP client")?;
    Ok(regwatch_sync::http_sources(&client, plan))
}

#[cfg(not(feature = "http"))]
fn feed_adapters(_plan: Vec<SourceDescriptor>) -> Result<Vec<Box<dyn SourceAdapter>>> {
    anyhow::bail!("built without the `http` feature; pass --fixtures <DIR>")
}

fn apply(paths: &Paths, trigger: &Path) -> Result<()> {
    let corpus = CorpusStore::new(&paths.corpus);
    let settings = SettingsStore::new(&paths.config);
    let outcome = ModerationProcessor::new(&corpus, &settings)
        .process_trigger(trigger, Utc::now())
        .with_context(|| format!("applying trigger {}", trigger.display()))?;
    display::print_outcome(&outcome);
    Ok(())
}

fn show(path: &Path, pending: bool, id: Option<&str>, limit: usize) -> Result<()> {
    let store = CorpusStore::new(path);
    let corpus = store
        .load()
        .with_context(|| format!("loading corpus {}", path.display()))?;

    display::print_corpus_summary(&corpus);

    if let Some(id) = id {
        match corpus.find(id) {
            Some((stage, reg)) => display::print_regulation_card(reg, stage),
            None => println!("No regulation with id {id}"),
        }
        return Ok(());
    }

    let (stage, records) = if pending {
        (Stage::Pending, &corpus.pending)
    } else {
        (Stage::Published, &corpus.published)
    };
    display::print_regulation_list(records, stage, limit);
    Ok(())
}
