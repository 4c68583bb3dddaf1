//! Terminal rendering for corpus records, ingest reports and moderation
//! outcomes.
//!
//! Cards are vertical and grouped by section; a section with no populated
//! field is skipped entirely.

use regwatch_core::{Corpus, Regulation, Stage};
use regwatch_store::ModerationOutcome;
use regwatch_sync::IngestReport;

const MAX_TITLE_CHARS: usize = 72;

// ── Corpus ──

pub fn print_corpus_summary(corpus: &Corpus) {
    println!("=== Corpus ===");
    println!("  {:<26} {}", "published", corpus.published.len());
    println!("  {:<26} {}", "pending", corpus.pending.len());
    let updated = if corpus.last_updated.is_empty() {
        "-"
    } else {
        corpus.last_updated.as_str()
    };
    println!("  {:<26} {}", "lastUpdated", updated);
    println!();
}

/// One line per record, newest first as stored.
pub fn print_regulation_list(records: &[Regulation], stage: Stage, limit: usize) {
    println!("{} ({}):", stage.as_str(), records.len());
    for reg in records.iter().take(limit) {
        println!("  {:<26} {}", reg.number, truncate(&reg.title, MAX_TITLE_CHARS));
        println!("    {}  {}  {}", reg.date, reg.ministry, reg.category);
    }
    if records.len() > limit {
        println!("  ... and {} more", records.len() - limit);
    }
}

/// Print a single record as a vertical card grouped by section.
pub fn print_regulation_card(reg: &Regulation, stage: Stage) {
    println!("=== {} [{}] ===", reg.number, stage.as_str());
    println!("{}", reg.title);
    println!();

    print_section(
        "Identity",
        &[
            ("id", Some(reg.id.clone())),
            ("number", Some(reg.number.clone())),
            ("type", reg.kind.clone()),
        ],
    );
    print_section(
        "Source",
        &[
            ("ministry", Some(reg.ministry.clone())),
            ("provinsi", reg.provinsi.clone()),
            ("provinsi_code", reg.provinsi_code.clone()),
            ("link", Some(reg.link.clone())),
        ],
    );
    print_section(
        "Classification",
        &[
            ("category", Some(reg.category.clone())),
            ("status", Some(reg.status.as_str().to_string())),
            ("keywords_matched", join(&reg.keywords_matched)),
            ("summary", Some(reg.summary.clone())),
        ],
    );
    print_section(
        "Dates",
        &[
            ("date", Some(reg.date.clone())),
            ("scrapedDate", Some(reg.scraped_date.clone())),
            ("autoPublishDate", Some(reg.auto_publish_date.clone())),
            ("publishedDate", reg.published_date.clone()),
        ],
    );
    print_section(
        "Moderation",
        &[("verified", Some(yes_no(reg.verified).to_string()))],
    );
}

// ── Ingest ──

pub fn print_ingest_report(report: &IngestReport) {
    println!("=== Ingest ===");
    for run in &report.sources {
        let note = match (&run.error, run.skipped) {
            (Some(e), _) => format!("failed: {e}"),
            (None, true) => "disabled".to_string(),
            (None, false) => format!("{} fetched, {} accepted", run.fetched, run.accepted),
        };
        println!("  {:<26} {}", run.id, note);
    }
    println!();
    println!("  {:<26} {}", "offered", report.stage.offered);
    println!("  {:<26} {}", "duplicates", report.stage.duplicates());
    println!("  {:<26} {}", "staged as pending", report.stage.staged);
}

// ── Moderation ──

pub fn print_outcome(outcome: &ModerationOutcome) {
    match outcome {
        ModerationOutcome::NoTrigger => println!("No trigger file; nothing to do."),
        ModerationOutcome::Rejected { reason } => println!("Trigger ignored: {reason}"),
        ModerationOutcome::Approved { id } => println!("Approved {id}"),
        ModerationOutcome::NotFound { action, target } => {
            println!("{action}: nothing matched {target:?}")
        }
        ModerationOutcome::Deleted { removed } => println!(
            "Deleted {} ({} published, {} pending)",
            removed.total(),
            removed.published,
            removed.pending
        ),
        ModerationOutcome::Added { id } => println!("Added {id} to published"),
        ModerationOutcome::ConfigUpdated { keys } => {
            println!("Config updated ({} keys)", keys.len());
            for key in keys {
                println!("  {key}");
            }
        }
    }
}

// ── Helpers ──

fn print_section(header: &str, fields: &[(&str, Option<String>)]) {
    let populated: Vec<(&str, &str)> = fields
        .iter()
        .filter_map(|(name, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| (*name, v))
        })
        .collect();
    if populated.is_empty() {
        return;
    }

    println!("{header}");
    for (name, value) in populated {
        println!("  {:<26} {}", name, value);
    }
    println!();
}

fn join(items: &[String]) -> Option<String> {
    (!items.is_empty()).then(|| items.join(", "))
}

fn yes_no(b: bool) -> &'static str {
    if b { "yes" } else { "no" }
}

/// Shorten to at most `max` characters, marking the cut with `...`.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
