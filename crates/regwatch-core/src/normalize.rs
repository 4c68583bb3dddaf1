//! Raw adapter output → canonical [`Regulation`] records.
//!
//! Everything here is best effort: unparseable dates fall back to today,
//! missing numbers are extracted or synthesised, relative links are joined to
//! the source base URL. Only an item without a title is rejected.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use regex::Regex;
use thiserror::Error;
use tracing::warn;

use crate::config::DEFAULT_AUTO_PUBLISH_DAYS;
use crate::number::{extract_number, infer_kind, synthesize_number};
use crate::regulation::{RawItem, Regulation, RegulationStatus, timestamp};
use crate::source::SourceDescriptor;

pub const MAX_TITLE_CHARS: usize = 300;
const PERDA_SUMMARY_TITLE_CHARS: usize = 100;

/// Numeric formats tried in order before the `D Month YYYY` form.
const DATE_FORMATS: &[&str] = &["%d-%m-%Y", "%d/%m/%Y", "%Y-%m-%d"];

/// Indonesian and English month names, matched case-insensitively.
const MONTHS: &[(&str, u32)] = &[
    ("januari", 1),
    ("january", 1),
    ("jan", 1),
    ("februari", 2),
    ("february", 2),
    ("feb", 2),
    ("maret", 3),
    ("march", 3),
    ("mar", 3),
    ("april", 4),
    ("apr", 4),
    ("mei", 5),
    ("may", 5),
    ("juni", 6),
    ("june", 6),
    ("jun", 6),
    ("juli", 7),
    ("july", 7),
    ("jul", 7),
    ("agustus", 8),
    ("august", 8),
    ("agu", 8),
    ("aug", 8),
    ("september", 9),
    ("sep", 9),
    ("sept", 9),
    ("oktober", 10),
    ("october", 10),
    ("okt", 10),
    ("oct", 10),
    ("november", 11),
    ("nov", 11),
    ("desember", 12),
    ("december", 12),
    ("des", 12),
    ("dec", 12),
];

const REVOKED_MARKERS: &[&str] = &["dicabut", "tidak berlaku", "dibatalkan"];

static MINISTERIAL_PREAMBLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(Peraturan|Keputusan)\s+Menteri.*?Nomor\s+\S+\s+Tahun\s+\d{4}\s+tentang\s+")
        .expect("static pattern")
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("item has no title")]
    MissingTitle,
}

/// Per-run inputs shared by every item.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeContext {
    pub now: DateTime<Utc>,
    /// `now` plus the configured auto-publish window.
    pub auto_publish_at: DateTime<Utc>,
}

impl NormalizeContext {
    /// A negative window, or one past chrono's date range, falls back to
    /// [`DEFAULT_AUTO_PUBLISH_DAYS`].
    pub fn new(now: DateTime<Utc>, auto_publish_days: i64) -> Self {
        let auto_publish_at = days_after(now, auto_publish_days).unwrap_or_else(|| {
            warn!(
                auto_publish_days,
                fallback = DEFAULT_AUTO_PUBLISH_DAYS,
                "auto_publish_days out of range, using default"
            );
            days_after(now, DEFAULT_AUTO_PUBLISH_DAYS).unwrap_or(now)
        });
        Self {
            now,
            auto_publish_at,
        }
    }
}

fn days_after(at: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    if days < 0 {
        return None;
    }
    at.checked_add_signed(Duration::try_days(days)?)
}

/// Normalise one raw item. `seq` disambiguates ids minted in the same millisecond.
///
/// The category is left empty; the pipeline assigns it afterwards.
pub fn normalize(
    raw: &RawItem,
    source: &SourceDescriptor,
    ctx: &NormalizeContext,
    seq: usize,
) -> Result<Regulation, NormalizeError> {
    let full_title = raw.title.trim();
    if full_title.is_empty() {
        return Err(NormalizeError::MissingTitle);
    }
    let title = truncate_chars(full_title, MAX_TITLE_CHARS);

    let today = ctx.now.date_naive();
    let date = parse_date(raw.date_text.as_deref().unwrap_or(""), today);

    let listed_number = raw
        .number
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());
    let kind = non_blank(raw.kind.as_deref())
        .map(str::to_string)
        .or_else(|| listed_number.and_then(infer_kind).map(str::to_string));
    let number = match listed_number {
        Some(n) => n.to_string(),
        None => extract_number(full_title)
            .unwrap_or_else(|| synthesize_number(kind.as_deref(), date.year())),
    };

    let (provinsi, provinsi_code) = match &source.province {
        Some(p) => (Some(p.name.clone()), Some(p.code.clone())),
        None => (None, None),
    };
    let summary = summarize(&title, provinsi.as_deref());

    Ok(Regulation {
        id: format!("{}-{}-{}", source.id, ctx.now.timestamp_millis(), seq),
        title,
        number,
        ministry: source.ministry.clone(),
        provinsi,
        provinsi_code,
        kind,
        category: String::new(),
        date: date.format("%Y-%m-%d").to_string(),
        summary,
        link: resolve_link(raw.link.as_deref(), &source.base_url),
        status: parse_status(raw.status_text.as_deref()),
        scraped_date: timestamp(&ctx.now),
        auto_publish_date: timestamp(&ctx.auto_publish_at),
        verified: false,
        published_date: None,
        keywords_matched: Vec::new(),
        extra: Default::default(),
    })
}

/// Parse a portal date string; `today` when nothing matches.
pub fn parse_date(text: &str, today: NaiveDate) -> NaiveDate {
    let text = text.trim();
    if text.is_empty() {
        return today;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| parse_day_month_year(text))
        .or_else(|| parse_bare_year(text))
        .unwrap_or(today)
}

fn parse_day_month_year(text: &str) -> Option<NaiveDate> {
    let mut parts = text.split_whitespace();
    let (day, month, year) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let month = month.to_lowercase();
    let month = MONTHS
        .iter()
        .find(|(name, _)| *name == month)
        .map(|(_, m)| *m)?;
    NaiveDate::from_ymd_opt(year.parse().ok()?, month, day.parse().ok()?)
}

/// Listings that only show a year (ESDM) date the record January 1st.
fn parse_bare_year(text: &str) -> Option<NaiveDate> {
    if text.len() != 4 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::from_ymd_opt(text.parse().ok()?, 1, 1)
}

/// Join a relative link to the base URL; absolute links pass through.
pub fn resolve_link(link: Option<&str>, base_url: &str) -> String {
    let Some(link) = non_blank(link) else {
        return base_url.to_string();
    };
    if link.starts_with("http://") || link.starts_with("https://") {
        return link.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        link.trim_start_matches('/')
    )
}

pub fn parse_status(text: Option<&str>) -> RegulationStatus {
    let lower = text.unwrap_or("").to_lowercase();
    if REVOKED_MARKERS.iter().any(|m| lower.contains(m)) {
        RegulationStatus::Dicabut
    } else {
        RegulationStatus::Aktif
    }
}

pub fn summarize(title: &str, provinsi: Option<&str>) -> String {
    match provinsi {
        Some(provinsi) => format!(
            "Peraturan Daerah {provinsi} tentang {}",
            truncate_chars(title, PERDA_SUMMARY_TITLE_CHARS)
        ),
        None => {
            let subject = MINISTERIAL_PREAMBLE.replace_all(title, "");
            format!("Peraturan ini mengatur tentang {}", subject.to_lowercase())
        }
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 29, 10, 0, 0).unwrap()
    }

    fn ctx() -> NormalizeContext {
        NormalizeContext::new(now(), 7)
    }

    fn esdm() -> SourceDescriptor {
        SourceDescriptor::ministry("esdm", "ESDM", "https://jdih.esdm.go.id")
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 29).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn date_formats_in_order() {
        assert_eq!(parse_date("05-03-2023", today()), ymd(2023, 3, 5));
        assert_eq!(parse_date("05/03/2023", today()), ymd(2023, 3, 5));
        assert_eq!(parse_date("2023-03-05", today()), ymd(2023, 3, 5));
        assert_eq!(parse_date("5 Maret 2023", today()), ymd(2023, 3, 5));
        assert_eq!(parse_date("17 August 2021", today()), ymd(2021, 8, 17));
        assert_eq!(parse_date(" 1 DESEMBER 2020 ", today()), ymd(2020, 12, 1));
    }

    #[test]
    fn bare_year_is_january_first() {
        assert_eq!(parse_date("2022", today()), ymd(2022, 1, 1));
    }

    #[test]
    fn unparseable_dates_fall_back_to_today() {
        assert_eq!(parse_date("", today()), today());
        assert_eq!(parse_date("kemarin", today()), today());
        assert_eq!(parse_date("31-02-2023", today()), today());
        assert_eq!(parse_date("5 Smarch 2023", today()), today());
    }

    #[test]
    fn links() {
        let base = "https://jdih.esdm.go.id";
        assert_eq!(
            resolve_link(Some("/dokumen/1.pdf"), base),
            "https://jdih.esdm.go.id/dokumen/1.pdf"
        );
        assert_eq!(
            resolve_link(Some("dokumen/1.pdf"), "https://jdih.sulutprov.go.id/"),
            "https://jdih.sulutprov.go.id/dokumen/1.pdf"
        );
        assert_eq!(
            resolve_link(Some("https://cdn.example.id/1.pdf"), base),
            "https://cdn.example.id/1.pdf"
        );
        assert_eq!(resolve_link(None, base), base);
        assert_eq!(resolve_link(Some("  "), base), base);
    }

    #[test]
    fn status_text() {
        assert_eq!(parse_status(Some("Berlaku")), RegulationStatus::Aktif);
        assert_eq!(parse_status(Some("Tidak Berlaku")), RegulationStatus::Dicabut);
        assert_eq!(parse_status(Some("DICABUT")), RegulationStatus::Dicabut);
        assert_eq!(parse_status(None), RegulationStatus::Aktif);
    }

    #[test]
    fn ministerial_summary_drops_preamble() {
        let title = "Peraturan Menteri ESDM Nomor 5 Tahun 2024 tentang Tata Cara Reklamasi";
        assert_eq!(
            summarize(title, None),
            "Peraturan ini mengatur tentang tata cara reklamasi"
        );
    }

    #[test]
    fn perda_summary_names_province() {
        let long = "x".repeat(150);
        let summary = summarize(&long, Some("Sulawesi Utara"));
        assert_eq!(
            summary,
            format!("Peraturan Daerah Sulawesi Utara tentang {}", "x".repeat(100))
        );
    }

    #[test]
    fn full_record() {
        let raw = RawItem {
            title: "  Pedoman Izin Usaha Pertambangan  ".into(),
            number: Some(" 7 Tahun 2024 ".into()),
            date_text: Some("12-04-2024".into()),
            link: Some("/dokumen/7.pdf".into()),
            status_text: Some("Berlaku".into()),
            kind: Some("Peraturan Menteri".into()),
        };
        let reg = normalize(&raw, &esdm(), &ctx(), 3).unwrap();
        assert_eq!(reg.id, format!("esdm-{}-3", now().timestamp_millis()));
        assert_eq!(reg.title, "Pedoman Izin Usaha Pertambangan");
        assert_eq!(reg.number, "7 Tahun 2024");
        assert_eq!(reg.ministry, "ESDM");
        assert_eq!(reg.date, "2024-04-12");
        assert_eq!(reg.link, "https://jdih.esdm.go.id/dokumen/7.pdf");
        assert_eq!(reg.status, RegulationStatus::Aktif);
        assert_eq!(reg.scraped_date, "2024-05-29T10:00:00.000Z");
        assert_eq!(reg.auto_publish_date, "2024-06-05T10:00:00.000Z");
        assert!(!reg.verified);
        assert!(reg.published_date.is_none());
        assert!(reg.category.is_empty());
    }

    #[test]
    fn number_from_title_then_synthesised() {
        let raw = RawItem {
            title: "Peraturan Menteri ESDM Nomor 10 Tahun 2023 tentang Batubara".into(),
            ..Default::default()
        };
        let reg = normalize(&raw, &esdm(), &ctx(), 0).unwrap();
        assert_eq!(reg.number, "10 Tahun 2023");

        let raw = RawItem {
            title: "Pedoman Teknis".into(),
            date_text: Some("2022".into()),
            kind: Some("Keputusan Menteri".into()),
            ..Default::default()
        };
        let reg = normalize(&raw, &esdm(), &ctx(), 1).unwrap();
        assert_eq!(reg.number, "Keputusan Menteri 2022");
    }

    #[test]
    fn kind_inferred_from_coded_number() {
        let raw = RawItem {
            title: "Tata Hutan".into(),
            number: Some("PERMENHUT P.12/2023".into()),
            ..Default::default()
        };
        let src = SourceDescriptor::ministry("klhk", "KLHK", "https://jdih.menlhk.go.id");
        let reg = normalize(&raw, &src, &ctx(), 0).unwrap();
        assert_eq!(reg.kind.as_deref(), Some("Peraturan Menteri"));
    }

    #[test]
    fn perda_record_carries_province() {
        let src = SourceDescriptor::perda("Kalimantan Utara", "KALTARA", "https://jdih.kaltaraprov.go.id/");
        let raw = RawItem {
            title: "Pengelolaan Pertambangan Mineral".into(),
            number: Some("Nomor 3 Tahun 2023".into()),
            ..Default::default()
        };
        let reg = normalize(&raw, &src, &ctx(), 0).unwrap();
        assert!(reg.id.starts_with("perda-kaltara-"));
        assert_eq!(reg.ministry, "Perda");
        assert_eq!(reg.provinsi.as_deref(), Some("Kalimantan Utara"));
        assert_eq!(reg.provinsi_code.as_deref(), Some("KALTARA"));
        assert_eq!(reg.date, "2024-05-29");
        assert_eq!(reg.link, "https://jdih.kaltaraprov.go.id/");
    }

    #[test]
    fn long_titles_are_truncated() {
        let raw = RawItem {
            title: "é".repeat(400),
            number: Some("1".into()),
            ..Default::default()
        };
        let reg = normalize(&raw, &esdm(), &ctx(), 0).unwrap();
        assert_eq!(reg.title.chars().count(), MAX_TITLE_CHARS);
    }

    #[test]
    fn out_of_range_auto_publish_window_uses_default() {
        let raw = RawItem {
            title: "Izin".into(),
            number: Some("1".into()),
            ..Default::default()
        };
        for days in [100_000_000, i64::MAX, -3] {
            let ctx = NormalizeContext::new(now(), days);
            let reg = normalize(&raw, &esdm(), &ctx, 0).unwrap();
            assert_eq!(reg.auto_publish_date, "2024-06-05T10:00:00.000Z", "{days}");
        }

        let ctx = NormalizeContext::new(now(), 0);
        assert_eq!(ctx.auto_publish_at, now());
    }

    #[test]
    fn missing_title_is_rejected() {
        let raw = RawItem {
            title: "   ".into(),
            number: Some("1".into()),
            ..Default::default()
        };
        assert_eq!(
            normalize(&raw, &esdm(), &ctx(), 0),
            Err(NormalizeError::MissingTitle)
        );
    }
}
