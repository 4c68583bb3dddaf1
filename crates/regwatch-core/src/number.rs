//! Regulation number extraction and fallback synthesis.
//!
//! The regulation number is the corpus deduplication key, so every record
//! needs one even when the portal listing omits it.
//!
//! # Indonesian numbering conventions
//!
//! - Ministerial titles embed the number: "Peraturan Menteri ESDM Nomor 5
//!   Tahun 2024 tentang ..." → `5 Tahun 2024`
//! - KLHK listings print a coded number whose prefix names the kind:
//!   `PERMENHUT P.12/2023`, `SK MENHUT 45/2022`, `PP 22/2021`
//! - When nothing usable is listed, the number falls back to
//!   `<kind> <year>` (e.g. `Peraturan Menteri 2024`). These fallbacks can
//!   collide across sources.

use std::sync::LazyLock;

use regex::Regex;

/// Kind used when neither the portal nor the number names one.
pub const DEFAULT_KIND: &str = "Peraturan";

static NOMOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Nomor\s+(\S+\s+Tahun\s+\d{4})").expect("static pattern")
});

/// Number prefixes used on the KLHK portal, checked in order.
const KIND_PREFIXES: &[(&str, &str)] = &[
    ("PERMENHUT", "Peraturan Menteri"),
    ("SK MENHUT", "Keputusan Menteri"),
    ("PP", "Peraturan Pemerintah"),
    ("PERPRES", "Peraturan Presiden"),
    ("UU", "Undang-Undang"),
];

/// Pull `<X> Tahun <YYYY>` out of a title containing "Nomor <X> Tahun <YYYY>".
pub fn extract_number(title: &str) -> Option<String> {
    NOMOR
        .captures(title)
        .and_then(|c| c.get(1))
        .map(|m| collapse_whitespace(m.as_str()))
}

/// Build the fallback `<kind> <year>` number.
pub fn synthesize_number(kind: Option<&str>, year: i32) -> String {
    let kind = kind.map(str::trim).filter(|k| !k.is_empty()).unwrap_or(DEFAULT_KIND);
    format!("{kind} {year}")
}

/// Infer the full regulation kind from a coded number.
pub fn infer_kind(number: &str) -> Option<&'static str> {
    let upper = number.to_uppercase();
    KIND_PREFIXES
        .iter()
        .find(|(abbr, _)| upper.contains(abbr))
        .map(|(_, kind)| *kind)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
