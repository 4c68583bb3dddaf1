//! Keyword categorisation of regulation titles.
//!
//! Rules are ordered data: the first rule with any keyword contained in the
//! lowercased title wins, so a title about "izin lingkungan" lands in
//! Perizinan rather than Lingkungan.

use std::fmt;

/// The fixed category set shown by the web interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Perizinan,
    Lingkungan,
    KeselamatanKerja,
    TeknisPertambangan,
    Reklamasi,
    PajakRoyalti,
    /// Catch-all for ministry sources.
    Lainnya,
    /// Catch-all for provincial sources.
    Perda,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Perizinan => "Perizinan",
            Self::Lingkungan => "Lingkungan",
            Self::KeselamatanKerja => "Keselamatan Kerja",
            Self::TeknisPertambangan => "Teknis Pertambangan",
            Self::Reklamasi => "Reklamasi",
            Self::PajakRoyalti => "Pajak & Royalti",
            Self::Lainnya => "Lainnya",
            Self::Perda => "Perda",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(category, keyword-set)` rule. Keywords are lowercase.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRule {
    pub category: Category,
    pub keywords: &'static [&'static str],
}

impl CategoryRule {
    fn matches(&self, title_lower: &str) -> bool {
        self.keywords.iter().any(|kw| title_lower.contains(kw))
    }
}

/// Rule order for ESDM and KLHK titles.
pub const MINISTRY_RULES: &[CategoryRule] = &[
    CategoryRule {
        category: Category::Perizinan,
        keywords: &["izin", "perizinan", "persetujuan"],
    },
    CategoryRule {
        category: Category::Lingkungan,
        keywords: &["lingkungan", "amdal", "limbah", "emisi"],
    },
    CategoryRule {
        category: Category::KeselamatanKerja,
        keywords: &["k3", "keselamatan", "kesehatan"],
    },
    CategoryRule {
        category: Category::TeknisPertambangan,
        keywords: &["tambang", "eksplorasi", "eksploitasi", "mineral"],
    },
    CategoryRule {
        category: Category::Reklamasi,
        keywords: &["reklamasi", "pascatambang"],
    },
    CategoryRule {
        category: Category::PajakRoyalti,
        keywords: &["pajak", "royalti", "pungutan"],
    },
];

/// Rule order for provincial (Perda) titles.
pub const PERDA_RULES: &[CategoryRule] = &[
    CategoryRule {
        category: Category::TeknisPertambangan,
        keywords: &["tambang", "pertambangan", "mineral", "galian"],
    },
    CategoryRule {
        category: Category::Lingkungan,
        keywords: &["lingkungan", "kehutanan", "hutan"],
    },
    CategoryRule {
        category: Category::Perizinan,
        keywords: &["izin", "perizinan"],
    },
];

/// First-match-wins categoriser over an ordered rule list.
#[derive(Debug, Clone, Copy)]
pub struct Categorizer {
    rules: &'static [CategoryRule],
    fallback: Category,
}

impl Categorizer {
    pub const fn new(rules: &'static [CategoryRule], fallback: Category) -> Self {
        Self { rules, fallback }
    }

    pub const fn ministry() -> Self {
        Self::new(MINISTRY_RULES, Category::Lainnya)
    }

    pub const fn perda() -> Self {
        Self::new(PERDA_RULES, Category::Perda)
    }

    /// Pick the rule list for a source by its config key.
    pub fn for_source(config_key: &str) -> Self {
        if config_key.eq_ignore_ascii_case("perda") {
            Self::perda()
        } else {
            Self::ministry()
        }
    }

    pub fn rules(&self) -> &'static [CategoryRule] {
        self.rules
    }

    pub fn fallback(&self) -> Category {
        self.fallback
    }

    pub fn categorize(&self, title: &str) -> Category {
        let lower = title.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lower))
            .map(|rule| rule.category)
            .unwrap_or(self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perizinan_outranks_lingkungan() {
        let c = Categorizer::ministry();
        assert_eq!(
            c.categorize("Tata Cara Persetujuan Lingkungan"),
            Category::Perizinan
        );
        assert_eq!(c.categorize("Pengelolaan Limbah B3"), Category::Lingkungan);
    }

    #[test]
    fn ministry_rules_cover_every_category() {
        let c = Categorizer::ministry();
        assert_eq!(c.categorize("Penerapan K3 di Tambang"), Category::KeselamatanKerja);
        assert_eq!(c.categorize("Kaidah Eksplorasi Batubara"), Category::TeknisPertambangan);
        assert_eq!(c.categorize("Royalti Batubara"), Category::PajakRoyalti);
        assert_eq!(c.categorize("Pelaksanaan Reklamasi"), Category::Reklamasi);
        assert_eq!(c.categorize("Tarif Pungutan Sektor Energi"), Category::PajakRoyalti);
        assert_eq!(c.categorize("Organisasi dan Tata Kerja"), Category::Lainnya);
    }

    #[test]
    fn matching_ignores_case() {
        let c = Categorizer::ministry();
        assert_eq!(c.categorize("IZIN USAHA"), Category::Perizinan);
    }

    #[test]
    fn perda_rules_put_mining_first() {
        let c = Categorizer::perda();
        assert_eq!(
            c.categorize("Izin Usaha Pertambangan Batuan"),
            Category::TeknisPertambangan
        );
        assert_eq!(c.categorize("Retribusi Daerah"), Category::Perda);
        assert_eq!(Categorizer::for_source("perda").fallback(), Category::Perda);
        assert_eq!(Categorizer::for_source("esdm").fallback(), Category::Lainnya);
    }

    #[test]
    fn categorize_is_deterministic() {
        let c = Categorizer::ministry();
        let titles = [
            "Izin Tambang Rakyat",
            "Baku Mutu Emisi",
            "Royalti Batubara",
            "",
        ];
        for title in titles {
            assert_eq!(c.categorize(title), c.categorize(title));
        }
    }

    #[test]
    fn rule_order_is_inspectable() {
        let order: Vec<Category> = Categorizer::ministry()
            .rules()
            .iter()
            .map(|r| r.category)
            .collect();
        assert_eq!(
            order,
            vec![
                Category::Perizinan,
                Category::Lingkungan,
                Category::KeselamatanKerja,
                Category::TeknisPertambangan,
                Category::Reklamasi,
                Category::PajakRoyalti,
            ]
        );
    }

    #[test]
    fn labels() {
        assert_eq!(Category::PajakRoyalti.to_string(), "Pajak & Royalti");
        assert_eq!(Category::KeselamatanKerja.as_str(), "Keselamatan Kerja");
    }
}
