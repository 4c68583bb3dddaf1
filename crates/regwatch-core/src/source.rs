//! Source descriptors: which portals an ingest run visits, and in what order.

use crate::config::PipelineConfig;

const ESDM_BASE_URL: &str = "https://jdih.esdm.go.id";
const KLHK_BASE_URL: &str = "https://jdih.menlhk.go.id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvinceRef {
    pub name: String,
    pub code: String,
}

/// Identity of one source adapter invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    /// Record id prefix, e.g. `esdm` or `perda-sulut`.
    pub id: String,
    /// Key of the `scraper.<key>` config section governing this source.
    pub config_key: String,
    pub ministry: String,
    pub base_url: String,
    pub feed_url: Option<String>,
    pub province: Option<ProvinceRef>,
}

impl SourceDescriptor {
    pub fn ministry(id: &str, ministry: &str, base_url: &str) -> Self {
        Self {
            id: id.to_string(),
            config_key: id.to_string(),
            ministry: ministry.to_string(),
            base_url: base_url.to_string(),
            feed_url: None,
            province: None,
        }
    }

    pub fn perda(name: &str, code: &str, base_url: &str) -> Self {
        Self {
            id: format!("perda-{}", code.to_lowercase()),
            config_key: "perda".to_string(),
            ministry: "Perda".to_string(),
            base_url: base_url.to_string(),
            feed_url: None,
            province: Some(ProvinceRef {
                name: name.to_string(),
                code: code.to_string(),
            }),
        }
    }

    pub fn with_feed(mut self, feed_url: Option<String>) -> Self {
        self.feed_url = feed_url;
        self
    }
}

/// Sources for one run in their fixed order: `esdm`, `klhk`, any other
/// configured ministry sources by key, then enabled Perda provinces in
/// config order. Disabled sources are still listed; the pipeline skips them.
pub fn plan_sources(config: &PipelineConfig) -> Vec<SourceDescriptor> {
    let mut plan = Vec::new();

    let mut keys: Vec<&str> = vec!["esdm", "klhk"];
    keys.extend(
        config
            .scraper
            .keys()
            .filter(|k| !matches!(*k, "esdm" | "klhk" | "perda")),
    );

    for key in keys {
        let cfg = config.scraper.source(key);
        let (ministry, default_base) = match key {
            "esdm" => ("ESDM".to_string(), ESDM_BASE_URL.to_string()),
            "klhk" => ("KLHK".to_string(), KLHK_BASE_URL.to_string()),
            other => (other.to_uppercase(), String::new()),
        };
        let base_url = cfg.base_url.clone().unwrap_or(default_base);
        plan.push(SourceDescriptor::ministry(key, &ministry, &base_url).with_feed(cfg.feed_url));
    }

    let perda = config.scraper.source("perda");
    for province in perda.provinces.iter().filter(|p| p.enabled) {
        plan.push(
            SourceDescriptor::perda(&province.name, &province.code, &province.url)
                .with_feed(province.feed_url.clone()),
        );
    }

    plan
}
