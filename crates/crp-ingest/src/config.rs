//! Sources configuration
//!
//! Declares which upstream sources exist, how often they run and which
//! extraction mode applies. Loaded from a YAML/TOML file layered under
//! `CRP_`-prefixed environment overrides. Unknown keys are rejected so a
//! typo in a source declaration fails loudly at startup.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crp_common::{CrpError, Result};

use crate::adapter::SourceAdapter;
use crate::adapters::{GisAdapter, LegistarApiAdapter, LegistarHtmlAdapter, RssAdapter};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourcesConfig {
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Stable source identity; namespaces every record the source emits
    pub id: String,
    /// Human-readable name (doubles as the publisher for feed sources)
    pub name: String,
    pub kind: SourceKind,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Cron-like cadence hint consumed by the external scheduler
    pub cadence: String,
    /// Human-readable provenance statement for audit display
    pub provenance: String,
    pub base_url: String,
    pub extraction_hints: ExtractionHints,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Legistar,
    Rss,
    Gis,
    Zoning,
}

impl SourceKind {
    pub fn as_str(&self) -> &str {
        match self {
            SourceKind::Legistar => "legistar",
            SourceKind::Rss => "rss",
            SourceKind::Gis => "gis",
            SourceKind::Zoning => "zoning",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractionHints {
    pub mode: ExtractionMode,
    /// Parser hint, e.g. `json`, `calendar-page`, `geojson`
    pub parser: String,
    #[serde(default)]
    pub table_aware: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    Api,
    Html,
    Rss,
    Gis,
}

/// Load sources from `path`, with `CRP_`-prefixed environment variables
/// taking precedence over file values.
pub fn load_sources_config(path: impl AsRef<Path>) -> Result<SourcesConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path.as_ref()))
        .add_source(config::Environment::with_prefix("CRP").separator("__"))
        .build()
        .map_err(|err| CrpError::Config(err.to_string()))?;
    settings
        .try_deserialize()
        .map_err(|err| CrpError::Config(err.to_string()))
}

/// Map a source declaration to its concrete adapter. The optional
/// `[from, to]` date window only constrains API-mode discovery.
pub fn build_adapter(
    source: &SourceConfig,
    from: Option<&str>,
    to: Option<&str>,
) -> Box<dyn SourceAdapter> {
    match source.extraction_hints.mode {
        ExtractionMode::Api => Box::new(
            LegistarApiAdapter::new(source.id.clone(), source.base_url.clone()).with_window(
                from.map(str::to_string),
                to.map(str::to_string),
            ),
        ),
        ExtractionMode::Html => Box::new(LegistarHtmlAdapter::new(
            source.id.clone(),
            source.base_url.clone(),
        )),
        ExtractionMode::Rss => Box::new(RssAdapter::new(
            source.id.clone(),
            source.base_url.clone(),
            source.name.clone(),
        )),
        ExtractionMode::Gis => Box::new(GisAdapter::new(
            source.id.clone(),
            source.base_url.clone(),
            source.id.clone(),
        )),
    }
}
