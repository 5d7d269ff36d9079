//! Configuration types for Catalogo components.
//!
//! Targets are loaded once per run from `targets.toml` (or a legacy JSON
//! country map) and are read-only afterwards. Run options carry the default
//! publication-date bounds that CLI flags may override.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

/// Default Socrata Discovery API endpoint.
pub const DEFAULT_DISCOVERY_BASE: &str = "https://api.us.socrata.com/api/catalog/v1";

/// Registry base URL used when a registry target omits `base_url`.
pub const DEFAULT_REGISTRY_BASE: &str = "https://datos.gob.mx";

/// HTTP client configuration for catalog API calls.
///
/// There is deliberately no retry budget here: every page request gets a
/// single attempt bounded by `timeout`.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: "Catalogo/0.1 (open-data-inventory)".to_string(),
        }
    }
}

/// Bounds applied to every harvest unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestConfig {
    /// Maximum canonical records kept per harvest unit (domain or base URL).
    pub per_target_cap: usize,
    /// Requested page size, clamped by each protocol's own maximum.
    pub page_size: usize,
    /// Maximum page requests per harvest unit.
    pub max_pages: usize,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            per_target_cap: 1000,
            page_size: 100,
            max_pages: 100,
        }
    }
}

impl HarvestConfig {
    pub fn with_per_target_cap(mut self, cap: usize) -> Self {
        self.per_target_cap = cap;
        self
    }

    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size.max(1);
        self
    }

    pub fn with_max_pages(mut self, pages: usize) -> Self {
        self.max_pages = pages;
        self
    }
}

// =============================================================================
// Platform kinds
// =============================================================================

/// Catalog protocol spoken by a target.
///
/// Configuration files may use either the protocol family name
/// (`discovery`, `registry`) or the vendor name (`socrata`, `ckan`). Any other
/// value is preserved as [`PlatformKind::Unsupported`] so that one odd entry
/// does not prevent the rest of the file from loading.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlatformKind {
    /// Federated Socrata Discovery API (default).
    #[default]
    Discovery,
    /// CKAN package registry.
    Registry,
    /// Platform tag with no client implementation.
    Unsupported(String),
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discovery => write!(f, "discovery"),
            Self::Registry => write!(f, "registry"),
            Self::Unsupported(tag) => write!(f, "{}", tag),
        }
    }
}

impl From<String> for PlatformKind {
    fn from(tag: String) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "discovery" | "socrata" => Self::Discovery,
            "registry" | "ckan" => Self::Registry,
            _ => Self::Unsupported(tag),
        }
    }
}

impl From<PlatformKind> for String {
    fn from(kind: PlatformKind) -> Self {
        kind.to_string()
    }
}

impl FromStr for PlatformKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match PlatformKind::from(s.to_string()) {
            Self::Unsupported(tag) => Err(AppError::ConfigError(format!(
                "Unknown platform: '{}'. Valid options: discovery (socrata), registry (ckan)",
                tag
            ))),
            kind => Ok(kind),
        }
    }
}

// =============================================================================
// Target configuration (targets.toml)
// =============================================================================

fn default_enabled() -> bool {
    true
}

/// Default publication-date bounds for a run.
///
/// Dates are kept as raw strings; parsing (and tolerance of bad values)
/// happens in [`crate::filter::DateRange::parse`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    pub published_from: Option<String>,
    pub published_to: Option<String>,
}

impl RunOptions {
    /// Combines CLI values with these defaults; CLI values win.
    pub fn overridden_by(&self, from: Option<String>, to: Option<String>) -> RunOptions {
        RunOptions {
            published_from: from.or_else(|| self.published_from.clone()),
            published_to: to.or_else(|| self.published_to.clone()),
        }
    }
}

/// Root configuration structure for `targets.toml`.
///
/// # Example
///
/// ```toml
/// [defaults]
/// published_from = "2023-01-01"
///
/// [[targets]]
/// name = "Colombia"
/// platform = "discovery"
/// domains = ["www.datos.gov.co"]
///
/// [[targets]]
/// name = "Mexico"
/// platform = "registry"
/// base_url = "https://datos.gob.mx"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetsConfig {
    #[serde(default)]
    pub targets: Vec<TargetEntry>,
    #[serde(default)]
    pub defaults: RunOptions,
}

impl TargetsConfig {
    /// Returns only enabled targets, in file order.
    pub fn enabled_targets(&self) -> Vec<&TargetEntry> {
        self.targets.iter().filter(|t| t.enabled).collect()
    }

    /// Finds a target by exact name, ignoring case.
    pub fn find_by_name(&self, name: &str) -> Option<&TargetEntry> {
        let wanted = name.to_lowercase();
        self.targets.iter().find(|t| t.name.to_lowercase() == wanted)
    }

    /// Like [`find_by_name`](Self::find_by_name), failing with
    /// [`AppError::TargetNotFound`].
    pub fn require(&self, name: &str) -> Result<&TargetEntry, AppError> {
        self.find_by_name(name)
            .ok_or_else(|| AppError::TargetNotFound(name.to_string()))
    }
}

/// A single harvesting target: a country or portal and how to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetEntry {
    /// Human-readable name, used for `--target` lookup and output file names.
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub platform: PlatformKind,

    /// Portal domains queried through the Discovery API.
    #[serde(default)]
    pub domains: Vec<String>,

    /// Base URL of a registry portal.
    pub base_url: Option<String>,

    /// Whether this target takes part in batch runs.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    pub description: Option<String>,

    /// Landing page template for registry datasets.
    ///
    /// Supports `{id}` and `{name}` placeholders. When unset, links are
    /// `{base_url}/dataset/{name}`.
    pub url_template: Option<String>,

    /// Preferred language for multilingual registry fields. Defaults to `"en"`.
    pub language: Option<String>,
}

impl TargetEntry {
    /// Creates a discovery target over the given domains.
    pub fn discovery(name: &str, domains: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            platform: PlatformKind::Discovery,
            domains: domains.iter().map(|d| d.to_string()).collect(),
            base_url: None,
            enabled: true,
            description: None,
            url_template: None,
            language: None,
        }
    }

    /// Creates a registry target rooted at `base_url`.
    pub fn registry(name: &str, base_url: &str) -> Self {
        Self {
            name: name.to_string(),
            platform: PlatformKind::Registry,
            domains: Vec::new(),
            base_url: Some(base_url.to_string()),
            enabled: true,
            description: None,
            url_template: None,
            language: None,
        }
    }

    pub fn language(&self) -> &str {
        self.language.as_deref().unwrap_or("en")
    }

    /// Registry base URL, falling back to [`DEFAULT_REGISTRY_BASE`].
    pub fn registry_base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_REGISTRY_BASE)
    }

    /// File-name stem for this target's outputs: lowercase, spaces to `_`.
    pub fn file_stem(&self) -> String {
        self.name.to_lowercase().replace(' ', "_")
    }
}

pub const CONFIG_FILE_NAME: &str = "targets.toml";

/// Returns `~/.config/catalogo/` (platform equivalent).
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("catalogo"))
}

/// Returns `~/.config/catalogo/targets.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|p| p.join(CONFIG_FILE_NAME))
}

const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Catalogo target configuration
#
# Usage:
#   catalogo harvest                    # Harvest all enabled targets
#   catalogo harvest --target colombia  # Harvest one target by name
#
# platform = "discovery" (Socrata Discovery API) or "registry" (CKAN).
# Set enabled = false to skip a target during batch runs.

[defaults]
# published_from = "2020-01-01"
# published_to = "2024-12-31"

[[targets]]
name = "Colombia"
platform = "discovery"
domains = ["www.datos.gov.co"]
description = "Portal de Datos Abiertos de Colombia"

[[targets]]
name = "Mexico"
platform = "registry"
base_url = "https://datos.gob.mx"
description = "Datos Abiertos de México"
"#;

/// Loads target configuration from a TOML file, or a legacy JSON target map
/// when the path ends in `.json`.
///
/// # Returns
/// * `Ok(Some(config))` - configuration loaded
/// * `Ok(None)` - no default path is available on this platform
/// * `Err(e)` - the file is missing (custom path) or invalid
///
/// When the default path does not exist yet, a template is written there
/// first and then loaded.
pub fn load_targets_config(path: Option<PathBuf>) -> Result<Option<TargetsConfig>, AppError> {
    let using_default_path = path.is_none();
    let config_path = match path {
        Some(p) => p,
        None => match default_config_path() {
            Some(p) => p,
            None => return Ok(None),
        },
    };

    if !config_path.exists() {
        if using_default_path {
            match create_default_config(&config_path) {
                Ok(()) => {
                    tracing::info!(
                        "Config file created at {}. Harvesting default targets...",
                        config_path.display()
                    );
                }
                Err(e) => {
                    tracing::warn!("Could not create default config template: {}", e);
                    return Ok(None);
                }
            }
        } else {
            return Err(AppError::ConfigError(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }
    }

    let content = std::fs::read_to_string(&config_path).map_err(|e| {
        AppError::ConfigError(format!(
            "Failed to read config file '{}': {}",
            config_path.display(),
            e
        ))
    })?;

    let config = if is_json(&config_path) {
        parse_legacy_json(&content).map_err(|e| {
            AppError::ConfigError(format!(
                "Invalid target map in '{}': {}",
                config_path.display(),
                e
            ))
        })?
    } else {
        toml::from_str::<TargetsConfig>(&content).map_err(|e| {
            AppError::ConfigError(format!(
                "Invalid TOML in '{}': {}",
                config_path.display(),
                e
            ))
        })?
    };

    if let Some(unnamed) = config.targets.iter().position(|t| t.name.trim().is_empty()) {
        return Err(AppError::ConfigError(format!(
            "Target #{} in '{}' has no name",
            unnamed + 1,
            config_path.display()
        )));
    }

    Ok(Some(config))
}

/// Parses `{"Colombia": {"platform": "socrata", "domains": [...]}, ...}`,
/// keeping document order.
fn parse_legacy_json(content: &str) -> Result<TargetsConfig, serde_json::Error> {
    let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(content)?;
    let mut targets = Vec::with_capacity(map.len());
    for (name, value) in map {
        let mut entry: TargetEntry = serde_json::from_value(value)?;
        entry.name = name;
        targets.push(entry);
    }
    Ok(TargetsConfig {
        targets,
        defaults: RunOptions::default(),
    })
}

/// Loads a standalone run-options document (JSON or TOML).
///
/// A missing or unreadable document yields empty options: the dates it
/// carries are conveniences, not requirements.
pub fn load_run_options(path: &Path) -> RunOptions {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Run options not readable, using none");
            return RunOptions::default();
        }
    };

    let parsed = if is_json(path) {
        serde_json::from_str::<RunOptions>(&content).map_err(|e| e.to_string())
    } else {
        toml::from_str::<RunOptions>(&content).map_err(|e| e.to_string())
    };

    parsed.unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "Invalid run options, using none");
        RunOptions::default()
    })
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn create_default_config(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, DEFAULT_CONFIG_TEMPLATE)?;
    tracing::info!("Created default config template at: {}", path.display());

    Ok(())
}
