//! Site configuration module.
//!
//! Handles loading, validating, and merging the optional `site.toml` at the
//! project root. Every key has a stock default; the file only needs the
//! values it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [paths]
//! pages = "templates/pages"   # Directory holding source pages
//! page_suffix = ".src.html"   # Suffix that marks a file as a source page
//! output = "dist"             # Output root (wiped on every build)
//!
//! [routing]
//! home = "index"                    # Base name written to <output>/index.html
//! flat_pages = ["personalisation"]  # Written to <output>/<name>.html
//! extension = "html"                # Extension of every generated page
//!
//! [includes]
//! max_depth = 32              # Deepest allowed include chain
//! max_substitutions = 10000   # Directive replacements allowed per page
//!
//! [build]
//! required_partials = [
//!     "templates/partials/head-common.html",
//!     "templates/partials/header.html",
//!     "templates/partials/nav.html",
//!     "templates/partials/footer.html",
//!     "templates/partials/analytics.html",
//! ]
//! static_items = ["assets", "favicon.ico", "robots.txt", "sitemap.xml", "CNAME"]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::include::DEFAULT_MAX_SUBSTITUTIONS;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the optional config file at the project root.
pub const CONFIG_FILENAME: &str = "site.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `site.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Input and output locations, relative to the project root.
    pub paths: PathsConfig,
    /// Output naming rules for source pages.
    pub routing: RoutingConfig,
    /// Include expansion limits.
    pub includes: IncludesConfig,
    /// Required partials and static items.
    pub build: BuildConfig,
}

impl SiteConfig {
    /// Validate config values are usable before any file is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.paths.page_suffix.is_empty() {
            return Err(ConfigError::Validation(
                "paths.page_suffix must not be empty".into(),
            ));
        }
        self.validate_output()?;
        if self.routing.home.is_empty() {
            return Err(ConfigError::Validation(
                "routing.home must not be empty".into(),
            ));
        }
        if self.routing.extension.is_empty() || self.routing.extension.starts_with('.') {
            return Err(ConfigError::Validation(
                "routing.extension must be non-empty and have no leading dot".into(),
            ));
        }
        for name in &self.routing.flat_pages {
            if name.is_empty() {
                return Err(ConfigError::Validation(
                    "routing.flat_pages entries must not be empty".into(),
                ));
            }
            if *name == self.routing.home {
                return Err(ConfigError::Validation(format!(
                    "routing.flat_pages must not contain the home page '{name}'"
                )));
            }
        }
        if self.includes.max_depth == 0 {
            return Err(ConfigError::Validation(
                "includes.max_depth must be at least 1".into(),
            ));
        }
        if self.includes.max_substitutions == 0 {
            return Err(ConfigError::Validation(
                "includes.max_substitutions must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// The output root is deleted on every build, so it must sit strictly
    /// below the project root and hold none of the build inputs.
    fn validate_output(&self) -> Result<(), ConfigError> {
        let output = match paths::normalize(&self.paths.output) {
            Some(output) if !output.as_os_str().is_empty() => output,
            _ => {
                return Err(ConfigError::Validation(format!(
                    "paths.output must name a directory below the project root, got '{}'",
                    self.paths.output
                )));
            }
        };

        let inputs = std::iter::once(("paths.pages", &self.paths.pages))
            .chain(
                self.build
                    .required_partials
                    .iter()
                    .map(|p| ("build.required_partials", p)),
            )
            .chain(
                self.build
                    .static_items
                    .iter()
                    .map(|item| ("build.static_items", item)),
            );
        for (key, input) in inputs {
            // Inputs outside the root can never lie below the output root
            let Some(input) = paths::normalize(input) else {
                continue;
            };
            if input.starts_with(&output) {
                return Err(ConfigError::Validation(format!(
                    "paths.output '{}' would delete {key} entry '{}'",
                    self.paths.output,
                    input.display()
                )));
            }
        }

        for item in self.build.static_items.iter().filter_map(|i| paths::normalize(i)) {
            if !item.as_os_str().is_empty() && output.starts_with(&item) {
                return Err(ConfigError::Validation(format!(
                    "paths.output '{}' must not lie inside static item '{}'",
                    self.paths.output,
                    item.display()
                )));
            }
        }
        Ok(())
    }
}

/// Input and output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Directory holding source pages.
    pub pages: String,
    /// Filename suffix identifying a source page; stripped to get the base name.
    pub page_suffix: String,
    /// Output root. Removed and recreated on every build.
    pub output: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            pages: "templates/pages".to_string(),
            page_suffix: ".src.html".to_string(),
            output: "dist".to_string(),
        }
    }
}

/// Output naming rules. See [`crate::router::RouteTable`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoutingConfig {
    /// Base name of the page written to the output root's index document.
    pub home: String,
    /// Base names written directly under the output root as `<name>.<ext>`.
    pub flat_pages: Vec<String>,
    /// Extension of generated documents, without the dot.
    pub extension: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            home: "index".to_string(),
            flat_pages: vec!["personalisation".to_string()],
            extension: "html".to_string(),
        }
    }
}

/// Include expansion limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IncludesConfig {
    /// Maximum number of nested includes along one chain.
    pub max_depth: usize,
    /// Maximum number of directive substitutions while expanding one page.
    pub max_substitutions: usize,
}

impl Default for IncludesConfig {
    fn default() -> Self {
        Self {
            max_depth: 32,
            max_substitutions: DEFAULT_MAX_SUBSTITUTIONS,
        }
    }
}

/// Required partials and static items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project-relative files that must exist before the output is touched.
    pub required_partials: Vec<String>,
    /// Top-level files or directories mirrored verbatim when present.
    pub static_items: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            required_partials: [
                "templates/partials/head-common.html",
                "templates/partials/header.html",
                "templates/partials/nav.html",
                "templates/partials/footer.html",
                "templates/partials/analytics.html",
            ]
            .map(String::from)
            .to_vec(),
            static_items: ["assets", "favicon.ico", "robots.txt", "sitemap.xml", "CNAME"]
                .map(String::from)
                .to_vec(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key by key; any other overlay value replaces the base value,
/// so arrays such as `flat_pages` are replaced rather than appended to.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `site.toml` from the project root as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config for a project root: stock defaults overlaid with `site.toml`.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let overlay = load_raw_config(root)?;
    if overlay.is_some() {
        tracing::debug!(root = %root.display(), "Loaded {CONFIG_FILENAME}");
    }
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `site.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# ora-site configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.
# Place this file at the project root as site.toml.

# ---------------------------------------------------------------------------
# Paths (relative to the project root)
# ---------------------------------------------------------------------------
[paths]
# Directory holding source pages.
pages = "templates/pages"

# Files in the pages directory ending with this suffix are source pages.
# The suffix is stripped to give the page's base name.
page_suffix = ".src.html"

# Output root. It is deleted and recreated on every build, so it must be a
# directory strictly below the project root that holds none of the inputs
# listed in this file.
output = "dist"

# ---------------------------------------------------------------------------
# Routing: base name -> output path (first matching rule wins)
# ---------------------------------------------------------------------------
[routing]
# This page becomes <output>/index.html.
home = "index"

# These pages become <output>/<name>.html.
# Every other page becomes <output>/<name>/index.html.
flat_pages = ["personalisation"]

# Extension of generated documents (no leading dot).
extension = "html"

# ---------------------------------------------------------------------------
# Include expansion: <!-- ORA:include path/to/partial.html -->
# ---------------------------------------------------------------------------
[includes]
# Deepest allowed chain of nested includes.
max_depth = 32

# Directive replacements allowed while expanding one page.
max_substitutions = 10000

# ---------------------------------------------------------------------------
# Build inputs
# ---------------------------------------------------------------------------
[build]
# The build stops before touching the output if any of these is missing.
required_partials = [
    "templates/partials/head-common.html",
    "templates/partials/header.html",
    "templates/partials/nav.html",
    "templates/partials/footer.html",
    "templates/partials/analytics.html",
]

# Copied verbatim into the output root when present; missing items are skipped.
static_items = ["assets", "favicon.ico", "robots.txt", "sitemap.xml", "CNAME"]
"##
}
