//! Output paths for source pages.
//!
//! A page's output location depends only on its base name (the filename with
//! the page suffix removed). Routing is an ordered rule table; the first
//! matching rule wins:
//!
//! | Rule | Matches | Output |
//! |------|---------|--------|
//! | [`RouteRule::Home`] | the home name | `index.html` |
//! | [`RouteRule::FlatPage`] | one configured name | `<name>.html` |
//! | [`RouteRule::DefaultPage`] | anything | `<name>/index.html` |
//!
//! With the stock config, `index` → `dist/index.html`, `personalisation` →
//! `dist/personalisation.html`, and `about` → `dist/about/index.html`.

use crate::config::RoutingConfig;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RouteError {
    #[error("page base name is empty")]
    EmptyBaseName,
}

/// One row of the routing table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteRule {
    /// The page written to the output root's index document.
    Home(String),
    /// A page written directly under the output root.
    FlatPage(String),
    /// Any page, written as a directory with an index document.
    DefaultPage,
}

impl RouteRule {
    pub fn kind(&self) -> RouteKind {
        match self {
            RouteRule::Home(_) => RouteKind::Home,
            RouteRule::FlatPage(_) => RouteKind::FlatPage,
            RouteRule::DefaultPage => RouteKind::DefaultPage,
        }
    }

    pub fn matches(&self, base_name: &str) -> bool {
        match self {
            RouteRule::Home(name) | RouteRule::FlatPage(name) => name == base_name,
            RouteRule::DefaultPage => true,
        }
    }

    /// Output path relative to the output root.
    fn relative_path(&self, base_name: &str, extension: &str) -> PathBuf {
        match self {
            RouteRule::Home(_) => PathBuf::from(format!("index.{extension}")),
            RouteRule::FlatPage(_) => PathBuf::from(format!("{base_name}.{extension}")),
            RouteRule::DefaultPage => Path::new(base_name).join(format!("index.{extension}")),
        }
    }
}

/// Which rule routed a page, without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Home,
    FlatPage,
    DefaultPage,
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteKind::Home => write!(f, "home"),
            RouteKind::FlatPage => write!(f, "flat"),
            RouteKind::DefaultPage => write!(f, "page"),
        }
    }
}

/// Where a page goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRoute {
    pub kind: RouteKind,
    /// Path relative to the output root.
    pub relative: PathBuf,
}

impl PageRoute {
    pub fn output_path(&self, output_root: &Path) -> PathBuf {
        output_root.join(&self.relative)
    }
}

/// Ordered routing rules plus the extension of generated documents.
#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
    extension: String,
}

impl RouteTable {
    /// Build a table from explicit rules.
    ///
    /// A trailing [`RouteRule::DefaultPage`] is appended when missing so
    /// every non-empty base name routes somewhere.
    pub fn new(mut rules: Vec<RouteRule>, extension: impl Into<String>) -> Self {
        if !rules.contains(&RouteRule::DefaultPage) {
            rules.push(RouteRule::DefaultPage);
        }
        Self {
            rules,
            extension: extension.into(),
        }
    }

    /// Home first, then each flat page in config order, then the default.
    pub fn from_config(config: &RoutingConfig) -> Self {
        let rules = std::iter::once(RouteRule::Home(config.home.clone()))
            .chain(config.flat_pages.iter().cloned().map(RouteRule::FlatPage))
            .collect();
        Self::new(rules, config.extension.clone())
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    pub fn route(&self, base_name: &str) -> Result<PageRoute, RouteError> {
        if base_name.is_empty() {
            return Err(RouteError::EmptyBaseName);
        }
        let route = match self.rules.iter().find(|rule| rule.matches(base_name)) {
            Some(rule) => PageRoute {
                kind: rule.kind(),
                relative: rule.relative_path(base_name, &self.extension),
            },
            None => PageRoute {
                kind: RouteKind::DefaultPage,
                relative: RouteRule::DefaultPage.relative_path(base_name, &self.extension),
            },
        };
        Ok(route)
    }
}

/// Strip the page suffix from a filename.
///
/// Returns `None` when the name does not end with `suffix`. The result may
/// be empty (a file named exactly like the suffix); routing rejects that.
pub fn page_base_name<'a>(file_name: &'a str, suffix: &str) -> Option<&'a str> {
    file_name.strip_suffix(suffix)
}
