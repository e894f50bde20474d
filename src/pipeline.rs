//! Build orchestration.
//!
//! A build is a fixed sequence of phases driven by [`Builder::run`]:
//!
//! ```text
//! Idle → Validating → Clearing → Mirroring → BuildingPages → Done
//!            └───────────┴───────────┴─────────────┴──────→ Failed
//! ```
//!
//! - **Validating**: the config must pass [`SiteConfig::validate`] (so the
//!   output root lies strictly below the project root and holds no inputs)
//!   and every required partial must exist. Nothing under the output root
//!   has been touched when this fails.
//! - **Clearing**: the output root is deleted and recreated empty. There is
//!   no confirmation step.
//! - **Mirroring**: static items are copied with [`crate::mirror`].
//! - **BuildingPages**: source pages are enumerated in file-name order;
//!   each is expanded, routed, and written.
//!
//! The first error stops the build and leaves the output root as it was at
//! that point. Progress is reported as [`BuildEvent`]s over an optional
//! channel so the CLI can print a per-file log while the build runs.

use crate::config::{ConfigError, SiteConfig};
use crate::include::{IncludeError, IncludeExpander, find_directives};
use crate::mirror::{MirroredItem, mirror_static};
use crate::paths::{self, ProjectRoot};
use crate::router::{RouteError, RouteKind, RouteTable, page_base_name};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Required file missing: {0}")]
    MissingRequiredFile(String),
    #[error("No source pages found in {} (expected *{suffix})", .dir.display())]
    NoSourcePages { dir: PathBuf, suffix: String },
    #[error("Failed to build {page}: {source}")]
    Page { page: String, source: IncludeError },
    #[error("Cannot route {page}: {source}")]
    Route { page: String, source: RouteError },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Builder has already run (state: {0})")]
    AlreadyRun(BuildState),
}

/// Phase of a [`Builder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Idle,
    Validating,
    Clearing,
    Mirroring,
    BuildingPages,
    Done,
    Failed,
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildState::Idle => "idle",
            BuildState::Validating => "validating",
            BuildState::Clearing => "clearing",
            BuildState::Mirroring => "mirroring",
            BuildState::BuildingPages => "building pages",
            BuildState::Done => "done",
            BuildState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A page written to the output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPage {
    /// Source filename, e.g. `about.src.html`.
    pub source: String,
    pub base_name: String,
    /// Written file, relative to the project root when it lies below it.
    pub output: PathBuf,
    pub kind: RouteKind,
}

/// Progress reported while a build runs.
#[derive(Debug, Clone)]
pub enum BuildEvent {
    PhaseStarted(BuildState),
    Copied(MirroredItem),
    Built(BuiltPage),
    Finished { pages: usize, static_items: usize },
}

/// Everything a successful build produced.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub mirrored: Vec<MirroredItem>,
    pub pages: Vec<BuiltPage>,
}

/// A file in the pages directory carrying the page suffix.
#[derive(Debug, Clone)]
struct SourcePage {
    path: PathBuf,
    file_name: String,
    base_name: String,
}

/// Runs one build of a project into its output root.
pub struct Builder<'a> {
    config: &'a SiteConfig,
    root: ProjectRoot,
    output_root: PathBuf,
    routes: RouteTable,
    expander: IncludeExpander,
    state: BuildState,
    events: Option<Sender<BuildEvent>>,
}

impl<'a> Builder<'a> {
    pub fn new(config: &'a SiteConfig, root: ProjectRoot) -> Self {
        Self {
            output_root: output_root_for(config, &root),
            routes: RouteTable::from_config(&config.routing),
            expander: expander_for(config, &root),
            config,
            root,
            state: BuildState::Idle,
            events: None,
        }
    }

    /// Report progress on `events` while running.
    pub fn with_events(mut self, events: Sender<BuildEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Run every phase. A builder runs at most once.
    pub fn run(&mut self) -> Result<BuildReport, BuildError> {
        if self.state != BuildState::Idle {
            return Err(BuildError::AlreadyRun(self.state));
        }
        match self.run_phases() {
            Ok(report) => {
                self.state = BuildState::Done;
                self.emit(BuildEvent::Finished {
                    pages: report.pages.len(),
                    static_items: report.mirrored.len(),
                });
                tracing::info!(
                    pages = report.pages.len(),
                    static_items = report.mirrored.len(),
                    "Build complete"
                );
                Ok(report)
            }
            Err(err) => {
                tracing::debug!(phase = %self.state, error = %err, "Build failed");
                self.state = BuildState::Failed;
                Err(err)
            }
        }
    }

    fn run_phases(&mut self) -> Result<BuildReport, BuildError> {
        let mut report = BuildReport::default();

        self.enter(BuildState::Validating);
        self.config.validate()?;
        validate_required(self.config, &self.root)?;

        self.enter(BuildState::Clearing);
        clear_output(&self.output_root)?;

        self.enter(BuildState::Mirroring);
        for item in mirror_static(
            self.root.path(),
            &self.output_root,
            &self.config.build.static_items,
        )? {
            self.emit(BuildEvent::Copied(item.clone()));
            report.mirrored.push(item);
        }

        self.enter(BuildState::BuildingPages);
        for page in find_source_pages(self.config, &self.root)? {
            let built = self.build_page(&page)?;
            self.emit(BuildEvent::Built(built.clone()));
            report.pages.push(built);
        }

        Ok(report)
    }

    fn build_page(&self, page: &SourcePage) -> Result<BuiltPage, BuildError> {
        let html = self
            .expander
            .expand_file(&page.path)
            .map_err(|source| BuildError::Page {
                page: page.file_name.clone(),
                source,
            })?;
        let route = self
            .routes
            .route(&page.base_name)
            .map_err(|source| BuildError::Route {
                page: page.file_name.clone(),
                source,
            })?;

        let out_path = route.output_path(&self.output_root);
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&out_path, html)?;

        Ok(BuiltPage {
            source: page.file_name.clone(),
            base_name: page.base_name.clone(),
            output: self.root.relative(&out_path).to_path_buf(),
            kind: route.kind,
        })
    }

    fn enter(&mut self, state: BuildState) {
        tracing::debug!(phase = %state, "Entering build phase");
        self.state = state;
        self.emit(BuildEvent::PhaseStarted(state));
    }

    fn emit(&self, event: BuildEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver only loses log lines
            tx.send(event).ok();
        }
    }
}

/// What a build would produce for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePlan {
    pub source: String,
    pub base_name: String,
    /// Destination, relative to the project root when it lies below it.
    pub output: PathBuf,
    pub kind: RouteKind,
    /// References of the directives written directly in the page.
    pub includes: Vec<String>,
}

/// Result of [`check`].
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    pub pages: Vec<PagePlan>,
    /// Each configured static item and whether it is present.
    pub static_items: Vec<(String, bool)>,
}

/// Validate a project and expand every page without writing anything.
///
/// Fails with the same errors a build would, but never touches the output
/// root.
pub fn check(config: &SiteConfig, root: &ProjectRoot) -> Result<CheckReport, BuildError> {
    config.validate()?;
    validate_required(config, root)?;

    let routes = RouteTable::from_config(&config.routing);
    let expander = expander_for(config, root);
    let output_root = output_root_for(config, root);

    let mut report = CheckReport::default();
    for page in find_source_pages(config, root)? {
        expander
            .expand_file(&page.path)
            .map_err(|source| BuildError::Page {
                page: page.file_name.clone(),
                source,
            })?;
        let route = routes
            .route(&page.base_name)
            .map_err(|source| BuildError::Route {
                page: page.file_name.clone(),
                source,
            })?;
        let text = fs::read_to_string(&page.path)?;
        report.pages.push(PagePlan {
            output: root.relative(&route.output_path(&output_root)).to_path_buf(),
            kind: route.kind,
            includes: find_directives(&text),
            source: page.file_name,
            base_name: page.base_name,
        });
    }

    report.static_items = config
        .build
        .static_items
        .iter()
        .map(|item| (item.clone(), root.exists(item)))
        .collect();

    Ok(report)
}

/// Output root with `.` and `..` folded away.
fn output_root_for(config: &SiteConfig, root: &ProjectRoot) -> PathBuf {
    match paths::normalize(&config.paths.output) {
        Some(rel) => root.path().join(rel),
        None => root.resolve(&config.paths.output),
    }
}

fn expander_for(config: &SiteConfig, root: &ProjectRoot) -> IncludeExpander {
    IncludeExpander::new(root.clone(), config.includes.max_depth)
        .with_max_substitutions(config.includes.max_substitutions)
}

fn validate_required(config: &SiteConfig, root: &ProjectRoot) -> Result<(), BuildError> {
    for rel in &config.build.required_partials {
        if !root.exists(rel) {
            return Err(BuildError::MissingRequiredFile(rel.clone()));
        }
    }
    Ok(())
}

fn clear_output(output_root: &Path) -> Result<(), BuildError> {
    if output_root.is_dir() {
        fs::remove_dir_all(output_root)?;
    } else if output_root.exists() {
        fs::remove_file(output_root)?;
    }
    fs::create_dir_all(output_root)?;
    Ok(())
}

/// Regular files in the pages directory ending with the page suffix,
/// sorted by file name.
fn find_source_pages(config: &SiteConfig, root: &ProjectRoot) -> Result<Vec<SourcePage>, BuildError> {
    let dir = root.resolve(&config.paths.pages);
    let suffix = &config.paths.page_suffix;
    let no_pages = || BuildError::NoSourcePages {
        dir: root.relative(&dir).to_path_buf(),
        suffix: suffix.clone(),
    };

    if !dir.is_dir() {
        return Err(no_pages());
    }

    let mut pages = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            tracing::warn!(path = %path.display(), "Skipping page with a non UTF-8 file name");
            continue;
        };
        if let Some(base_name) = page_base_name(file_name, suffix) {
            pages.push(SourcePage {
                base_name: base_name.to_string(),
                file_name: file_name.to_string(),
                path: path.clone(),
            });
        }
    }

    if pages.is_empty() {
        return Err(no_pages());
    }
    pages.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    tracing::debug!(count = pages.len(), "Found source pages");
    Ok(pages)
}
