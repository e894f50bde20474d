//! # ora-site
//!
//! A small static site builder. Pages are plain HTML templates that pull in
//! shared partials with include directives; the build resolves every
//! directive, writes each page to a clean-URL location, and copies static
//! files next to them.
//!
//! # Project Layout
//!
//! ```text
//! site.toml                      # Optional config (see `ora-site gen-config`)
//! templates/
//! ├── pages/
//! │   ├── index.src.html         # → dist/index.html
//! │   ├── personalisation.src.html  # → dist/personalisation.html
//! │   └── about.src.html         # → dist/about/index.html
//! └── partials/
//!     ├── head-common.html       # Required
//!     ├── header.html            # Required
//!     ├── nav.html               # Required
//!     ├── footer.html            # Required
//!     └── analytics.html         # Required
//! assets/  favicon.ico  robots.txt  sitemap.xml  CNAME   # Optional, copied as-is
//! ```
//!
//! Inside any page or partial:
//!
//! ```html
//! <!-- ORA:include templates/partials/header.html -->
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`paths`] | Resolves project-relative references against an explicit root |
//! | [`include`] | Expands include directives recursively, with cycle detection |
//! | [`router`] | Ordered rule table mapping page base names to output paths |
//! | [`mirror`] | Copies static files and directories into the output tree |
//! | [`pipeline`] | Runs validate → clear → mirror → build pages; also `check` |
//! | [`config`] | `site.toml` loading, merging over stock defaults, validation |
//! | [`output`] | CLI output formatting for build events and check reports |
//!
//! # Design Decisions
//!
//! ## Full Rebuilds Only
//!
//! Every build deletes the output root and writes it again. There is no
//! cache and no incremental mode; the sites this tool targets are a handful
//! of pages, and a clean tree is the only state worth reasoning about.
//! Running the build twice on unchanged input yields identical output.
//!
//! ## Fail Fast, No Rollback
//!
//! The first error ends the build. Required partials are checked before the
//! output root is touched; after that point a failure leaves whatever was
//! already written.
//!
//! ## Bounded Include Expansion
//!
//! Expansion rewrites the first directive and rescans from the top until
//! none is left. A partial that includes itself, directly or through
//! others, is reported as a circular include instead of expanding forever,
//! and a per-page substitution cap bounds everything else.

pub mod config;
pub mod include;
pub mod mirror;
pub mod output;
pub mod paths;
pub mod pipeline;
pub mod router;

#[cfg(test)]
pub(crate) mod test_helpers;
