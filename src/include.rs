//! Include directive expansion.
//!
//! Documents pull in partials with a comment-style directive:
//!
//! ```html
//! <head>
//!   <!-- ORA:include templates/partials/head-common.html -->
//! </head>
//! ```
//!
//! The argument is a project-relative path, whitespace-trimmed. Text around
//! a directive on the same line is kept as is.
//!
//! ## Rewriting
//!
//! Expansion is a rewrite loop over one working text: find the first
//! directive, replace the whole match with the referenced file's raw
//! content, then scan again from the top. It stops when no directive is
//! left, so the result never contains one, including directives that only
//! form once included text meets the text around it.
//!
//! ## Cycles
//!
//! Every byte of the working text remembers the include chain it came from
//! (a span map over an arena of chain links). A directive belongs to the
//! chain of the span holding its first byte. Including a file that is
//! already on that chain is a [`IncludeError::CircularInclude`]; a chain
//! longer than `max_depth` is a [`IncludeError::DepthExceeded`]. Including
//! the same partial twice side by side is not a cycle, and each occurrence
//! re-reads the file. The total number of substitutions per document is
//! capped as well, so the loop ends even for inputs the chain checks cannot
//! attribute.

use crate::paths::ProjectRoot;
use regex::Regex;
use std::fs;
use std::iter;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// Substitutions allowed per document unless configured otherwise.
pub const DEFAULT_MAX_SUBSTITUTIONS: usize = 10_000;

static INCLUDE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--\s*ORA:include\s+(.+?)\s*-->").expect("include pattern is valid")
});

#[derive(Error, Debug)]
pub enum IncludeError {
    #[error("Missing include file: {0}")]
    MissingInclude(String),
    #[error("Circular include: {}", .chain.join(" -> "))]
    CircularInclude { chain: Vec<String> },
    #[error("Include depth exceeded maximum of {max_depth} at: {reference}")]
    DepthExceeded { reference: String, max_depth: usize },
    #[error("Include expansion exceeded {limit} substitutions")]
    SubstitutionLimit { limit: usize },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A file on an include chain. Chains share prefixes through `parent`.
struct Link {
    parent: Option<usize>,
    key: PathBuf,
    reference: String,
    /// Includes between the document and this file.
    depth: usize,
}

/// A byte range of the working text and the chain its content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: usize,
    end: usize,
    link: Option<usize>,
}

/// Working state for one document.
struct Rewrite {
    text: String,
    spans: Vec<Span>,
    links: Vec<Link>,
    substitutions: usize,
}

impl Rewrite {
    fn new(text: &str, page: Option<Link>) -> Self {
        let link = page.as_ref().map(|_| 0);
        let spans = if text.is_empty() {
            Vec::new()
        } else {
            vec![Span {
                start: 0,
                end: text.len(),
                link,
            }]
        };
        Self {
            text: text.to_string(),
            spans,
            links: page.into_iter().collect(),
            substitutions: 0,
        }
    }

    /// Chain of the span holding byte `pos`.
    fn owner_at(&self, pos: usize) -> Option<usize> {
        self.spans
            .iter()
            .find(|span| span.start <= pos && pos < span.end)
            .and_then(|span| span.link)
    }

    /// Links from `owner` back to the document, innermost first.
    fn chain(&self, owner: Option<usize>) -> impl Iterator<Item = &Link> {
        iter::successors(owner, |&i| self.links[i].parent).map(|i| &self.links[i])
    }

    fn depth(&self, owner: Option<usize>) -> usize {
        owner.map_or(0, |i| self.links[i].depth)
    }

    /// Replace `range` with `content` and attribute the new bytes to `link`.
    fn splice(&mut self, range: Range<usize>, content: &str, link: usize) {
        let removed = range.len();
        let mut spans = Vec::with_capacity(self.spans.len() + 2);
        let mut inserted = false;
        for span in &self.spans {
            if span.end <= range.start {
                spans.push(*span);
                continue;
            }
            if span.start < range.start {
                spans.push(Span {
                    end: range.start,
                    ..*span
                });
            }
            if !inserted {
                if !content.is_empty() {
                    spans.push(Span {
                        start: range.start,
                        end: range.start + content.len(),
                        link: Some(link),
                    });
                }
                inserted = true;
            }
            if span.end > range.end {
                let start = span.start.max(range.end);
                spans.push(Span {
                    start: start - removed + content.len(),
                    end: span.end - removed + content.len(),
                    link: span.link,
                });
            }
        }
        self.spans = spans;
        self.text.replace_range(range, content);
    }
}

/// Expands `ORA:include` directives against a project root.
#[derive(Debug, Clone)]
pub struct IncludeExpander {
    root: ProjectRoot,
    max_depth: usize,
    max_substitutions: usize,
}

impl IncludeExpander {
    pub fn new(root: ProjectRoot, max_depth: usize) -> Self {
        Self {
            root,
            max_depth,
            max_substitutions: DEFAULT_MAX_SUBSTITUTIONS,
        }
    }

    /// Cap the substitutions made while expanding one document.
    pub fn with_max_substitutions(mut self, max_substitutions: usize) -> Self {
        self.max_substitutions = max_substitutions;
        self
    }

    /// Expand every directive in `text`.
    ///
    /// Text without directives comes back unchanged.
    pub fn expand(&self, text: &str) -> Result<String, IncludeError> {
        self.rewrite(Rewrite::new(text, None))
    }

    /// Read a document and expand it.
    ///
    /// The document itself sits at the bottom of every chain, so a partial
    /// that includes the page back is reported as a cycle.
    pub fn expand_file(&self, path: &Path) -> Result<String, IncludeError> {
        let text = fs::read_to_string(path)?;
        let page = Link {
            parent: None,
            key: fs::canonicalize(path)?,
            reference: self.root.relative(path).display().to_string(),
            depth: 0,
        };
        self.rewrite(Rewrite::new(&text, Some(page)))
    }

    fn rewrite(&self, mut doc: Rewrite) -> Result<String, IncludeError> {
        while let Some((range, reference)) = first_directive(&doc.text) {
            let owner = doc.owner_at(range.start);
            let path = self.root.resolve(&reference);
            if !path.exists() {
                return Err(IncludeError::MissingInclude(reference));
            }

            let key = fs::canonicalize(&path)?;
            if doc.chain(owner).any(|link| link.key == key) {
                let mut chain: Vec<String> =
                    doc.chain(owner).map(|link| link.reference.clone()).collect();
                chain.reverse();
                chain.push(reference);
                return Err(IncludeError::CircularInclude { chain });
            }
            let depth = doc.depth(owner);
            if depth >= self.max_depth {
                return Err(IncludeError::DepthExceeded {
                    reference,
                    max_depth: self.max_depth,
                });
            }
            if doc.substitutions >= self.max_substitutions {
                return Err(IncludeError::SubstitutionLimit {
                    limit: self.max_substitutions,
                });
            }

            tracing::debug!(reference = %reference, depth = depth + 1, "Expanding include");
            let content = fs::read_to_string(&path)?;
            doc.links.push(Link {
                parent: owner,
                key,
                reference,
                depth: depth + 1,
            });
            let link = doc.links.len() - 1;
            doc.splice(range, &content, link);
            doc.substitutions += 1;
        }
        Ok(doc.text)
    }
}

fn first_directive(text: &str) -> Option<(Range<usize>, String)> {
    let caps = INCLUDE_PATTERN.captures(text)?;
    let whole = caps.get(0)?;
    Some((whole.range(), caps[1].trim().to_string()))
}

/// Whether `text` still holds an include directive.
pub fn contains_directive(text: &str) -> bool {
    INCLUDE_PATTERN.is_match(text)
}

/// Raw references of the directives directly in `text`, in textual order.
pub fn find_directives(text: &str) -> Vec<String> {
    INCLUDE_PATTERN
        .captures_iter(text)
        .map(|caps| caps[1].trim().to_string())
        .collect()
}
