//! Project-relative path resolution.
//!
//! Every component receives the project root explicitly through a
//! [`ProjectRoot`] instead of reading the process working directory.

use std::path::{Component, Path, PathBuf};

/// The directory all project-relative references are resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRoot {
    root: PathBuf,
}

impl ProjectRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Join a project-relative reference onto the root.
    ///
    /// The reference is whitespace-trimmed. No traversal checks are made:
    /// `..` components and absolute references follow [`Path::join`].
    pub fn resolve(&self, reference: &str) -> PathBuf {
        self.root.join(reference.trim())
    }

    /// Whether the resolved reference currently exists on disk.
    pub fn exists(&self, reference: &str) -> bool {
        self.resolve(reference).exists()
    }

    /// Strip the root prefix from `path` for display.
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}

/// Lexically normalise a project-relative reference.
///
/// `.` components are dropped and `..` pops the previous component. Returns
/// `None` when the reference is absolute or climbs above the root; the root
/// itself normalises to an empty path. Symlinks are not consulted.
pub fn normalize(reference: &str) -> Option<PathBuf> {
    let mut normalized = PathBuf::new();
    for component in Path::new(reference.trim()).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return None;
                }
            }
            Component::Normal(name) => normalized.push(name),
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn resolve_joins_and_trims() {
        let root = ProjectRoot::new("/site");
        assert_eq!(
            root.resolve("  templates/partials/nav.html \n"),
            PathBuf::from("/site/templates/partials/nav.html")
        );
    }

    #[test]
    fn exists_reflects_disk() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("robots.txt"), "User-agent: *").unwrap();
        let root = ProjectRoot::new(tmp.path());

        assert!(root.exists("robots.txt"));
        assert!(!root.exists("CNAME"));
    }

    #[test]
    fn relative_strips_root() {
        let root = ProjectRoot::new("/site");
        assert_eq!(
            root.relative(Path::new("/site/dist/index.html")),
            Path::new("dist/index.html")
        );
        assert_eq!(
            root.relative(Path::new("/elsewhere/x")),
            Path::new("/elsewhere/x")
        );
    }

    #[test]
    fn normalize_folds_dot_components() {
        assert_eq!(normalize("dist"), Some(PathBuf::from("dist")));
        assert_eq!(normalize(" ./build/./site/ "), Some(PathBuf::from("build/site")));
        assert_eq!(normalize("a/b/../c"), Some(PathBuf::from("a/c")));
        assert_eq!(normalize("./"), Some(PathBuf::new()));
        assert_eq!(normalize("foo/.."), Some(PathBuf::new()));
    }

    #[test]
    fn normalize_rejects_paths_leaving_the_root() {
        assert_eq!(normalize(".."), None);
        assert_eq!(normalize("../"), None);
        assert_eq!(normalize("a/../../b"), None);
        assert_eq!(normalize("/"), None);
        assert_eq!(normalize("/tmp/out"), None);
    }
}
