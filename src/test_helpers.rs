//! Shared test utilities for the ora-site test suite.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let report = Builder::new(&config, ProjectRoot::new(tmp.path())).run().unwrap();
//!
//! let about = find_built(&report, "about");
//! assert_eq!(about.output, PathBuf::from("dist/about/index.html"));
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::pipeline::{BuildReport, BuiltPage};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
///
/// Tests get an isolated project they can mutate without affecting other
/// tests or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Write `content` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Every file under `dir`, keyed by its `/`-separated relative path.
pub fn tree_snapshot(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    WalkDir::new(dir)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(dir).unwrap();
            let key = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            (key, fs::read(e.path()).unwrap())
        })
        .collect()
}

// =========================================================================
// Report lookups (panic with the available names on miss)
// =========================================================================

/// Find a built page by base name. Panics if not found.
pub fn find_built<'a>(report: &'a BuildReport, base_name: &str) -> &'a BuiltPage {
    report
        .pages
        .iter()
        .find(|p| p.base_name == base_name)
        .unwrap_or_else(|| {
            let names: Vec<&str> = report.pages.iter().map(|p| p.base_name.as_str()).collect();
            panic!("page '{base_name}' not built. Available: {names:?}")
        })
}

/// Output paths of all built pages, in build order.
pub fn page_outputs(report: &BuildReport) -> Vec<String> {
    report
        .pages
        .iter()
        .map(|p| p.output.to_string_lossy().replace('\\', "/"))
        .collect()
}
