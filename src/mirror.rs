//! Verbatim copying of static items into the output tree.
//!
//! Static items are top-level names under the project root (`assets/`,
//! `favicon.ico`, `CNAME`, ...). Each one that exists is copied to the same
//! relative location under the output root; directories are copied
//! recursively, files byte for byte. Items that do not exist are skipped.

use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// A static item that was copied into the output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirroredItem {
    /// Top-level name as configured.
    pub name: String,
    pub is_dir: bool,
    /// Number of files written for this item.
    pub files: usize,
}

/// Copy every existing item in `items` from `root` into `output_root`.
///
/// Items are processed in the given order. Missing items produce no entry.
pub fn mirror_static(
    root: &Path,
    output_root: &Path,
    items: &[String],
) -> io::Result<Vec<MirroredItem>> {
    let mut mirrored = Vec::new();
    for item in items {
        let src = root.join(item);
        if !src.exists() {
            tracing::debug!(item = %item, "Static item not present, skipping");
            continue;
        }
        let files = copy_recursive(&src, &output_root.join(item))?;
        tracing::debug!(item = %item, files, "Mirrored static item");
        mirrored.push(MirroredItem {
            name: item.clone(),
            is_dir: src.is_dir(),
            files,
        });
    }
    Ok(mirrored)
}

/// Copy a file or directory tree from `src` to `dest`.
///
/// Creates destination directories as needed and returns the number of
/// files copied. Entries are visited in file-name order. Symlinks are
/// followed, so a linked directory is copied as a real one; a link loop is
/// an error.
pub fn copy_recursive(src: &Path, dest: &Path) -> io::Result<usize> {
    if !src.is_dir() {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(src, dest)?;
        return Ok(1);
    }

    let mut files = 0;
    for entry in WalkDir::new(src).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(io::Error::other)?;
        let target = dest.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            files += 1;
        }
    }
    Ok(files)
}
