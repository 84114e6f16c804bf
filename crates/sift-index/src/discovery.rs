//! Directory scanning for batch indexing.
//!
//! Walks a directory and yields the absolute paths of candidate files in a
//! deterministic order, honoring exclusion globs relative to the scan root.
//! A pattern matches either the relative path or any single path component,
//! so a bare name like `node_modules` prunes that directory anywhere in the
//! tree.

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::IndexError;

/// Options for a directory scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Exclusion glob patterns, relative to the scan root.
    pub exclude: Vec<String>,
    /// Whether to descend into subdirectories.
    pub recursive: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            exclude: vec!["node_modules".to_string(), ".git".to_string()],
            recursive: true,
        }
    }
}

/// Compiled exclusion patterns.
struct ExcludeSet {
    globs: GlobSet,
}

impl ExcludeSet {
    fn compile(patterns: &[String]) -> Result<Self, IndexError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|source| IndexError::Pattern {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        let globs = builder.build().map_err(|source| IndexError::Pattern {
            pattern: patterns.join(","),
            source,
        })?;
        Ok(Self { globs })
    }

    /// True if the relative path, or any of its components, matches.
    fn matches(&self, rel: &Path) -> bool {
        if self.globs.is_match(rel) {
            return true;
        }
        rel.components()
            .any(|c| self.globs.is_match(Path::new(c.as_os_str())))
    }
}

/// Scans `root` for files with one of the supported extensions.
///
/// Returns absolute paths sorted lexicographically, which fixes the
/// processing order of a batch add.
pub fn scan(
    root: &Path,
    options: &ScanOptions,
    extensions: &[&str],
) -> Result<Vec<PathBuf>, IndexError> {
    let excludes = ExcludeSet::compile(&options.exclude)?;

    let mut walker = WalkDir::new(root).follow_links(false);
    if !options.recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let abs_path = entry.path();
        let rel_path = match abs_path.strip_prefix(root) {
            Ok(p) => p,
            Err(_) => continue,
        };
        if excludes.matches(rel_path) {
            continue;
        }

        let supported = abs_path
            .extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| {
                let ext = ext.to_lowercase();
                extensions.iter().any(|e| *e == ext)
            });
        if !supported {
            continue;
        }

        files.push(abs_path.to_path_buf());
    }

    files.sort();
    Ok(files)
}
