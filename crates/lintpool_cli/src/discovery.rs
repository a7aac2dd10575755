//! Target file discovery

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use miette::{IntoDiagnostic, Result, miette};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

/// Expands command line patterns into target files.
pub struct FileDiscovery {
    include_globs: Option<GlobSet>,
    exclude_globs: Option<GlobSet>,
}

impl FileDiscovery {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        Ok(Self {
            include_globs: build_globset(include)?,
            exclude_globs: build_globset(exclude)?,
        })
    }

    /// Resolves `patterns` into a sorted, deduplicated list of files.
    ///
    /// Paths are relative to the current directory without a leading `./`,
    /// so a file named directly and matched by a glob appears once.
    /// A pattern naming an existing file is taken as is, a directory is
    /// walked (skipping hidden entries), and anything else is matched as a
    /// glob against the files under the current directory.
    pub fn discover(&self, patterns: &[String]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for pattern in patterns {
            let path = Path::new(pattern);
            if path.is_file() {
                files.push(strip_dot(path).to_path_buf());
            } else if path.is_dir() {
                files.extend(
                    walk(path)
                        .filter(|p| self.is_selected(p))
                        .map(|p| strip_dot(&p).to_path_buf()),
                );
            } else {
                let matcher = Glob::new(pattern)
                    .map_err(|e| miette!("Invalid pattern '{}': {}", pattern, e))?
                    .compile_matcher();
                files.extend(
                    walk(Path::new("."))
                        .filter(|p| matcher.is_match(p) || matcher.is_match(strip_dot(p)))
                        .filter(|p| self.is_selected(p))
                        .map(|p| strip_dot(&p).to_path_buf()),
                );
            }
        }

        files.sort();
        files.dedup();

        info!("Discovered {} files", files.len());
        Ok(files)
    }

    fn is_selected(&self, path: &Path) -> bool {
        let relative = strip_dot(path);
        if let Some(ref excludes) = self.exclude_globs
            && (excludes.is_match(path) || excludes.is_match(relative))
        {
            debug!("Excluded {}", path.display());
            return false;
        }

        if let Some(ref includes) = self.include_globs
            && !(includes.is_match(path) || includes.is_match(relative))
        {
            return false;
        }

        true
    }
}

fn walk(root: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(DirEntry::into_path)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

fn strip_dot(path: &Path) -> &Path {
    path.strip_prefix(".").unwrap_or(path)
}

fn build_globset(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).into_diagnostic()?);
    }

    Ok(Some(builder.build().into_diagnostic()?))
}
