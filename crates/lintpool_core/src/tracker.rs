//! Detection of configuration files changed between batches.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::CoreError;

/// Remembers the content hash of each watched configuration file.
#[derive(Debug, Default)]
pub struct ConfigTracker {
    hashes: BTreeMap<PathBuf, String>,
}

impl ConfigTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the BLAKE3 hash of content.
    pub fn hash_content(content: &[u8]) -> String {
        blake3::hash(content).to_hex().to_string()
    }

    /// Returns the paths added, removed, or modified since the previous scan.
    ///
    /// A path is tracked once it has been passed to `scan` while existing;
    /// a tracked path that is no longer passed in, or no longer exists, is
    /// reported as removed. The result is sorted.
    pub fn scan<I, P>(&mut self, paths: I) -> Result<Vec<PathBuf>, CoreError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut current = BTreeMap::new();
        for path in paths {
            let path = path.as_ref();
            if let Some(hash) = Self::hash_file(path)? {
                current.insert(path.to_path_buf(), hash);
            }
        }

        let mut changed = BTreeSet::new();
        for (path, hash) in &current {
            if self.hashes.get(path) != Some(hash) {
                changed.insert(path.clone());
            }
        }
        for path in self.hashes.keys() {
            if !current.contains_key(path) {
                changed.insert(path.clone());
            }
        }

        self.hashes = current;
        if !changed.is_empty() {
            debug!("{} configuration file(s) changed", changed.len());
        }
        Ok(changed.into_iter().collect())
    }

    /// Returns the number of tracked files.
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    fn hash_file(path: &Path) -> Result<Option<String>, CoreError> {
        match fs::read(path) {
            Ok(content) => Ok(Some(Self::hash_content(&content))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
