//! Engine error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while linting or formatting a file.
#[derive(Debug, Error)]
pub enum EngineError {
    /// File I/O error.
    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed `.editorconfig` file.
    #[error("{}:{line}: {message}", path.display())]
    EditorConfig {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

impl EngineError {
    /// Creates an I/O error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
