//! Core error types.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed error returned by engines and engine builders.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while building, pooling, or invalidating engines.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An engine could not be constructed.
    #[error("Engine construction failed: {0}")]
    EngineConstruction(#[source] BoxError),

    /// Every engine of the pool has been lost and none can be borrowed.
    #[error("Engine pool exhausted: no engines left to borrow")]
    PoolExhausted,

    /// Reloading a configuration file failed on at least one engine.
    #[error("Failed to reload '{}' in {failed} engine(s): {source}", path.display())]
    Reload {
        path: PathBuf,
        failed: usize,
        #[source]
        source: BoxError,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_error_message() {
        let err = CoreError::Reload {
            path: PathBuf::from("/tmp/.editorconfig"),
            failed: 2,
            source: "bad section".into(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to reload '/tmp/.editorconfig' in 2 engine(s): bad section"
        );
    }
}
