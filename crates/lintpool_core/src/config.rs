//! Dispatcher configuration.

use std::fs;
use std::path::{Path, PathBuf};

use jsonc_parser::ParseOptions;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::provider::ProviderDescriptor;

/// Environment variable overriding the configured parallel preference.
pub const PARALLEL_ENV_VAR: &str = "LINTPOOL_PARALLEL";

/// Batches smaller than this run sequentially on a single engine.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 25;

const MAX_DEFAULT_POOL_SIZE: usize = 4;

/// Configuration for the dispatcher and the tools built on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Number of engines in the parallel pool.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Minimum batch size for parallel dispatch.
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,

    /// Whether parallel dispatch is allowed.
    #[serde(default)]
    pub parallel: bool,

    /// Additional rule providers, resolved after the standard one.
    #[serde(default)]
    pub providers: Vec<ProviderDescriptor>,

    /// Whether lint violations still exit successfully.
    #[serde(default)]
    pub ignore_lint_failures: bool,

    /// Whether violations left after formatting still exit successfully.
    #[serde(default = "default_ignore_format_failures")]
    pub ignore_format_failures: bool,

    /// File patterns to include.
    #[serde(default)]
    pub include: Vec<String>,

    /// File patterns to exclude.
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_pool_size() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(MAX_DEFAULT_POOL_SIZE)
}

fn default_parallel_threshold() -> usize {
    DEFAULT_PARALLEL_THRESHOLD
}

fn default_ignore_format_failures() -> bool {
    true
}

impl DispatchConfig {
    /// Configuration file names, in lookup order.
    pub const CONFIG_FILES: &'static [&'static str] = &[".lintpool.jsonc", ".lintpool.json"];

    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self {
            pool_size: default_pool_size(),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            parallel: false,
            providers: Vec::new(),
            ignore_lint_failures: false,
            ignore_format_failures: default_ignore_format_failures(),
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }

    /// Loads configuration from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| CoreError::config(format!("Failed to read config: {}", e)))?;

        Self::from_json(&content)
    }

    /// Parses configuration from a JSON string. Comments and trailing commas are allowed.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let value = jsonc_parser::parse_to_serde_value(json, &ParseOptions::default())
            .map_err(|e| CoreError::config(format!("Invalid JSON: {}", e)))?
            .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));

        let config: Self = serde_json::from_value(value)
            .map_err(|e| CoreError::config(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.pool_size == 0 {
            return Err(CoreError::config("pool_size must be at least 1"));
        }
        if self.parallel_threshold == 0 {
            return Err(CoreError::config("parallel_threshold must be at least 1"));
        }
        if let Some(provider) = self.providers.iter().find(|p| p.id.trim().is_empty()) {
            return Err(CoreError::config(format!(
                "provider id must not be empty (rules: {:?})",
                provider.rules
            )));
        }
        Ok(())
    }

    /// Finds the nearest configuration file in `start` or its ancestors.
    pub fn find_config_file(start: &Path) -> Option<PathBuf> {
        start.ancestors().find_map(|dir| {
            Self::CONFIG_FILES
                .iter()
                .map(|name| dir.join(name))
                .find(|candidate| candidate.is_file())
        })
    }

    /// Resolves whether parallel dispatch is allowed.
    ///
    /// Precedence: explicit `flag`, then [`PARALLEL_ENV_VAR`], then the
    /// configured value.
    pub fn resolve_parallel(&self, flag: Option<bool>) -> bool {
        let env = std::env::var(PARALLEL_ENV_VAR).ok();
        self.resolve_parallel_with(flag, env.as_deref())
    }

    /// Same as [`resolve_parallel`](Self::resolve_parallel) with an explicit environment value.
    pub fn resolve_parallel_with(&self, flag: Option<bool>, env: Option<&str>) -> bool {
        flag.or_else(|| env.and_then(parse_bool))
            .unwrap_or(self.parallel)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
