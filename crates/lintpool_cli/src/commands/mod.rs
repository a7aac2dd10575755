//! Subcommand implementations

mod check;
mod format;

pub use check::run_check;
pub use format::run_format;

use std::collections::BTreeSet;
use std::path::PathBuf;

use lintpool_core::{AdaptiveDispatcher, ConfigTracker, DispatchConfig};
use lintpool_engine::{LineEngineBuilder, editorconfig, standard_provider};
use miette::{IntoDiagnostic, Result};
use tracing::{debug, info, warn};

use crate::cli::Cli;
use crate::discovery::FileDiscovery;

/// State shared by the runs of one command.
pub struct Session {
    pub config: DispatchConfig,
    pub dispatcher: AdaptiveDispatcher<LineEngineBuilder>,
    pub parallel: bool,
    discovery: FileDiscovery,
    editorconfigs: ConfigTracker,
    scanned: bool,
}

impl Session {
    pub fn new(cli: &Cli) -> Result<Self> {
        let config = load_config(cli)?;
        let parallel = config.resolve_parallel(cli.parallel_flag());
        debug!(
            "Pool size {}, parallel threshold {}, parallel {}",
            config.pool_size, config.parallel_threshold, parallel
        );

        let mut engine_config = config.clone();
        engine_config.providers.insert(0, standard_provider());
        let dispatcher =
            AdaptiveDispatcher::new(LineEngineBuilder, &engine_config).into_diagnostic()?;
        let discovery = FileDiscovery::new(&config.include, &config.exclude)?;

        Ok(Self {
            config,
            dispatcher,
            parallel,
            discovery,
            editorconfigs: ConfigTracker::new(),
            scanned: false,
        })
    }

    /// Discovers the target files and brings the engines up to date with
    /// every `.editorconfig` that applies to them.
    ///
    /// The first call only records the files; engines built in this session
    /// already read them fresh. Returns the files and whether any engine was
    /// reloaded.
    pub fn prepare(&mut self, patterns: &[String]) -> Result<(Vec<PathBuf>, bool)> {
        let files = self.discovery.discover(patterns)?;

        let changed = self
            .editorconfigs
            .scan(editorconfig_candidates(&files))
            .into_diagnostic()?;

        let reload = self.scanned && !changed.is_empty();
        if reload {
            info!("{} .editorconfig file(s) changed", changed.len());
            // Engines that failed to reload were rebuilt or retired; the
            // broken file then surfaces as a per-file error.
            if let Err(e) = self.dispatcher.apply_changes(&changed) {
                warn!("{}", e);
            }
        }

        self.scanned = true;
        Ok((files, reload))
    }
}

fn editorconfig_candidates(files: &[PathBuf]) -> BTreeSet<PathBuf> {
    files
        .iter()
        .flat_map(|file| editorconfig::candidates(file))
        .collect()
}

fn load_config(cli: &Cli) -> Result<DispatchConfig> {
    if let Some(ref path) = cli.config {
        return DispatchConfig::from_file(path).into_diagnostic();
    }

    let cwd = std::env::current_dir().into_diagnostic()?;
    match DispatchConfig::find_config_file(&cwd) {
        Some(path) => {
            info!("Using config: {}", path.display());
            DispatchConfig::from_file(&path).into_diagnostic()
        }
        None => {
            debug!("No config file found, using defaults");
            Ok(DispatchConfig::default())
        }
    }
}
