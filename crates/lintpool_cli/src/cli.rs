//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// LintPool - Parallel editorconfig-aware text linter
#[derive(Parser)]
#[command(name = "lintpool")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Allow parallel processing (overrides LINTPOOL_PARALLEL and the config file)
    #[arg(long, global = true, conflicts_with = "no_parallel")]
    pub parallel: bool,

    /// Force sequential processing
    #[arg(long, global = true)]
    pub no_parallel: bool,
}

impl Cli {
    /// Returns the parallel preference given on the command line, if any.
    pub fn parallel_flag(&self) -> Option<bool> {
        match (self.parallel, self.no_parallel) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check files for violations
    Check {
        /// Files, directories, or glob patterns to check
        #[arg(required = true)]
        patterns: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Exit successfully even when violations are found
        #[arg(long)]
        ignore_failures: bool,

        /// Re-check whenever files or .editorconfig files change
        #[arg(long)]
        watch: bool,

        /// Polling interval for --watch, in milliseconds
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },

    /// Fix violations in place
    Format {
        /// Files, directories, or glob patterns to format
        #[arg(required = true)]
        patterns: Vec<String>,

        /// Report files that would change without writing them
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
