//! Check command implementation

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use lintpool_core::ConfigTracker;
use lintpool_engine::{EngineError, LintReport};
use miette::{IntoDiagnostic, Result};
use tracing::info;

use super::Session;
use crate::cli::{Cli, OutputFormat};
use crate::output::{output_failures, output_reports};

pub fn run_check(
    cli: &Cli,
    patterns: &[String],
    format: OutputFormat,
    ignore_failures: bool,
    watch: bool,
    interval_ms: u64,
) -> Result<bool> {
    let mut session = Session::new(cli)?;
    let ignore_failures = ignore_failures || session.config.ignore_lint_failures;

    let (files, _) = session.prepare(patterns)?;
    let failed = check_files(&session, &files, format)?;

    if !watch {
        return Ok(failed && !ignore_failures);
    }

    let mut sources = ConfigTracker::new();
    sources.scan(&files).into_diagnostic()?;
    info!("Watching for changes every {}ms", interval_ms);

    loop {
        thread::sleep(Duration::from_millis(interval_ms));

        let (files, editorconfig_changed) = session.prepare(patterns)?;
        let sources_changed = !sources.scan(&files).into_diagnostic()?.is_empty();
        if editorconfig_changed || sources_changed {
            check_files(&session, &files, format)?;
        }
    }
}

/// Lints `files` and prints the outcome. Returns whether anything failed.
fn check_files(session: &Session, files: &[PathBuf], format: OutputFormat) -> Result<bool> {
    let results = session
        .dispatcher
        .dispatch(files, session.parallel, |engine, path: &PathBuf| {
            engine.lint_file(path)
        })
        .into_diagnostic()?;

    let (reports, failures) = partition(files, results);
    output_failures(&failures, "check");
    let has_violations = output_reports(&reports, format)?;

    Ok(has_violations || !failures.is_empty())
}

fn partition(
    files: &[PathBuf],
    results: Vec<Result<LintReport, EngineError>>,
) -> (Vec<LintReport>, Vec<(PathBuf, EngineError)>) {
    let mut reports = Vec::new();
    let mut failures = Vec::new();
    for (path, result) in files.iter().zip(results) {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => failures.push((path.clone(), e)),
        }
    }
    (reports, failures)
}
