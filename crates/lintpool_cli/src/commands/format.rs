//! Format command implementation

use std::fs;
use std::path::PathBuf;

use lintpool_engine::EngineError;
use miette::{IntoDiagnostic, Result};

use super::Session;
use crate::cli::Cli;
use crate::output::{output_failures, print_violations};

pub fn run_format(cli: &Cli, patterns: &[String], dry_run: bool) -> Result<bool> {
    let mut session = Session::new(cli)?;
    let (files, _) = session.prepare(patterns)?;

    let results = session
        .dispatcher
        .dispatch(&files, session.parallel, |engine, path: &PathBuf| {
            engine.format_file(path)
        })
        .into_diagnostic()?;

    let mut failures = Vec::new();
    let mut formatted = 0;
    let mut remaining = 0;

    for (path, result) in files.iter().zip(results) {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                failures.push((path.clone(), e));
                continue;
            }
        };

        if outcome.changed {
            if dry_run {
                println!("Would format {}", path.display());
            } else if let Err(e) = fs::write(path, &outcome.content) {
                failures.push((path.clone(), EngineError::io(path, e)));
                continue;
            } else {
                println!("Formatted {}", path.display());
            }
            formatted += 1;
        }

        remaining += outcome.remaining.len();
        print_violations(path, &outcome.remaining);
    }

    output_failures(&failures, "format");

    let action = if dry_run { "Would format" } else { "Formatted" };
    println!();
    println!(
        "{} {} of {} files, {} unfixable issues remain",
        action,
        formatted,
        files.len(),
        remaining
    );

    let unfixed = remaining > 0 && !session.config.ignore_format_failures;
    Ok(unfixed || !failures.is_empty())
}
