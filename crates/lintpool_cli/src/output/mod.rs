//! Output formatting module

mod json;
mod text;

use std::path::PathBuf;

use lintpool_engine::{EngineError, LintReport};
use miette::Result;

use crate::cli::OutputFormat;

pub use text::print_violations;

/// Prints lint reports and returns whether any violation was found.
pub fn output_reports(reports: &[LintReport], format: OutputFormat) -> Result<bool> {
    let has_violations = reports.iter().any(LintReport::has_violations);

    match format {
        OutputFormat::Json => json::output_json(reports)?,
        OutputFormat::Text => text::output_text(reports),
    }

    Ok(has_violations)
}

/// Prints files that could not be processed to stderr.
pub fn output_failures(failures: &[(PathBuf, EngineError)], action: &str) {
    if failures.is_empty() {
        return;
    }

    eprintln!("\n{} file(s) failed to {}:", failures.len(), action);
    for (path, error) in failures {
        eprintln!("  {}: {}", path.display(), error);
    }
}
