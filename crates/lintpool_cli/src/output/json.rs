//! JSON output formatter

use lintpool_engine::LintReport;
use miette::{IntoDiagnostic, Result};

pub fn output_json(reports: &[LintReport]) -> Result<()> {
    let output: Vec<_> = reports
        .iter()
        .map(|r| {
            serde_json::json!({
                "path": r.path.display().to_string(),
                "violations": r.violations,
            })
        })
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&output).into_diagnostic()?
    );
    Ok(())
}
