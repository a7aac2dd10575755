//! Text output formatter

use std::path::Path;

use lintpool_engine::{LintReport, Violation};

pub fn output_text(reports: &[LintReport]) {
    for report in reports {
        print_violations(&report.path, &report.violations);
    }

    let total_issues: usize = reports.iter().map(|r| r.violations.len()).sum();

    println!();
    println!(
        "Checked {} files, found {} issues",
        reports.len(),
        total_issues
    );
}

/// Prints the violations of one file, if any.
pub fn print_violations(path: &Path, violations: &[Violation]) {
    if violations.is_empty() {
        return;
    }

    println!("\n{}:", path.display());
    for violation in violations {
        println!(
            "  {}:{} [{}]: {}",
            violation.line, violation.column, violation.rule_id, violation.message
        );
    }
}
