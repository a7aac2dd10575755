//! Line rules engine.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lintpool_core::{BoxError, Engine, EngineBuilder, RuleProviderSet};
use serde::Serialize;
use tracing::debug;

use crate::editorconfig::{EditorConfigCache, Properties};
use crate::error::EngineError;
use crate::rules::{Rule, Violation};

/// Lint result for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintReport {
    pub path: PathBuf,
    pub violations: Vec<Violation>,
}

impl LintReport {
    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }
}

/// Format result for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOutcome {
    pub path: PathBuf,
    /// Formatted content.
    pub content: String,
    /// Whether `content` differs from the input.
    pub changed: bool,
    /// Violations left after formatting.
    pub remaining: Vec<Violation>,
}

/// Lints and formats text files against the resolved rule set.
///
/// Holds a private [`EditorConfigCache`], so it must not be shared between
/// threads without exclusive access.
pub struct LineEngine {
    rules: Vec<Rule>,
    editorconfig: EditorConfigCache,
}

impl LineEngine {
    /// Creates an engine running the resolved rules it knows about.
    pub fn new(providers: &RuleProviderSet) -> Self {
        let rules = providers
            .rule_ids()
            .filter_map(|id| {
                let rule = Rule::from_id(id);
                if rule.is_none() {
                    debug!("Rule '{}' is not provided by the line engine, skipping", id);
                }
                rule
            })
            .collect();

        Self {
            rules,
            editorconfig: EditorConfigCache::new(),
        }
    }

    /// Returns the enabled rules, in resolution order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Returns the effective `.editorconfig` properties for `path`.
    pub fn properties_for(&mut self, path: &Path) -> Result<Properties, EngineError> {
        self.editorconfig.properties_for(path)
    }

    /// Lints `content` as the contents of `path`.
    pub fn lint(&mut self, path: &Path, content: &str) -> Result<Vec<Violation>, EngineError> {
        let properties = self.properties_for(path)?;
        Ok(self.check(content, &properties))
    }

    /// Reads and lints the file at `path`.
    pub fn lint_file(&mut self, path: &Path) -> Result<LintReport, EngineError> {
        let content = fs::read_to_string(path).map_err(|e| EngineError::io(path, e))?;
        Ok(LintReport {
            path: path.to_path_buf(),
            violations: self.lint(path, &content)?,
        })
    }

    /// Applies every fixable rule to `content` as the contents of `path`.
    pub fn format(&mut self, path: &Path, content: &str) -> Result<FormatOutcome, EngineError> {
        let properties = self.properties_for(path)?;

        let formatted = self
            .rules
            .iter()
            .filter(|rule| rule.is_fixable() && rule.is_active(&properties))
            .fold(content.to_string(), |text, rule| rule.fix(&text));

        Ok(FormatOutcome {
            path: path.to_path_buf(),
            changed: formatted != content,
            remaining: self.check(&formatted, &properties),
            content: formatted,
        })
    }

    /// Reads and formats the file at `path` without writing it.
    pub fn format_file(&mut self, path: &Path) -> Result<FormatOutcome, EngineError> {
        let content = fs::read_to_string(path).map_err(|e| EngineError::io(path, e))?;
        self.format(path, &content)
    }

    fn check(&self, content: &str, properties: &Properties) -> Vec<Violation> {
        let mut violations = Vec::new();
        for rule in self.rules.iter().filter(|rule| rule.is_active(properties)) {
            rule.check(content, properties, &mut violations);
        }
        violations.sort_by_key(|v| (v.line, v.column));
        violations
    }
}

impl Engine for LineEngine {
    fn reload_config(&mut self, path: &Path) -> Result<(), BoxError> {
        self.editorconfig.reload(path).map_err(Into::into)
    }
}

/// Builds [`LineEngine`]s for the dispatcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineEngineBuilder;

impl EngineBuilder for LineEngineBuilder {
    type Engine = LineEngine;

    fn build(&self, providers: Arc<RuleProviderSet>) -> Result<LineEngine, BoxError> {
        Ok(LineEngine::new(&providers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editorconfig::EDITORCONFIG_FILE;
    use crate::rules::standard_provider;
    use lintpool_core::{ProviderDescriptor, RuleProviderResolver};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn engine() -> LineEngine {
        LineEngine::new(&RuleProviderResolver::resolve(&[standard_provider()]))
    }

    #[test]
    fn test_unknown_rules_are_skipped() {
        let providers = vec![
            ProviderDescriptor::new("plugin", ["plugin:spell-check"]),
            ProviderDescriptor::new("standard", ["standard:no-tabs"]),
        ];
        let engine = LineEngine::new(&RuleProviderResolver::resolve(&providers));
        assert_eq!(engine.rules(), &[Rule::NoTabs]);
    }

    #[test]
    fn test_lint_uses_editorconfig() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(EDITORCONFIG_FILE),
            "root = true\n[*.md]\nmax_line_length = 10\n",
        )
        .unwrap();
        let file = dir.path().join("doc.md");

        let violations = engine().lint(&file, "short\nthis line is long\n").unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule_id, "standard:max-line-length");
        assert_eq!((violations[0].line, violations[0].column), (2, 11));
    }

    #[test]
    fn test_violations_sorted_by_position() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(EDITORCONFIG_FILE), "root = true\n").unwrap();
        let file = dir.path().join("a.txt");

        let violations = engine().lint(&file, "b  \na").unwrap();
        let positions: Vec<_> = violations.iter().map(|v| (v.line, v.column)).collect();
        assert_eq!(positions, vec![(1, 2), (2, 2)]);
    }

    #[test]
    fn test_format_fixes_and_reports_remaining() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(EDITORCONFIG_FILE),
            "root = true\n[*]\nindent_style = space\n",
        )
        .unwrap();
        let file = dir.path().join("a.txt");

        let outcome = engine().format(&file, "\tkeep  \nend").unwrap();
        assert!(outcome.changed);
        assert_eq!(outcome.content, "\tkeep\nend\n");
        assert_eq!(outcome.remaining.len(), 1);
        assert_eq!(outcome.remaining[0].rule_id, "standard:no-tabs");
    }

    #[test]
    fn test_format_respects_disabled_rules() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(EDITORCONFIG_FILE),
            "root = true\n[*]\ntrim_trailing_whitespace = false\ninsert_final_newline = false\n",
        )
        .unwrap();
        let file = dir.path().join("a.txt");

        let outcome = engine().format(&file, "x  ").unwrap();
        assert!(!outcome.changed);
        assert!(outcome.remaining.is_empty());
    }

    #[test]
    fn test_format_keeps_crlf_line_endings() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(EDITORCONFIG_FILE), "root = true\n").unwrap();
        let file = dir.path().join("a.txt");

        let mut engine = engine();
        assert!(engine.lint(&file, "a\r\nb\r\n").unwrap().is_empty());

        let clean = engine.format(&file, "a\r\nb\r\n").unwrap();
        assert!(!clean.changed);
        assert_eq!(clean.content, "a\r\nb\r\n");

        let dirty = engine.format(&file, "a  \r\nb\r\n").unwrap();
        assert!(dirty.changed);
        assert_eq!(dirty.content, "a\r\nb\r\n");
    }

    #[test]
    fn test_reload_config_picks_up_changes() {
        let dir = tempdir().unwrap();
        let editorconfig = dir.path().join(EDITORCONFIG_FILE);
        fs::write(&editorconfig, "root = true\n[*]\nmax_line_length = 3\n").unwrap();
        let file = dir.path().join("a.txt");

        let mut engine = engine();
        assert_eq!(engine.lint(&file, "abcd\n").unwrap().len(), 1);

        fs::write(&editorconfig, "root = true\n[*]\nmax_line_length = 10\n").unwrap();
        assert_eq!(engine.lint(&file, "abcd\n").unwrap().len(), 1);

        engine.reload_config(&editorconfig).unwrap();
        assert!(engine.lint(&file, "abcd\n").unwrap().is_empty());
    }

    #[test]
    fn test_lint_file_missing_is_io_error() {
        let dir = tempdir().unwrap();
        let err = engine().lint_file(&dir.path().join("missing.md")).unwrap_err();
        assert!(matches!(err, EngineError::Io { .. }));
    }
}
