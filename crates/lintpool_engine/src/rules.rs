//! Builtin line rules.

use lintpool_core::{ProviderDescriptor, STANDARD_PROVIDER_ID};
use serde::Serialize;

use crate::editorconfig::{IndentStyle, Properties};

/// A rule violation at a 1-based line and column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub line: usize,
    pub column: usize,
    pub rule_id: String,
    pub message: String,
}

/// Rules implemented by the line engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    MaxLineLength,
    NoTrailingWhitespace,
    FinalNewline,
    NoTabs,
}

impl Rule {
    pub const ALL: [Rule; 4] = [
        Rule::MaxLineLength,
        Rule::NoTrailingWhitespace,
        Rule::FinalNewline,
        Rule::NoTabs,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Rule::MaxLineLength => "standard:max-line-length",
            Rule::NoTrailingWhitespace => "standard:no-trailing-whitespace",
            Rule::FinalNewline => "standard:final-newline",
            Rule::NoTabs => "standard:no-tabs",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|rule| rule.id() == id)
    }

    /// Returns `true` if `format` can fix violations of this rule.
    pub fn is_fixable(self) -> bool {
        matches!(self, Rule::NoTrailingWhitespace | Rule::FinalNewline)
    }

    /// Returns `true` if the rule applies under `properties`.
    pub fn is_active(self, properties: &Properties) -> bool {
        match self {
            Rule::MaxLineLength => properties.max_line_length.is_some(),
            Rule::NoTrailingWhitespace => properties.trim_trailing_whitespace != Some(false),
            Rule::FinalNewline => properties.insert_final_newline != Some(false),
            Rule::NoTabs => properties.indent_style == Some(IndentStyle::Space),
        }
    }

    /// Checks `content` and appends violations.
    pub fn check(self, content: &str, properties: &Properties, out: &mut Vec<Violation>) {
        let violation = |line: usize, column: usize, message: String| Violation {
            line,
            column,
            rule_id: self.id().to_string(),
            message,
        };

        match self {
            Rule::MaxLineLength => {
                let Some(max) = properties.max_line_length else {
                    return;
                };
                for (index, line) in content.lines().enumerate() {
                    let len = line.chars().count();
                    if len > max {
                        out.push(violation(
                            index + 1,
                            max + 1,
                            format!("Exceeded max line length ({} > {})", len, max),
                        ));
                    }
                }
            }
            Rule::NoTrailingWhitespace => {
                for (index, line) in content.lines().enumerate() {
                    let trimmed = line.trim_end_matches([' ', '\t']);
                    if trimmed.len() != line.len() {
                        out.push(violation(
                            index + 1,
                            trimmed.chars().count() + 1,
                            "Trailing whitespace".to_string(),
                        ));
                    }
                }
            }
            Rule::FinalNewline => {
                if !content.is_empty() && !content.ends_with('\n') {
                    let line = content.lines().count();
                    let column = content.lines().last().map_or(0, |l| l.chars().count()) + 1;
                    out.push(violation(line, column, "File must end with a newline".to_string()));
                }
            }
            Rule::NoTabs => {
                for (index, line) in content.lines().enumerate() {
                    let indent = line.len() - line.trim_start_matches([' ', '\t']).len();
                    if let Some(offset) = line[..indent].find('\t') {
                        out.push(violation(
                            index + 1,
                            offset + 1,
                            "Tab used for indentation".to_string(),
                        ));
                    }
                }
            }
        }
    }

    /// Rewrites `content` so this rule passes. Unfixable rules return it unchanged.
    pub fn fix(self, content: &str) -> String {
        match self {
            Rule::NoTrailingWhitespace => content
                .split_inclusive('\n')
                .map(|line| {
                    let (text, ending) = split_line_ending(line);
                    format!("{}{}", text.trim_end_matches([' ', '\t']), ending)
                })
                .collect(),
            Rule::FinalNewline if !content.is_empty() && !content.ends_with('\n') => {
                format!("{}\n", content)
            }
            _ => content.to_string(),
        }
    }
}

/// Splits `line` into its text and its `\r\n` or `\n` terminator.
fn split_line_ending(line: &str) -> (&str, &str) {
    let text = line
        .strip_suffix("\r\n")
        .or_else(|| line.strip_suffix('\n'))
        .unwrap_or(line);
    (text, &line[text.len()..])
}

/// Descriptor of the builtin rule set.
pub fn standard_provider() -> ProviderDescriptor {
    ProviderDescriptor::new(STANDARD_PROVIDER_ID, Rule::ALL.map(Rule::id))
}
