//! `.editorconfig` parsing and caching.
//!
//! Each engine keeps its own [`EditorConfigCache`]. Parsed files stay cached
//! until [`EditorConfigCache::reload`] is called for their path, so editing
//! a `.editorconfig` has no effect on an engine until it is reloaded.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use globset::{GlobBuilder, GlobMatcher};
use tracing::debug;

use crate::error::EngineError;

/// File name looked up in every ancestor directory.
pub const EDITORCONFIG_FILE: &str = ".editorconfig";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentStyle {
    Space,
    Tab,
}

/// Effective properties for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    pub max_line_length: Option<usize>,
    pub trim_trailing_whitespace: Option<bool>,
    pub insert_final_newline: Option<bool>,
    pub indent_style: Option<IndentStyle>,
}

impl Properties {
    /// Applies one `key = value` pair. Unknown keys and values are ignored.
    fn apply(&mut self, key: &str, value: &str) {
        match key {
            "max_line_length" => {
                self.max_line_length = match value {
                    "off" | "unset" => None,
                    n => n.parse().ok().or(self.max_line_length),
                }
            }
            "trim_trailing_whitespace" => {
                self.trim_trailing_whitespace = parse_flag(value, self.trim_trailing_whitespace)
            }
            "insert_final_newline" => {
                self.insert_final_newline = parse_flag(value, self.insert_final_newline)
            }
            "indent_style" => {
                self.indent_style = match value {
                    "space" => Some(IndentStyle::Space),
                    "tab" => Some(IndentStyle::Tab),
                    "unset" => None,
                    _ => self.indent_style,
                }
            }
            _ => {}
        }
    }
}

fn parse_flag(value: &str, current: Option<bool>) -> Option<bool> {
    match value {
        "true" => Some(true),
        "false" => Some(false),
        "unset" => None,
        _ => current,
    }
}

#[derive(Debug)]
struct Section {
    matcher: GlobMatcher,
    pairs: Vec<(String, String)>,
}

/// A parsed `.editorconfig` file.
#[derive(Debug)]
pub struct EditorConfigFile {
    dir: PathBuf,
    root: bool,
    sections: Vec<Section>,
}

impl EditorConfigFile {
    /// Parses the contents of the `.editorconfig` at `path`.
    pub fn parse(path: &Path, content: &str) -> Result<Self, EngineError> {
        let error = |line: usize, message: String| EngineError::EditorConfig {
            path: path.to_path_buf(),
            line,
            message,
        };

        let mut root = false;
        let mut sections: Vec<Section> = Vec::new();

        for (index, raw) in content.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(header) = line.strip_prefix('[') {
                // `]` closes the header when only a comment may follow it.
                let pattern = header
                    .match_indices(']')
                    .find_map(|(end, _)| {
                        let rest = header[end + 1..].trim_start();
                        (rest.is_empty() || rest.starts_with(['#', ';'])).then(|| &header[..end])
                    })
                    .ok_or_else(|| error(line_no, "unterminated section header".to_string()))?;
                let matcher = compile_section(pattern)
                    .map_err(|e| error(line_no, format!("invalid section '{}': {}", pattern, e)))?;
                sections.push(Section {
                    matcher,
                    pairs: Vec::new(),
                });
                continue;
            }

            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| error(line_no, format!("expected `key = value`, found '{}'", line)))?;
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim().to_ascii_lowercase();

            match sections.last_mut() {
                Some(section) => section.pairs.push((key, value)),
                None if key == "root" => root = value == "true",
                // Preamble keys other than `root` have no effect.
                None => {}
            }
        }

        Ok(Self {
            dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            root,
            sections,
        })
    }

    /// Returns `true` if lookup stops at this file.
    pub fn is_root(&self) -> bool {
        self.root
    }

    /// Applies every section matching `file` to `properties`, in file order.
    fn apply_to(&self, file: &Path, properties: &mut Properties) {
        let Ok(relative) = file.strip_prefix(&self.dir) else {
            return;
        };
        for section in &self.sections {
            if section.matcher.is_match(relative) {
                for (key, value) in &section.pairs {
                    properties.apply(key, value);
                }
            }
        }
    }
}

/// Compiles a section header into a matcher relative to the file's directory.
///
/// Patterns without a `/` match a file name at any depth.
fn compile_section(pattern: &str) -> Result<GlobMatcher, globset::Error> {
    let glob = match pattern.strip_prefix('/') {
        Some(anchored) => anchored.to_string(),
        None if pattern.contains('/') => pattern.to_string(),
        None => format!("**/{}", pattern),
    };
    Ok(GlobBuilder::new(&glob)
        .literal_separator(true)
        .build()?
        .compile_matcher())
}

/// Returns `path` as an absolute path without touching the file system.
pub fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Returns the `.editorconfig` paths that may apply to `file`, innermost first.
pub fn candidates(file: &Path) -> Vec<PathBuf> {
    let file = absolute(file);
    file.ancestors()
        .skip(1)
        .map(|dir| dir.join(EDITORCONFIG_FILE))
        .collect()
}

/// Parsed `.editorconfig` files keyed by absolute path.
///
/// Missing files are cached as absent too.
#[derive(Debug, Default)]
pub struct EditorConfigCache {
    files: HashMap<PathBuf, Option<Arc<EditorConfigFile>>>,
}

impl EditorConfigCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the effective properties for `file`.
    pub fn properties_for(&mut self, file: &Path) -> Result<Properties, EngineError> {
        let file = absolute(file);

        let mut chain = Vec::new();
        for candidate in candidates(&file) {
            if let Some(config) = self.load(&candidate)? {
                let root = config.is_root();
                chain.push(config);
                if root {
                    break;
                }
            }
        }

        let mut properties = Properties::default();
        for config in chain.iter().rev() {
            config.apply_to(&file, &mut properties);
        }
        Ok(properties)
    }

    /// Discards the cached copy of `path` and reads it again.
    pub fn reload(&mut self, path: &Path) -> Result<(), EngineError> {
        let path = absolute(path);
        self.files.remove(&path);
        self.load(&path).map(|_| ())
    }

    /// Returns the number of cached paths, including absent ones.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn load(&mut self, path: &Path) -> Result<Option<Arc<EditorConfigFile>>, EngineError> {
        if let Some(cached) = self.files.get(path) {
            return Ok(cached.clone());
        }

        let parsed = match fs::read_to_string(path) {
            Ok(content) => {
                debug!("Parsing {}", path.display());
                Some(Arc::new(EditorConfigFile::parse(path, &content)?))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(EngineError::io(path, e)),
        };

        self.files.insert(path.to_path_buf(), parsed.clone());
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::tempdir;

    fn parse(content: &str) -> EditorConfigFile {
        EditorConfigFile::parse(Path::new("/project/.editorconfig"), content).unwrap()
    }

    fn props(config: &EditorConfigFile, file: &str) -> Properties {
        let mut properties = Properties::default();
        config.apply_to(Path::new(file), &mut properties);
        properties
    }

    #[test]
    fn test_parse_root_and_sections() {
        let config = parse(
            "# comment\nroot = true\n\n[*]\nmax_line_length = 100\n\n[*.md]\nmax_line_length = off\ntrim_trailing_whitespace = false\n",
        );
        assert!(config.is_root());

        assert_eq!(props(&config, "/project/src/main.rs").max_line_length, Some(100));

        let md = props(&config, "/project/docs/readme.md");
        assert_eq!(md.max_line_length, None);
        assert_eq!(md.trim_trailing_whitespace, Some(false));
    }

    #[rstest]
    #[case::brace_alternation("[*.{md,txt}]", "/project/a/notes.txt", true)]
    #[case::brace_no_match("[*.{md,txt}]", "/project/a/main.rs", false)]
    #[case::anchored("[/docs/*.md]", "/project/docs/a.md", true)]
    #[case::anchored_not_nested("[/docs/*.md]", "/project/docs/deep/a.md", false)]
    #[case::relative_with_slash("[docs/**]", "/project/docs/deep/a.md", true)]
    #[case::outside_dir("[*]", "/elsewhere/a.md", false)]
    #[case::trailing_comment("[*.md] # docs", "/project/a.md", true)]
    #[case::trailing_semicolon_comment("[*.md] ; docs", "/project/a.txt", false)]
    fn test_section_matching(#[case] header: &str, #[case] file: &str, #[case] matches: bool) {
        let config = parse(&format!("{}\ninsert_final_newline = true\n", header));
        let expected = if matches { Some(true) } else { None };
        assert_eq!(props(&config, file).insert_final_newline, expected);
    }

    #[rstest]
    #[case::unterminated_header("[*.md\n", 1)]
    #[case::text_after_header("[*.md] docs\n", 1)]
    #[case::missing_equals("[*]\nmax_line_length 80\n", 2)]
    #[case::bad_glob("[*]\n[a[b]\n", 2)]
    fn test_parse_errors(#[case] content: &str, #[case] line: usize) {
        let err = EditorConfigFile::parse(Path::new("/p/.editorconfig"), content).unwrap_err();
        match err {
            EngineError::EditorConfig { line: got, .. } => assert_eq!(got, line),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_values_are_case_insensitive() {
        let config = parse("[*]\nIndent_Style = Space\nInsert_Final_Newline = FALSE\n");
        let p = props(&config, "/project/x.txt");
        assert_eq!(p.indent_style, Some(IndentStyle::Space));
        assert_eq!(p.insert_final_newline, Some(false));
    }

    #[test]
    fn test_inner_file_overrides_outer() {
        let dir = tempdir().unwrap();
        let inner = dir.path().join("pkg");
        fs::create_dir_all(&inner).unwrap();
        fs::write(dir.path().join(EDITORCONFIG_FILE), "root = true\n[*]\nmax_line_length = 80\nindent_style = space\n").unwrap();
        fs::write(inner.join(EDITORCONFIG_FILE), "[*]\nmax_line_length = 120\n").unwrap();

        let mut cache = EditorConfigCache::new();
        let p = cache.properties_for(&inner.join("a.md")).unwrap();
        assert_eq!(p.max_line_length, Some(120));
        assert_eq!(p.indent_style, Some(IndentStyle::Space));
    }

    #[test]
    fn test_root_stops_lookup() {
        let dir = tempdir().unwrap();
        let inner = dir.path().join("pkg");
        fs::create_dir_all(&inner).unwrap();
        fs::write(dir.path().join(EDITORCONFIG_FILE), "[*]\nindent_style = tab\n").unwrap();
        fs::write(inner.join(EDITORCONFIG_FILE), "root = true\n[*]\nmax_line_length = 90\n").unwrap();

        let mut cache = EditorConfigCache::new();
        let p = cache.properties_for(&inner.join("a.md")).unwrap();
        assert_eq!(p.max_line_length, Some(90));
        assert_eq!(p.indent_style, None);
    }

    #[test]
    fn test_cache_is_stale_until_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(EDITORCONFIG_FILE);
        let file = dir.path().join("a.md");
        fs::write(&path, "root = true\n[*]\nmax_line_length = 80\n").unwrap();

        let mut cache = EditorConfigCache::new();
        assert_eq!(cache.properties_for(&file).unwrap().max_line_length, Some(80));

        fs::write(&path, "root = true\n[*]\nmax_line_length = 40\n").unwrap();
        assert_eq!(cache.properties_for(&file).unwrap().max_line_length, Some(80));

        cache.reload(&path).unwrap();
        assert_eq!(cache.properties_for(&file).unwrap().max_line_length, Some(40));
    }

    #[test]
    fn test_reload_of_broken_file_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(EDITORCONFIG_FILE);
        fs::write(&path, "root = true\n").unwrap();

        let mut cache = EditorConfigCache::new();
        cache.properties_for(&dir.path().join("a.md")).unwrap();

        fs::write(&path, "[*\n").unwrap();
        assert!(matches!(
            cache.reload(&path),
            Err(EngineError::EditorConfig { line: 1, .. })
        ));
    }

    #[test]
    fn test_reload_of_removed_file_caches_absence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(EDITORCONFIG_FILE);
        let file = dir.path().join("a.md");
        fs::write(&path, "root = true\n[*]\nmax_line_length = 10\n").unwrap();

        let mut cache = EditorConfigCache::new();
        assert_eq!(cache.properties_for(&file).unwrap().max_line_length, Some(10));

        fs::remove_file(&path).unwrap();
        cache.reload(&path).unwrap();
        // Ancestors above the temp dir are outside our control, so only the
        // value from the removed file is checked.
        assert_ne!(cache.properties_for(&file).unwrap().max_line_length, Some(10));
    }

    #[test]
    fn test_candidates_innermost_first() {
        let list = candidates(Path::new("/a/b/c.md"));
        assert_eq!(list[0], PathBuf::from("/a/b/.editorconfig"));
        assert_eq!(list[1], PathBuf::from("/a/.editorconfig"));
        assert_eq!(list.last(), Some(&PathBuf::from("/.editorconfig")));
    }
}
