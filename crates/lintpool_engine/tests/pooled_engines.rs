//! Integration tests running line engines through the dispatcher.

use std::fs;
use std::path::PathBuf;

use lintpool_core::{AdaptiveDispatcher, DispatchConfig, ProviderDescriptor};
use lintpool_engine::{EDITORCONFIG_FILE, LineEngineBuilder, standard_provider};
use tempfile::TempDir;

fn project(files: usize) -> (TempDir, Vec<PathBuf>) {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join(EDITORCONFIG_FILE),
        "root = true\n[*.md]\nmax_line_length = 20\n",
    )
    .unwrap();

    let paths = (0..files)
        .map(|i| {
            let path = temp_dir.path().join(format!("doc{:02}.md", i));
            fs::write(&path, format!("# Doc {}\n\nthis line is exactly 30 chars\n", i)).unwrap();
            path
        })
        .collect();
    (temp_dir, paths)
}

fn dispatcher() -> AdaptiveDispatcher<LineEngineBuilder> {
    let config = DispatchConfig {
        pool_size: 3,
        providers: vec![standard_provider()],
        ..DispatchConfig::new()
    };
    AdaptiveDispatcher::new(LineEngineBuilder, &config).unwrap()
}

#[test]
fn test_parallel_and_sequential_agree() {
    let (_dir, paths) = project(40);
    let dispatcher = dispatcher();

    let sequential = dispatcher
        .dispatch(&paths, false, |engine, path| engine.lint_file(path))
        .unwrap();
    let parallel = dispatcher
        .dispatch(&paths, true, |engine, path| engine.lint_file(path))
        .unwrap();

    assert_eq!(sequential.len(), 40);
    for (s, p) in sequential.iter().zip(&parallel) {
        assert_eq!(s.as_ref().unwrap(), p.as_ref().unwrap());
    }
    assert!(parallel.iter().all(|r| r.as_ref().unwrap().violations.len() == 1));
}

#[test]
fn test_editorconfig_change_applies_after_notify() {
    let (dir, paths) = project(30);
    let editorconfig = dir.path().join(EDITORCONFIG_FILE);
    let dispatcher = dispatcher();

    let before = dispatcher
        .dispatch(&paths, true, |engine, path| engine.lint_file(path))
        .unwrap();
    assert!(before.iter().all(|r| r.as_ref().unwrap().has_violations()));

    fs::write(&editorconfig, "root = true\n[*.md]\nmax_line_length = 80\n").unwrap();
    dispatcher.notify_config_changed(&editorconfig).unwrap();

    let after = dispatcher
        .dispatch(&paths, true, |engine, path| engine.lint_file(path))
        .unwrap();
    assert!(after.iter().all(|r| !r.as_ref().unwrap().has_violations()));
}

#[test]
fn test_broken_editorconfig_surfaces_reload_error() {
    let (dir, paths) = project(30);
    let editorconfig = dir.path().join(EDITORCONFIG_FILE);
    let dispatcher = dispatcher();
    dispatcher
        .dispatch(&paths, true, |engine, path| engine.lint_file(path))
        .unwrap();

    fs::write(&editorconfig, "[*.md\n").unwrap();
    let err = dispatcher.notify_config_changed(&editorconfig).unwrap_err();
    assert!(err.to_string().contains("Failed to reload"));

    // Every engine was replaced or reloaded; the broken file is now a per-file error.
    assert_eq!(dispatcher.pool().capacity(), 3);
    let results = dispatcher
        .dispatch(&paths, true, |engine, path| engine.lint_file(path))
        .unwrap();
    assert!(results.iter().all(|r| r.is_err()));
}

#[test]
fn test_missing_file_is_isolated() {
    let (dir, mut paths) = project(29);
    paths.insert(10, dir.path().join("missing.md"));
    let dispatcher = dispatcher();

    let results = dispatcher
        .dispatch(&paths, true, |engine, path| engine.lint_file(path))
        .unwrap();

    assert_eq!(results.len(), 30);
    assert!(results[10].is_err());
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 29);
}

#[test]
fn test_plugin_rules_are_resolved_after_standard() {
    let config = DispatchConfig {
        pool_size: 1,
        providers: vec![
            ProviderDescriptor::new("plugin", ["plugin:spelling"]),
            standard_provider(),
        ],
        ..DispatchConfig::new()
    };
    let dispatcher = AdaptiveDispatcher::new(LineEngineBuilder, &config).unwrap();

    let providers = dispatcher.factory().providers();
    assert_eq!(providers.rule_ids().next(), Some("standard:max-line-length"));
    assert_eq!(providers.rule_ids().last(), Some("plugin:spelling"));
}
