//! Configuration invalidation across every engine.
//!
//! A configuration change has to reach the pooled engines, idle or borrowed,
//! and the dispatcher's sequential engine. The pool side runs behind the
//! pool's drain barrier (see [`EnginePool::invalidate`](crate::EnginePool::invalidate)).

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::dispatcher::AdaptiveDispatcher;
use crate::engine::{Engine, EngineBuilder, EngineFactory};
use crate::error::CoreError;

/// Reloads `path` in every engine of `engines`.
///
/// An engine whose reload fails is discarded and replaced by a fresh one from
/// `factory`; if that also fails the engine is dropped, shrinking `engines`.
/// Every engine is visited before the first reload error is returned.
///
/// Returns the number of engines left in `engines`.
pub(crate) fn reload_engines<B: EngineBuilder>(
    engines: &mut VecDeque<B::Engine>,
    path: &Path,
    factory: &EngineFactory<B>,
) -> Result<usize, CoreError> {
    let mut failed = 0;
    let mut first_error = None;

    for mut engine in std::mem::take(engines) {
        match engine.reload_config(path) {
            Ok(()) => engines.push_back(engine),
            Err(err) => {
                failed += 1;
                warn!(
                    "Failed to reload {} in engine, rebuilding it: {}",
                    path.display(),
                    err
                );
                drop(engine);
                match factory.create() {
                    Ok(fresh) => engines.push_back(fresh),
                    Err(rebuild) => {
                        warn!("Failed to rebuild engine, dropping it: {}", rebuild);
                    }
                }
                first_error.get_or_insert(err);
            }
        }
    }

    match first_error {
        None => Ok(engines.len()),
        Some(source) => Err(CoreError::Reload {
            path: path.to_path_buf(),
            failed,
            source,
        }),
    }
}

impl<B: EngineBuilder> AdaptiveDispatcher<B> {
    /// Makes every engine observe the current contents of `path`.
    ///
    /// Blocks until all in-flight parallel borrowers have returned their
    /// engines and any running sequential batch has finished. Both the pool
    /// and the sequential engine are reloaded even if one of them fails; the
    /// first failure is returned.
    pub fn notify_config_changed(&self, path: &Path) -> Result<(), CoreError> {
        info!(
            "Reloading editorconfig in all engines for path: {}",
            path.display()
        );

        let sequential = self.reload_sequential(path);
        let pooled = self.pool.invalidate(path).map(|_| ());
        sequential.and(pooled)
    }

    /// Applies [`notify_config_changed`](Self::notify_config_changed) to each
    /// changed path, returning the first failure after all paths are applied.
    pub fn apply_changes(&self, paths: &[PathBuf]) -> Result<(), CoreError> {
        let mut first_error = None;
        for path in paths {
            if let Err(e) = self.notify_config_changed(path) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn reload_sequential(&self, path: &Path) -> Result<(), CoreError> {
        let mut single = self.single.lock();
        let Some(engine) = single.as_mut() else {
            // Not built yet: it will read fresh state when first used.
            return Ok(());
        };

        let reloaded = engine.reload_config(path);
        reloaded.map_err(|source| {
            warn!(
                "Failed to reload {} in sequential engine, discarding it: {}",
                path.display(),
                source
            );
            *single = None;
            CoreError::Reload {
                path: path.to_path_buf(),
                failed: 1,
                source,
            }
        })
    }
}
