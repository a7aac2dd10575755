//! Engine abstraction and construction.
//!
//! This module provides the `Engine` trait implemented by the stateful
//! workers that process files, and the `EngineFactory` that builds them
//! from a lazily resolved [`RuleProviderSet`].

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::error::{BoxError, CoreError};
use crate::provider::{ProviderDescriptor, RuleProviderResolver, RuleProviderSet};

/// A stateful worker that processes files.
///
/// Engines are expensive to construct and cache configuration-derived state
/// internally. They only need to be `Send`: the pool guarantees that a single
/// borrower uses an engine at a time.
pub trait Engine: Send {
    /// Discards any cached state derived from the configuration file at `path`.
    ///
    /// After this returns `Ok`, the next read of `path` must observe the
    /// current file contents (or its absence).
    fn reload_config(&mut self, path: &Path) -> Result<(), BoxError>;
}

/// Builds a fresh [`Engine`] from a resolved rule set.
pub trait EngineBuilder: Send + Sync {
    type Engine: Engine;

    /// Constructs a new engine.
    ///
    /// # Arguments
    ///
    /// * `providers` - Rule set shared (read-only) by every engine
    fn build(&self, providers: Arc<RuleProviderSet>) -> Result<Self::Engine, BoxError>;
}

impl<F, E> EngineBuilder for F
where
    F: Fn(Arc<RuleProviderSet>) -> Result<E, BoxError> + Send + Sync,
    E: Engine,
{
    type Engine = E;

    fn build(&self, providers: Arc<RuleProviderSet>) -> Result<E, BoxError> {
        self(providers)
    }
}

/// Creates engines that all share one resolved [`RuleProviderSet`].
///
/// Provider resolution runs once, the first time an engine is needed.
pub struct EngineFactory<B> {
    builder: B,
    descriptors: Vec<ProviderDescriptor>,
    providers: OnceLock<Arc<RuleProviderSet>>,
    created: AtomicUsize,
}

impl<B: EngineBuilder> EngineFactory<B> {
    /// Creates a factory over the given provider descriptors.
    pub fn new(builder: B, descriptors: Vec<ProviderDescriptor>) -> Self {
        Self {
            builder,
            descriptors,
            providers: OnceLock::new(),
            created: AtomicUsize::new(0),
        }
    }

    /// Returns the resolved rule set, resolving it on first use.
    pub fn providers(&self) -> Arc<RuleProviderSet> {
        Arc::clone(self.providers.get_or_init(|| {
            let resolved = RuleProviderResolver::resolve(&self.descriptors);
            debug!(
                "Resolved {} rules from {} providers",
                resolved.len(),
                self.descriptors.len()
            );
            Arc::new(resolved)
        }))
    }

    /// Constructs a fresh engine.
    pub fn create(&self) -> Result<B::Engine, CoreError> {
        let engine = self
            .builder
            .build(self.providers())
            .map_err(CoreError::EngineConstruction)?;
        let total = self.created.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("Created engine #{}", total);
        Ok(engine)
    }

    /// Returns how many engines this factory has constructed.
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }
}
