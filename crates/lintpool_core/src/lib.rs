//! # lintpool_core
//!
//! Bounded engine pooling and adaptive batch dispatch for LintPool.
//!
//! This crate provides:
//! - Rule provider resolution into a shared, ordered rule set
//! - The `EngineFactory` that builds engines from that rule set
//! - The `EnginePool` of exclusively borrowed engines
//! - The `AdaptiveDispatcher` choosing sequential or parallel execution
//! - Configuration invalidation across every engine
//!
//! ## Example
//!
//! ```rust,ignore
//! use lintpool_core::{AdaptiveDispatcher, DispatchConfig};
//!
//! let config = DispatchConfig::from_file(".lintpool.json")?;
//! let dispatcher = AdaptiveDispatcher::new(builder, &config)?;
//!
//! let results = dispatcher.dispatch(&files, config.parallel, |engine, file| engine.lint(file))?;
//! dispatcher.notify_config_changed(Path::new(".editorconfig"))?;
//! ```

mod config;
mod dispatcher;
mod engine;
mod error;
mod invalidator;
pub mod pool;
pub mod provider;
mod tracker;

pub use config::{DEFAULT_PARALLEL_THRESHOLD, DispatchConfig, PARALLEL_ENV_VAR};
pub use dispatcher::{AdaptiveDispatcher, BatchOutcome, Strategy};
pub use engine::{Engine, EngineBuilder, EngineFactory};
pub use error::{BoxError, CoreError};
pub use pool::{EnginePool, PooledEngine};
pub use provider::{
    ProviderDescriptor, RuleProvider, RuleProviderResolver, RuleProviderSet, STANDARD_PROVIDER_ID,
};
pub use tracker::ConfigTracker;
