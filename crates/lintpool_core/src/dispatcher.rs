//! Adaptive batch dispatch.
//!
//! Small batches, or batches where parallelism is not allowed, run on the
//! calling thread against one long-lived engine. Larger batches fan out over
//! rayon, with every task borrowing an engine from the [`EnginePool`]; the
//! pool, not the thread count, bounds how many tasks run at once.

use std::sync::Arc;

use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::debug;

use crate::config::DispatchConfig;
use crate::engine::{EngineBuilder, EngineFactory};
use crate::error::CoreError;
use crate::pool::EnginePool;

/// Outcome of one batch: one result per task, in input order.
///
/// The outer error is fatal for the whole batch (no engine could be produced);
/// inner errors belong to individual tasks.
pub type BatchOutcome<R, E> = Result<Vec<Result<R, E>>, CoreError>;

/// Execution strategy chosen for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// On the calling thread with the single cached engine.
    Sequential,
    /// Across the rayon thread pool with pooled engines.
    Parallel,
}

/// Runs batches of tasks against pooled engines.
pub struct AdaptiveDispatcher<B: EngineBuilder> {
    factory: Arc<EngineFactory<B>>,
    pub(crate) pool: EnginePool<B>,
    /// Engine for sequential batches. Built on first use.
    pub(crate) single: Mutex<Option<B::Engine>>,
    parallel_threshold: usize,
}

impl<B: EngineBuilder> AdaptiveDispatcher<B> {
    /// Creates a dispatcher, eagerly filling its engine pool.
    pub fn new(builder: B, config: &DispatchConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let factory = Arc::new(EngineFactory::new(builder, config.providers.clone()));
        Self::with_factory(factory, config.pool_size, config.parallel_threshold)
    }

    /// Creates a dispatcher over an existing factory.
    pub fn with_factory(
        factory: Arc<EngineFactory<B>>,
        pool_size: usize,
        parallel_threshold: usize,
    ) -> Result<Self, CoreError> {
        let pool = EnginePool::new(Arc::clone(&factory), pool_size)?;
        Ok(Self {
            factory,
            pool,
            single: Mutex::new(None),
            parallel_threshold,
        })
    }

    /// Picks the strategy for a batch of `task_count` tasks.
    pub fn strategy_for(&self, task_count: usize, parallel_allowed: bool) -> Strategy {
        if !parallel_allowed || task_count < self.parallel_threshold {
            Strategy::Sequential
        } else {
            Strategy::Parallel
        }
    }

    /// Runs `process` for every task and returns the results in input order.
    ///
    /// A task's error stays in its slot and does not stop its siblings. The
    /// batch fails as a whole only when no engine can be produced; tasks not
    /// yet started are then skipped.
    ///
    /// `process` must not dispatch on this dispatcher itself.
    pub fn dispatch<T, R, E, F>(
        &self,
        tasks: &[T],
        parallel_allowed: bool,
        process: F,
    ) -> BatchOutcome<R, E>
    where
        T: Sync,
        R: Send,
        E: Send,
        F: Fn(&mut B::Engine, &T) -> Result<R, E> + Sync,
    {
        if tasks.is_empty() {
            return Ok(Vec::new());
        }

        let strategy = self.strategy_for(tasks.len(), parallel_allowed);
        debug!("Dispatching {} tasks ({:?})", tasks.len(), strategy);

        match strategy {
            Strategy::Sequential => self.run_sequential(tasks, process),
            Strategy::Parallel => self.run_parallel(tasks, process),
        }
    }

    fn run_sequential<T, R, E, F>(&self, tasks: &[T], process: F) -> BatchOutcome<R, E>
    where
        F: Fn(&mut B::Engine, &T) -> Result<R, E>,
    {
        let mut single = self.single.lock();
        let mut engine = match single.take() {
            Some(engine) => engine,
            None => self.factory.create()?,
        };

        let results = tasks.iter().map(|task| process(&mut engine, task)).collect();

        *single = Some(engine);
        Ok(results)
    }

    fn run_parallel<T, R, E, F>(&self, tasks: &[T], process: F) -> BatchOutcome<R, E>
    where
        T: Sync,
        R: Send,
        E: Send,
        F: Fn(&mut B::Engine, &T) -> Result<R, E> + Sync,
    {
        tasks
            .par_iter()
            .map(|task| self.pool.with_engine(|engine| process(engine, task)))
            .collect()
    }

    /// Returns the engine pool used for parallel batches.
    pub fn pool(&self) -> &EnginePool<B> {
        &self.pool
    }

    /// Returns the factory shared by the pool and the sequential engine.
    pub fn factory(&self) -> &EngineFactory<B> {
        &self.factory
    }

    /// Returns the batch size from which parallel dispatch is used.
    pub fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }
}
