//! Engine pooling for parallel processing.
//!
//! This module provides a bounded, thread-safe pool of [`Engine`](crate::Engine) instances.
//! Engines are not safe for concurrent use, so each one is lent to exactly
//! one borrower at a time and returned when its [`PooledEngine`] guard drops.
//!
//! The idle queue is the permit set: a borrower can only proceed by taking an
//! idle engine, so the number of concurrent borrowers never exceeds the number
//! of engines the pool owns, and an available permit with an empty queue
//! cannot happen. A reader/writer lock acts as the drain barrier for
//! [`EnginePool::invalidate`]: borrows hold it shared, invalidation holds it
//! exclusively.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex, RwLock, RwLockReadGuard};
use tracing::debug;

use crate::engine::{EngineBuilder, EngineFactory};
use crate::error::CoreError;
use crate::invalidator::reload_engines;

struct Slots<E> {
    idle: VecDeque<E>,
    borrowed: usize,
    /// Engines owned by the pool, idle or borrowed.
    capacity: usize,
}

/// Fixed-capacity pool of engines.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use lintpool_core::{EngineFactory, EnginePool};
///
/// let factory = Arc::new(EngineFactory::new(builder, descriptors));
/// let pool = EnginePool::new(factory, 4)?;
///
/// // In parallel threads:
/// let violations = pool.with_engine(|engine| engine.lint(&path, &content))?;
/// ```
pub struct EnginePool<B: EngineBuilder> {
    factory: Arc<EngineFactory<B>>,
    slots: Mutex<Slots<B::Engine>>,
    returned: Condvar,
    drain: RwLock<()>,
}

impl<B: EngineBuilder> EnginePool<B> {
    /// Creates a pool and eagerly constructs `size` engines.
    ///
    /// Fails if `size` is zero or if any engine cannot be constructed.
    pub fn new(factory: Arc<EngineFactory<B>>, size: usize) -> Result<Self, CoreError> {
        if size == 0 {
            return Err(CoreError::config("Engine pool size must be at least 1"));
        }

        let idle = (0..size)
            .map(|_| factory.create())
            .collect::<Result<VecDeque<_>, _>>()?;
        debug!("Pre-populated engine pool with {} engines", size);

        Ok(Self {
            factory,
            slots: Mutex::new(Slots {
                idle,
                borrowed: 0,
                capacity: size,
            }),
            returned: Condvar::new(),
            drain: RwLock::new(()),
        })
    }

    /// Borrows an engine, blocking until one is idle.
    ///
    /// The engine is returned to the pool when the guard drops, including
    /// when the borrower panics. Must not be called while the same thread
    /// already holds a guard from this pool.
    pub fn acquire(&self) -> Result<PooledEngine<'_, B::Engine>, CoreError> {
        let permit = self.drain.read();
        let mut slots = self.slots.lock();

        let engine = loop {
            if let Some(engine) = slots.idle.pop_front() {
                break engine;
            }
            // Capacity only changes under the exclusive drain lock.
            if slots.capacity == 0 {
                return Err(CoreError::PoolExhausted);
            }
            self.returned.wait(&mut slots);
        };

        slots.borrowed += 1;
        debug_assert_eq!(slots.idle.len() + slots.borrowed, slots.capacity);
        drop(slots);

        Ok(PooledEngine {
            engine: Some(engine),
            slots: &self.slots,
            returned: &self.returned,
            _permit: permit,
        })
    }

    /// Runs `body` with exclusive access to a pooled engine.
    ///
    /// The engine goes back to the pool before this returns, whatever `body`
    /// produced; a domain error is part of `T` and simply passes through.
    pub fn with_engine<T>(
        &self,
        body: impl FnOnce(&mut B::Engine) -> T,
    ) -> Result<T, CoreError> {
        let mut engine = self.acquire()?;
        Ok(body(&mut engine))
    }

    /// Reloads the configuration file at `path` in every pooled engine.
    ///
    /// Waits for every borrowed engine to come back and keeps new borrowers
    /// out until all engines are reloaded. An engine whose reload fails is
    /// replaced by a fresh one, or dropped if that fails too; the reload
    /// error is returned either way.
    ///
    /// Returns the number of engines in the pool afterwards.
    pub fn invalidate(&self, path: &Path) -> Result<usize, CoreError> {
        let _drain = self.drain.write();
        let mut slots = self.slots.lock();
        debug_assert_eq!(slots.borrowed, 0, "borrower outlived the drain barrier");

        let result = reload_engines(&mut slots.idle, path, &self.factory);
        slots.capacity = slots.idle.len();
        drop(slots);

        self.returned.notify_all();
        result
    }

    /// Returns the number of engines owned by the pool.
    pub fn capacity(&self) -> usize {
        self.slots.lock().capacity
    }

    /// Returns the number of idle engines.
    pub fn available_count(&self) -> usize {
        self.slots.lock().idle.len()
    }

    /// Returns the number of engines currently borrowed.
    pub fn in_use(&self) -> usize {
        self.slots.lock().borrowed
    }

    /// Returns the factory this pool builds engines with.
    pub fn factory(&self) -> &EngineFactory<B> {
        &self.factory
    }
}

/// A RAII guard that returns the engine to the pool on drop.
pub struct PooledEngine<'a, E> {
    engine: Option<E>,
    slots: &'a Mutex<Slots<E>>,
    returned: &'a Condvar,
    // Released after the engine is back in the queue (fields drop after `Drop::drop`).
    _permit: RwLockReadGuard<'a, ()>,
}

impl<E> std::ops::Deref for PooledEngine<'_, E> {
    type Target = E;

    fn deref(&self) -> &Self::Target {
        self.engine.as_ref().expect("engine was already returned")
    }
}

impl<E> std::ops::DerefMut for PooledEngine<'_, E> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.engine.as_mut().expect("engine was already returned")
    }
}

impl<E> Drop for PooledEngine<'_, E> {
    fn drop(&mut self) {
        if let Some(engine) = self.engine.take() {
            let mut slots = self.slots.lock();
            slots.idle.push_back(engine);
            slots.borrowed -= 1;
            drop(slots);
            self.returned.notify_one();
        }
    }
}
