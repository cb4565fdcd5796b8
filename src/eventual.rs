use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::CellConfig;
use crate::context::Context;
use crate::error::ContextError;
use crate::state::State;
use crate::waiter::Waiter;

const NEVER_EXPIRES: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

pub(crate) enum Lookup<T> {
    Fresh(T),
    Parked(Arc<Waiter<T>>),
}

/// A value readers block on until it is set. Clones share the value.
pub struct Eventual<T> {
    state: Arc<Mutex<State<T>>>,
    config: CellConfig<T>,
}

impl<T: Clone> Clone for Eventual<T> {
    fn clone(&self) -> Self {
        Eventual {
            state: self.state.clone(),
            config: self.config.clone(),
        }
    }
}

impl<T: Default> Default for Eventual<T> {
    fn default() -> Self {
        Eventual {
            state: Arc::new(Mutex::default()),
            config: CellConfig::default(),
        }
    }
}

impl<T> Eventual<T>
where
    T: Clone + PartialEq + Default + Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancelled reads yield `default_value` instead of an error.
    pub fn with_default(default_value: T) -> Self {
        Self::with_config(CellConfig::with_default(default_value))
    }

    pub fn with_config(config: CellConfig<T>) -> Self {
        Eventual {
            config,
            ..Default::default()
        }
    }

    pub fn set(&self, value: T) {
        let expiration = Instant::now().checked_add(NEVER_EXPIRES);
        self.populate(value, expiration);
    }

    /// Only the first set since construction or [`reset`](Eventual::reset) wakes readers and
    /// records the expiration. Later sets replace the value but keep the expiration.
    pub fn set_expiring(&self, value: T, expiration: Instant) {
        self.populate(value, Some(expiration));
    }

    pub fn reset(&self) {
        let parked = self.state.lock().reset();
        tracing::debug!(parked, "eventual value reset");
    }

    /// A fresh value is returned even when `ctx` already fired, see [`dont_wait`](crate::dont_wait).
    pub fn get(&self, ctx: &Context) -> Result<T, ContextError> {
        match self.lookup() {
            Lookup::Fresh(value) => Ok(value),
            Lookup::Parked(waiter) => waiter.wait(ctx).or_else(|err| self.give_up(err)),
        }
    }

    /// The lock is held while `producer` runs, so concurrent callers wait for it instead of
    /// producing their own. If `producer` fails, nothing is stored.
    pub fn get_or_populate<E, F>(&self, expiration: Instant, producer: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let mut state = self.state.lock();
        if let Some(value) = state.fresh(Instant::now()) {
            return Ok(value);
        }

        let value = producer().map_err(|err| {
            tracing::trace!("eventual value producer failed");
            err
        })?;
        let released = state.populate(value.clone(), Some(expiration));
        if released > 0 {
            tracing::trace!(released, "eventual value populated");
        }

        Ok(value)
    }

    pub(crate) fn lookup(&self) -> Lookup<T> {
        let mut state = self.state.lock();
        match state.fresh(Instant::now()) {
            Some(value) => Lookup::Fresh(value),
            None => Lookup::Parked(state.park()),
        }
    }

    pub(crate) fn give_up(&self, err: ContextError) -> Result<T, ContextError> {
        tracing::trace!(%err, "eventual value wait gave up");
        match self.config.fallback() {
            Some(default_value) => Ok(default_value.clone()),
            None => Err(err),
        }
    }

    fn populate(&self, value: T, expiration: Option<Instant>) {
        let released = self.state.lock().populate(value, expiration);
        if released > 0 {
            tracing::trace!(released, "eventual value populated");
        }
    }
}

impl<T> std::fmt::Debug for Eventual<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Eventual").finish_non_exhaustive()
    }
}
