use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Instant;

use crate::context::Context;
use crate::error::ContextError;
use crate::Eventual;

/// Eventual values by key. The value for a key is created on first use and never removed.
pub struct EventualMap<K, V> {
    values: Arc<Mutex<HashMap<K, Eventual<V>>>>,
}

impl<K, V> Clone for EventualMap<K, V> {
    fn clone(&self) -> Self {
        EventualMap {
            values: self.values.clone(),
        }
    }
}

impl<K, V> Default for EventualMap<K, V> {
    fn default() -> Self {
        EventualMap {
            values: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K, V> EventualMap<K, V>
where
    K: Eq + Hash,
    V: Clone + PartialEq + Default + Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: K, value: V) {
        self.cell(key).set(value);
    }

    pub fn set_expiring(&self, key: K, value: V, expiration: Instant) {
        self.cell(key).set_expiring(value, expiration);
    }

    pub fn reset(&self, key: K) {
        self.cell(key).reset();
    }

    /// See [`Eventual::get`].
    pub fn get(&self, key: K, ctx: &Context) -> Result<V, ContextError> {
        self.cell(key).get(ctx)
    }

    /// See [`Eventual::get_or_populate`].
    pub fn get_or_populate<E, F>(&self, key: K, expiration: Instant, producer: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        self.cell(key).get_or_populate(expiration, producer)
    }

    /// Number of keys referenced so far.
    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }

    /// The handle for `key`, created if missing. The map lock is released before it is used.
    pub(crate) fn cell(&self, key: K) -> Eventual<V> {
        self.values.lock().entry(key).or_default().clone()
    }
}
