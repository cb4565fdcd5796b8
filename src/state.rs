use std::sync::Arc;
use std::time::Instant;

use crate::waiter::Waiter;

/// Everything an [`Eventual`](crate::Eventual) guards with its lock.
pub(crate) struct State<T> {
    value: T,
    expiration: Option<Instant>,
    populated: bool,
    waiters: Vec<Arc<Waiter<T>>>,
}

impl<T: Default> Default for State<T> {
    fn default() -> Self {
        State {
            value: T::default(),
            expiration: None,
            populated: false,
            waiters: Vec::new(),
        }
    }
}

impl<T: Clone + Default> State<T> {
    /// The stored value if it is populated and not expired at `now`.
    pub(crate) fn fresh(&self, now: Instant) -> Option<T> {
        match self.expiration {
            _ if !self.populated => None,
            Some(expiration) if expiration <= now => None,
            _ => Some(self.value.clone()),
        }
    }

    /// Stores `value`. Only the first population since construction or reset releases the
    /// waiters and records the expiration; later calls just overwrite the value.
    ///
    /// Returns how many waiters were released.
    pub(crate) fn populate(&mut self, value: T, expiration: Option<Instant>) -> usize {
        let mut released = 0;
        if !self.populated {
            for waiter in self.waiters.drain(..) {
                waiter.deliver(value.clone());
                released += 1;
            }
            self.expiration = expiration;
            self.populated = true;
        }
        self.value = value;

        released
    }

    /// Back to the freshly constructed state. Parked waiters are kept.
    pub(crate) fn reset(&mut self) -> usize {
        self.value = T::default();
        self.expiration = None;
        self.populated = false;

        self.waiters.len()
    }

    pub(crate) fn park(&mut self) -> Arc<Waiter<T>> {
        self.waiters.retain(|waiter| !waiter.is_abandoned());

        let waiter = Waiter::new();
        self.waiters.push(waiter.clone());
        waiter
    }

    #[cfg(test)]
    pub(crate) fn parked(&self) -> usize {
        self.waiters.len()
    }
}
