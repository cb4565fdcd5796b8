use parking_lot::Mutex;
use std::sync::{Arc, OnceLock, Weak};
use std::time::{Duration, Instant};

use crate::error::ContextError;
use crate::Timeout;

pub(crate) trait Listener: Send + Sync {
    fn interrupt(&self);
}

#[derive(Default)]
struct Signal {
    err: Option<ContextError>,
    listeners: Vec<(u64, Arc<dyn Listener>)>,
    next_id: u64,
}

struct Inner {
    deadline: Option<Instant>,
    signal: Mutex<Signal>,
}

impl Inner {
    fn fire(&self, err: ContextError) {
        let listeners = {
            let mut signal = self.signal.lock();
            if signal.err.is_some() {
                return;
            }
            signal.err = Some(err);
            std::mem::take(&mut signal.listeners)
        };

        // Interrupt outside the signal lock; listeners take their own locks.
        for (_, listener) in listeners {
            listener.interrupt();
        }
    }
}

/// Cancellation signal for [`Eventual::get`](crate::Eventual::get). Clones share one state.
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

impl Context {
    pub fn new() -> Self {
        Self::with_optional_deadline(None)
    }

    pub fn background() -> Self {
        Self::new()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self::with_optional_deadline(Some(deadline))
    }

    /// A context firing `timeout` from now. A timeout too large to represent never fires.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_optional_deadline(Instant::now().checked_add(timeout))
    }

    fn with_optional_deadline(deadline: Option<Instant>) -> Self {
        Context {
            inner: Arc::new(Inner {
                deadline,
                signal: Mutex::default(),
            }),
        }
    }

    pub fn cancel(&self) {
        self.inner.fire(ContextError::Canceled);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    pub fn err(&self) -> Option<ContextError> {
        if let Some(err) = self.inner.signal.lock().err {
            return Some(err);
        }

        match self.inner.deadline {
            Some(deadline) if deadline <= Instant::now() => {
                self.inner.fire(ContextError::DeadlineExceeded);
                self.inner.signal.lock().err
            }
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    // A context that already fired interrupts the listener right away.
    pub(crate) fn subscribe(&self, listener: Arc<dyn Listener>) -> Subscription {
        let mut signal = self.inner.signal.lock();
        if signal.err.is_some() {
            drop(signal);
            listener.interrupt();
            return Subscription {
                inner: Weak::new(),
                id: 0,
            };
        }

        let id = signal.next_id;
        signal.next_id += 1;
        signal.listeners.push((id, listener));

        Subscription {
            inner: Arc::downgrade(&self.inner),
            id,
        }
    }

    /// Fires the deadline on behalf of a waiter whose own timer elapsed.
    #[cfg(feature = "async")]
    pub(crate) fn expire(&self) {
        self.inner.fire(ContextError::DeadlineExceeded);
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("deadline", &self.inner.deadline)
            .field("err", &self.inner.signal.lock().err)
            .finish()
    }
}

impl From<Timeout> for Context {
    fn from(timeout: Timeout) -> Self {
        match timeout {
            Timeout::Instant => dont_wait().clone(),
            Timeout::Duration(timeout) => Context::with_timeout(timeout),
            Timeout::Infinite => Context::background(),
        }
    }
}

/// An already cancelled context. Reading with it never blocks: the value is returned only if it
/// is available right now, otherwise the read fails with [`ContextError::Canceled`] (or yields the
/// configured default).
pub fn dont_wait() -> &'static Context {
    static DONT_WAIT: OnceLock<Context> = OnceLock::new();
    DONT_WAIT.get_or_init(|| {
        let ctx = Context::new();
        ctx.cancel();
        ctx
    })
}

pub(crate) struct Subscription {
    inner: Weak<Inner>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.signal.lock().listeners.retain(|(id, _)| *id != self.id);
        }
    }
}
