use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::Instant;

use crate::context::{Context, Listener};
use crate::error::ContextError;

struct Slot<T> {
    value: Option<T>,
    interrupted: bool,
    abandoned: bool,
}

/// One-shot delivery slot for a reader parked until first population.
///
/// Holds at most one value, so delivering never waits for the reader.
pub(crate) struct Waiter<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
    #[cfg(feature = "async")]
    waker: futures::task::AtomicWaker,
}

impl<T> Waiter<T> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Waiter {
            slot: Mutex::new(Slot {
                value: None,
                interrupted: false,
                abandoned: false,
            }),
            ready: Condvar::new(),
            #[cfg(feature = "async")]
            waker: futures::task::AtomicWaker::new(),
        })
    }

    pub(crate) fn deliver(&self, value: T) {
        self.slot.lock().value = Some(value);
        self.wake();
    }

    /// A waiter whose reader gave up. Delivering to it is harmless but pointless.
    pub(crate) fn is_abandoned(&self) -> bool {
        self.slot.lock().abandoned
    }

    #[cfg(feature = "async")]
    pub(crate) fn abandon(&self) {
        self.slot.lock().abandoned = true;
    }

    #[cfg(feature = "async")]
    pub(crate) fn poll_wait(
        &self,
        ctx: &Context,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<T, ContextError>> {
        use std::task::Poll;

        self.waker.register(cx.waker());

        let mut slot = self.slot.lock();
        if let Some(value) = slot.value.take() {
            return Poll::Ready(Ok(value));
        }
        if !slot.interrupted && !passed(ctx.deadline()) {
            return Poll::Pending;
        }
        slot.abandoned = true;
        drop(slot);

        Poll::Ready(Err(ctx.err().unwrap_or(ContextError::Canceled)))
    }

    fn wake(&self) {
        self.ready.notify_one();
        #[cfg(feature = "async")]
        self.waker.wake();
    }
}

impl<T: Send + 'static> Waiter<T> {
    /// Blocks until a value is delivered or `ctx` fires.
    pub(crate) fn wait(self: &Arc<Self>, ctx: &Context) -> Result<T, ContextError> {
        let _subscription = ctx.subscribe(self.clone());
        let deadline = ctx.deadline();
        let mut slot = self.slot.lock();
        loop {
            if let Some(value) = slot.value.take() {
                return Ok(value);
            }
            if slot.interrupted || passed(deadline) {
                break;
            }
            match deadline {
                Some(deadline) => {
                    self.ready.wait_until(&mut slot, deadline);
                }
                None => self.ready.wait(&mut slot),
            }
        }
        slot.abandoned = true;
        drop(slot);

        Err(ctx.err().unwrap_or(ContextError::Canceled))
    }
}

impl<T: Send> Listener for Waiter<T> {
    fn interrupt(&self) {
        self.slot.lock().interrupted = true;
        self.wake();
    }
}

fn passed(deadline: Option<Instant>) -> bool {
    deadline.map_or(false, |deadline| deadline <= Instant::now())
}
