use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};
use tokio::time::Sleep;

use crate::context::{Context, Subscription};
use crate::error::ContextError;
use crate::eventual::Lookup;
use crate::map::EventualMap;
use crate::waiter::Waiter;
use crate::Eventual;

// Dropping it abandons the waiter and its deadline timer.
pub(crate) struct Wait<T> {
    waiter: Arc<Waiter<T>>,
    ctx: Context,
    deadline: Option<Pin<Box<Sleep>>>,
    _subscription: Subscription,
    done: bool,
}

impl<T: Send + 'static> Wait<T> {
    fn new(waiter: Arc<Waiter<T>>, ctx: &Context) -> Self {
        let subscription = ctx.subscribe(waiter.clone());
        let deadline = ctx
            .deadline()
            .map(|deadline| Box::pin(tokio::time::sleep_until(deadline.into())));
        Wait {
            waiter,
            ctx: ctx.clone(),
            deadline,
            _subscription: subscription,
            done: false,
        }
    }
}

impl<T> Future for Wait<T> {
    type Output = Result<T, ContextError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        if let Some(deadline) = self.deadline.as_mut() {
            if deadline.as_mut().poll(cx).is_ready() {
                self.deadline = None;
                self.ctx.expire();
            }
        }

        let poll = self.waiter.poll_wait(&self.ctx, cx);
        if poll.is_ready() {
            self.done = true;
        }
        poll
    }
}

impl<T> Drop for Wait<T> {
    fn drop(&mut self) {
        if !self.done {
            self.waiter.abandon();
        }
    }
}

impl<T> Eventual<T>
where
    T: Clone + PartialEq + Default + Send + 'static,
{
    /// Same as [`get`](Eventual::get), suspending the task instead of blocking the thread.
    ///
    /// Deadlines are timed by tokio, so this must run inside a runtime with the timer enabled.
    pub async fn get_async(&self, ctx: &Context) -> Result<T, ContextError> {
        match self.lookup() {
            Lookup::Fresh(value) => Ok(value),
            Lookup::Parked(waiter) => match Wait::new(waiter, ctx).await {
                Ok(value) => Ok(value),
                Err(err) => self.give_up(err),
            },
        }
    }
}

impl<K, V> EventualMap<K, V>
where
    K: Eq + std::hash::Hash,
    V: Clone + PartialEq + Default + Send + 'static,
{
    /// Same as [`get`](EventualMap::get), suspending the task instead of blocking the thread.
    pub async fn get_async(&self, key: K, ctx: &Context) -> Result<V, ContextError> {
        self.cell(key).get_async(ctx).await
    }
}
