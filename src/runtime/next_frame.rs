//! Awaitable that suspends a task until the next tick.

use crate::runtime::TaskContext;

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Future returned by [`TaskContext::next_frame`].
///
/// The first poll queues the task's continuation on the scheduler and returns
/// `Pending`. Once a later tick resumes the task, it resolves to a clone of
/// that tick's payload. Payloads that are expensive to clone should be passed
/// behind a reference-counted pointer (`Rc<Large>`).
#[must_use = "futures do nothing unless awaited"]
pub struct NextFrame<T> {
    task: TaskContext<T>,
    /// Frame in which the continuation was queued.
    armed_at: Option<u64>,
}

impl<T: 'static> NextFrame<T> {
    pub(crate) fn new(task: TaskContext<T>) -> Self {
        Self {
            task,
            armed_at: None,
        }
    }
}

impl<T: Clone + 'static> Future for NextFrame<T> {
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some(shared) = self.task.upgrade() else {
            return Poll::Pending;
        };
        let mut inner = shared.borrow_mut();

        match self.armed_at {
            None => {
                self.armed_at = Some(inner.frame);
                inner.enqueue_continuation(self.task.id());
                tracing::trace!(task = %self.task.id(), frame = inner.frame, "waiting for next frame");
                Poll::Pending
            }
            // A later tick resumed us.
            Some(armed) if inner.frame > armed => match inner.payload.clone() {
                Some(payload) => Poll::Ready(payload),
                None => Poll::Pending,
            },
            // Woken within the same frame.
            Some(_) => Poll::Pending,
        }
    }
}
