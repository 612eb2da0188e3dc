//! Waker implementation that re-queues a task on the next tick.
//!
//! Tasks normally suspend through [`NextFrame`](super::NextFrame) or a child
//! [`TaskAwaiter`](super::TaskAwaiter), which talk to the scheduler directly.
//! A foreign future (a channel receiver, for instance) only knows the
//! standard waker protocol. Its wake is recorded in a [`WakeInbox`] that the
//! scheduler drains at the start of every tick.

use crate::task::TaskId;

use futures::task::{self, ArcWake};

use std::sync::{Arc, Mutex, PoisonError};
use std::task::Waker;

/// Ids of tasks woken since the last tick.
///
/// Wakers may be cloned and moved to other threads, so the inbox is the one
/// piece of scheduler state behind a lock.
#[derive(Default)]
pub(crate) struct WakeInbox {
    woken: Mutex<Vec<TaskId>>,
}

impl WakeInbox {
    pub(crate) fn push(&self, id: TaskId) {
        self.woken
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(id);
    }

    /// Takes every id woken so far, in wake order.
    pub(crate) fn drain(&self) -> Vec<TaskId> {
        std::mem::take(&mut *self.woken.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Waker that records its task in the scheduler's inbox.
struct TaskWaker {
    id: TaskId,
    inbox: Arc<WakeInbox>,
}

impl ArcWake for TaskWaker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.inbox.push(arc_self.id);
    }
}

/// Creates the waker handed to `id` every time it is polled.
pub(crate) fn make_waker(id: TaskId, inbox: Arc<WakeInbox>) -> Waker {
    task::waker(Arc::new(TaskWaker { id, inbox }))
}
