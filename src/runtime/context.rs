//! Per-task handle to the scheduler, injected into every task body.
//!
//! A task only learns which scheduler owns it when it is bound, so the
//! scheduler reference cannot be captured when the task is created. Instead
//! the body receives a [`TaskContext`] on its first resume, and every
//! awaitable is created from it.
//!
//! # Example
//!
//! ```ignore
//! use frame_reactor::{FrameData, Task};
//!
//! fn double(x: u32) -> Task<FrameData, u32> {
//!     Task::new(move |_cx| async move { Ok(x * 2) })
//! }
//!
//! let root: Task<FrameData> = Task::new(|cx| async move {
//!     let frame = cx.next_frame().await;      // suspend until the next tick
//!     let four = cx.call(double(2)).await?;   // await a child task
//!     assert_eq!(four, 4);
//!     let _ = frame.delta_time;
//!     Ok(())
//! });
//! ```
//!
//! A context belongs to one task: awaitables created from it suspend and
//! resume that task. Handing it to another task body is a logic error.

use crate::error::SchedulerError;
use crate::runtime::core::Shared;
use crate::runtime::{NextFrame, TaskAwaiter};
use crate::task::{Task, TaskHandle, TaskId};

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Access to the owning scheduler from inside a task body.
pub struct TaskContext<T> {
    id: TaskId,
    shared: Weak<RefCell<Shared<T>>>,
}

impl<T: 'static> TaskContext<T> {
    pub(crate) fn new(id: TaskId, shared: Weak<RefCell<Shared<T>>>) -> Self {
        Self { id, shared }
    }

    /// Id of the task this context belongs to.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Number of ticks the owning scheduler has run, or `0` once it is gone.
    pub fn frame(&self) -> u64 {
        match self.upgrade() {
            Some(shared) => {
                let frame = shared.borrow().frame;
                frame
            }
            None => 0,
        }
    }

    /// Suspends the task until the next tick and yields that tick's payload.
    pub fn next_frame(&self) -> NextFrame<T> {
        NextFrame::new(self.clone())
    }

    /// Awaits `task` to completion and yields its value or its error.
    ///
    /// The child is bound to this task's scheduler and started immediately.
    /// If it finishes without suspending, the caller continues in the same
    /// resume, without waiting for a tick.
    pub fn call<R: 'static>(&self, task: Task<T, R>) -> TaskAwaiter<T, R> {
        TaskAwaiter::new(self.clone(), task)
    }

    /// Pushes a new root task onto the owning scheduler.
    ///
    /// A task spawned while continuations are being resumed is bootstrapped
    /// later in the same tick; one spawned during the bootstrap pass waits
    /// for the next tick.
    pub fn spawn(&self, task: Task<T>) -> Result<TaskHandle, SchedulerError> {
        let shared = self.upgrade().ok_or(SchedulerError::SchedulerGone)?;
        let handle = shared.borrow_mut().push(task);
        handle
    }
}

impl<T: Clone + 'static> TaskContext<T> {
    /// Payload of the current tick, if a tick has run.
    pub fn payload(&self) -> Option<T> {
        let shared = self.upgrade()?;
        let payload = shared.borrow().payload.clone();
        payload
    }
}

impl<T> TaskContext<T> {
    pub(crate) fn upgrade(&self) -> Option<Rc<RefCell<Shared<T>>>> {
        self.shared.upgrade()
    }
}

impl<T> Clone for TaskContext<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            shared: self.shared.clone(),
        }
    }
}

impl<T> fmt::Debug for TaskContext<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext").field("id", &self.id).finish()
    }
}
