//! Tasks: owned, move-only handles to a suspendable computation.
//!
//! A [`Task`] wraps the body of a computation before it is bound to a
//! scheduler. The body is a closure receiving a [`TaskContext`], and it is
//! not invoked until the task is first resumed: that is the moment the task
//! learns which scheduler owns it.
//!
//! # Creating tasks
//!
//! ```ignore
//! use frame_reactor::{FrameData, Task};
//!
//! // Fire-and-forget task.
//! let wait_two_frames: Task<FrameData> = Task::new(|cx| async move {
//!     cx.next_frame().await;
//!     cx.next_frame().await;
//!     Ok(())
//! });
//!
//! // Value task.
//! let square: Task<FrameData, u32> = Task::new(|_cx| async move { Ok(7 * 7) });
//! ```
//!
//! # How tasks run
//!
//! 1. [`FrameScheduler::push`] (or [`TaskContext::call`]) binds the task:
//!    its body moves into the scheduler's arena and it gets a [`TaskId`]
//! 2. The first resume calls the body with a [`TaskContext`] and polls the
//!    returned future once
//! 3. Each later resume polls the future again, until it returns
//! 4. A returned error is kept on the task until its single consumer (the
//!    tick, or the awaiting parent) collects it
//!
//! [`FrameScheduler::push`]: crate::FrameScheduler::push

use crate::error::TaskResult;
use crate::runtime::TaskContext;
use crate::utils::slab::Key;

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::rc::Rc;
use std::task::Waker;

/// Identifier of a task bound to a scheduler.
///
/// Ids are generational: once a task is released its id never resolves
/// again, even if the arena slot is reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskId(pub(crate) Key);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.0.index, self.0.generation)
    }
}

/// Lifecycle of a task.
///
/// `Created → Scheduled → {Suspended ⇄ Running} → {Completed | Failed}`.
/// `Released` marks a root task the driver unscheduled before it finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskState {
    /// Constructed, not bound to any scheduler yet.
    Created,
    /// Bound to a scheduler, body not started.
    Scheduled,
    /// Currently being polled.
    Running,
    /// Waiting for the next tick, a child task, or a wake.
    Suspended,
    /// Body returned `Ok`.
    Completed,
    /// Body returned `Err`.
    Failed,
    /// Released by the driver before finishing.
    Released,
}

impl TaskState {
    /// Whether the task can never run again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Released)
    }

    pub(crate) fn is_resumable(self) -> bool {
        matches!(self, Self::Scheduled | Self::Suspended)
    }
}

/// Type-erased body of a bound task, before its first resume.
pub(crate) type Start<T> = Box<dyn FnOnce(TaskContext<T>) -> LocalBoxFuture<'static, TaskResult>>;

type Body<T, R> = Box<dyn FnOnce(TaskContext<T>) -> LocalBoxFuture<'static, TaskResult<R>>>;

/// A suspendable computation advanced by a [`FrameScheduler`].
///
/// `T` is the frame payload type of the scheduler the task will run on, `R`
/// the value the task produces (`()` for fire-and-forget tasks). A task is
/// move-only; dropping it before it is bound drops the body unused.
///
/// [`FrameScheduler`]: crate::FrameScheduler
pub struct Task<T = crate::FrameData, R = ()> {
    body: Body<T, R>,
    status: Rc<Cell<TaskState>>,
}

impl<T: 'static, R: 'static> Task<T, R> {
    /// Creates a task from its body.
    ///
    /// The body runs lazily: it is called with the task's [`TaskContext`] the
    /// first time the task is resumed.
    pub fn new<F, Fut>(body: F) -> Self
    where
        F: FnOnce(TaskContext<T>) -> Fut + 'static,
        Fut: Future<Output = TaskResult<R>> + 'static,
    {
        Self {
            body: Box::new(move |cx| body(cx).boxed_local()),
            status: Rc::new(Cell::new(TaskState::Created)),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TaskState {
        self.status.get()
    }

    /// Erases the value type, routing a successful result into `slot`.
    pub(crate) fn into_start_with(self, slot: ResultSlot<R>) -> (Start<T>, Rc<Cell<TaskState>>) {
        let body = self.body;
        let start: Start<T> = Box::new(move |cx| {
            let future = body(cx);
            async move {
                let value = future.await?;
                slot.set(value);
                Ok(())
            }
            .boxed_local()
        });

        (start, self.status)
    }
}

impl<T: 'static> Task<T, ()> {
    pub(crate) fn into_start(self) -> (Start<T>, Rc<Cell<TaskState>>) {
        (self.body, self.status)
    }
}

impl<T, R> fmt::Debug for Task<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("state", &self.status.get())
            .finish_non_exhaustive()
    }
}

/// Driver-side view of a root task pushed into a scheduler.
///
/// Dropping the handle does not affect the task.
#[derive(Clone, Debug)]
pub struct TaskHandle {
    id: TaskId,
    status: Rc<Cell<TaskState>>,
}

impl TaskHandle {
    pub(crate) fn new(id: TaskId, status: Rc<Cell<TaskState>>) -> Self {
        Self { id, status }
    }

    /// Id of the task in its scheduler.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TaskState {
        self.status.get()
    }

    /// Whether the task completed, failed, or was released.
    pub fn is_finished(&self) -> bool {
        self.status.get().is_terminal()
    }

    pub(crate) fn status(&self) -> &Rc<Cell<TaskState>> {
        &self.status
    }
}

/// Single-assignment slot holding a value task's result.
pub(crate) struct ResultSlot<R>(Rc<RefCell<Option<R>>>);

impl<R> ResultSlot<R> {
    pub(crate) fn new() -> Self {
        Self(Rc::new(RefCell::new(None)))
    }

    pub(crate) fn set(&self, value: R) {
        *self.0.borrow_mut() = Some(value);
    }

    pub(crate) fn take(&self) -> Option<R> {
        self.0.borrow_mut().take()
    }
}

impl<R> Clone for ResultSlot<R> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

/// Stage of a bound task's body.
pub(crate) enum TaskBody<T> {
    /// Not resumed yet.
    Start(Start<T>),
    /// Started and suspended.
    Running(LocalBoxFuture<'static, TaskResult>),
}

/// Arena entry for a bound task.
pub(crate) struct TaskRecord<T> {
    status: Rc<Cell<TaskState>>,
    /// `None` while the body is being polled, and after it returned.
    pub(crate) body: Option<TaskBody<T>>,
    /// Parent to resume when this task finishes.
    pub(crate) awaiter: Option<TaskId>,
    /// Error returned by the body, kept until collected.
    pub(crate) error: Option<anyhow::Error>,
    pub(crate) waker: Waker,
    /// Whether the task was queued for resumption since its last resume.
    pub(crate) queued: bool,
}

impl<T> TaskRecord<T> {
    pub(crate) fn new(start: Start<T>, status: Rc<Cell<TaskState>>, waker: Waker) -> Self {
        status.set(TaskState::Scheduled);

        Self {
            status,
            body: Some(TaskBody::Start(start)),
            awaiter: None,
            error: None,
            waker,
            queued: false,
        }
    }

    pub(crate) fn state(&self) -> TaskState {
        self.status.get()
    }

    pub(crate) fn set_state(&self, state: TaskState) {
        self.status.set(state);
    }

    pub(crate) fn is_root(&self) -> bool {
        self.awaiter.is_none()
    }

    pub(crate) fn shares_status(&self, status: &Rc<Cell<TaskState>>) -> bool {
        Rc::ptr_eq(&self.status, status)
    }
}
