//! Tick-driven scheduler that owns and advances tasks.
//!
//! The scheduler keeps every bound task in a generational arena and two
//! double buffers of ids: continuations to resume, and freshly bound tasks to
//! bootstrap. A driver (usually a game loop) calls [`FrameScheduler::tick`]
//! once per frame with that frame's payload.

use crate::builder::SchedulerBuilder;
use crate::error::{SchedulerError, TaskFailure, TickError};
use crate::runtime::queue::DoubleBuffer;
use crate::runtime::waker::{WakeInbox, make_waker};
use crate::runtime::TaskContext;
use crate::task::{Start, Task, TaskBody, TaskHandle, TaskId, TaskRecord, TaskState};
use crate::utils::slab::Slab;

use futures::task::noop_waker;

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Default frame payload: the time elapsed since the previous frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameData {
    pub delta_time: f32,
}

/// State shared between the scheduler and the contexts of its tasks.
pub(crate) struct Shared<T> {
    /// Number of ticks run so far.
    pub(crate) frame: u64,
    pub(crate) payload: Option<T>,
    pub(crate) tasks: Slab<TaskRecord<T>>,
    pub(crate) continuations: DoubleBuffer<TaskId>,
    pub(crate) bootstraps: DoubleBuffer<TaskId>,
    pub(crate) inbox: Arc<WakeInbox>,
    /// Current nesting of inline child bootstraps.
    pub(crate) depth: usize,
    pub(crate) max_sync_depth: usize,
}

impl<T: 'static> Shared<T> {
    pub(crate) fn new(capacity: usize, max_sync_depth: usize) -> Self {
        Self {
            frame: 0,
            payload: None,
            tasks: Slab::with_capacity(capacity),
            continuations: DoubleBuffer::with_capacity(capacity),
            bootstraps: DoubleBuffer::with_capacity(capacity),
            inbox: Arc::new(WakeInbox::default()),
            depth: 0,
            max_sync_depth,
        }
    }

    /// Binds a task body to this scheduler.
    ///
    /// A task can be bound once in its whole life: `status` must still read
    /// [`TaskState::Created`].
    pub(crate) fn bind(
        &mut self,
        start: Start<T>,
        status: Rc<Cell<TaskState>>,
    ) -> Result<TaskId, SchedulerError> {
        if status.get() != TaskState::Created {
            return Err(SchedulerError::AlreadyBound);
        }

        let id = TaskId(self.tasks.insert(TaskRecord::new(start, status, noop_waker())));
        if let Some(record) = self.tasks.get_mut(id.0) {
            record.waker = make_waker(id, self.inbox.clone());
        }

        Ok(id)
    }

    /// Registers `parent` as the single awaiter of `child`.
    pub(crate) fn register_awaiter(
        &mut self,
        child: TaskId,
        parent: TaskId,
    ) -> Result<(), SchedulerError> {
        let record = self
            .tasks
            .get_mut(child.0)
            .ok_or(SchedulerError::UnknownTask(child))?;

        if let Some(existing) = record.awaiter {
            return Err(SchedulerError::AwaiterConflict { child, existing });
        }

        record.awaiter = Some(parent);
        Ok(())
    }

    /// Binds a root task and queues it for bootstrap on the next pass.
    pub(crate) fn push(&mut self, task: Task<T>) -> Result<TaskHandle, SchedulerError> {
        let (start, status) = task.into_start();
        let id = self.bind(start, status.clone())?;
        self.bootstraps.push(id);

        tracing::trace!(task = %id, frame = self.frame, "task pushed");
        Ok(TaskHandle::new(id, status))
    }

    /// Queues `id` for resumption on the next tick, once.
    pub(crate) fn enqueue_continuation(&mut self, id: TaskId) {
        if let Some(record) = self.tasks.get_mut(id.0)
            && !record.queued
        {
            record.queued = true;
            self.continuations.push(id);
        }
    }

    fn collect_wakes(&mut self) {
        for id in self.inbox.drain() {
            let suspended = self
                .tasks
                .get(id.0)
                .is_some_and(|record| record.state() == TaskState::Suspended);

            if suspended {
                self.enqueue_continuation(id);
            }
        }
    }

    pub(crate) fn state(&self, id: TaskId) -> Option<TaskState> {
        self.tasks.get(id.0).map(TaskRecord::state)
    }
}

/// Outcome of a single resume.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Step {
    /// The body is pending again.
    Suspended,
    /// The body returned; the outcome is stored on the record.
    Finished,
    /// Nothing to resume: the task is gone, running, or terminal.
    Skipped,
}

/// Resumes the body of `id` exactly one step.
///
/// The first resume calls the start closure with a fresh [`TaskContext`].
/// No borrow of `shared` is held while the body runs, so the body may freely
/// enqueue continuations, bind children, or push new tasks.
pub(crate) fn resume_once<T: 'static>(shared: &Rc<RefCell<Shared<T>>>, id: TaskId) -> Step {
    let (body, waker) = {
        let mut inner = shared.borrow_mut();
        let Some(record) = inner.tasks.get_mut(id.0) else {
            return Step::Skipped;
        };
        if !record.state().is_resumable() {
            return Step::Skipped;
        }
        let Some(body) = record.body.take() else {
            return Step::Skipped;
        };

        // Anything the body queues from here on lands in the back buffer,
        // even if a stale entry for it is still ahead in the current pass.
        record.queued = false;
        record.set_state(TaskState::Running);
        (body, record.waker.clone())
    };

    let mut future = match body {
        TaskBody::Start(start) => {
            tracing::trace!(task = %id, "bootstrapping task");
            start(TaskContext::new(id, Rc::downgrade(shared)))
        }
        TaskBody::Running(future) => future,
    };

    let mut cx = Context::from_waker(&waker);
    match future.as_mut().poll(&mut cx) {
        Poll::Pending => {
            let mut future = Some(future);
            {
                let mut inner = shared.borrow_mut();
                if let Some(record) = inner.tasks.get_mut(id.0) {
                    record.body = future.take().map(TaskBody::Running);
                    record.set_state(TaskState::Suspended);
                }
            }
            // Only still set if the record vanished while the body ran.
            drop(future);
            Step::Suspended
        }
        Poll::Ready(result) => {
            drop(future);

            let mut inner = shared.borrow_mut();
            if let Some(record) = inner.tasks.get_mut(id.0) {
                match result {
                    Ok(()) => record.set_state(TaskState::Completed),
                    Err(error) => {
                        record.error = Some(error);
                        record.set_state(TaskState::Failed);
                    }
                }
            }

            tracing::trace!(task = %id, "task finished");
            Step::Finished
        }
    }
}

/// Resumes `id` and walks the chain of awaiters its completion unblocks.
///
/// Completion firing is iterative: a finished child resumes its suspended
/// parent in this loop, not in a nested call.
pub(crate) fn drive<T: 'static>(
    shared: &Rc<RefCell<Shared<T>>>,
    id: TaskId,
    failures: &mut Vec<TaskFailure>,
) {
    let mut current = id;

    while resume_once(shared, current) == Step::Finished {
        match settle(shared, current, failures) {
            Some(parent) => current = parent,
            None => break,
        }
    }
}

/// Handles a finished task: a root is released and its error reported, a
/// child is left for its awaiter to collect.
///
/// Returns the parent to resume, if it is waiting.
fn settle<T: 'static>(
    shared: &Rc<RefCell<Shared<T>>>,
    id: TaskId,
    failures: &mut Vec<TaskFailure>,
) -> Option<TaskId> {
    let released = {
        let mut inner = shared.borrow_mut();
        let record = inner.tasks.get(id.0)?;

        if let Some(parent) = record.awaiter {
            return (inner.state(parent) == Some(TaskState::Suspended)).then_some(parent);
        }

        inner.tasks.remove(id.0)
    };

    if let Some(mut record) = released
        && let Some(error) = record.error.take()
    {
        tracing::debug!(task = %id, %error, "root task failed");
        failures.push(TaskFailure { task: id, error });
    }

    None
}

/// A cooperative, single-threaded scheduler advanced one frame at a time.
///
/// # Example
/// ```ignore
/// use frame_reactor::{FrameData, FrameScheduler, Task};
///
/// let mut scheduler = FrameScheduler::new();
/// scheduler.push(Task::new(|cx| async move {
///     let frame: FrameData = cx.next_frame().await;
///     println!("dt = {}", frame.delta_time);
///     Ok(())
/// }))?;
///
/// loop {
///     scheduler.tick(FrameData { delta_time: 1.0 / 60.0 })?;
/// }
/// ```
pub struct FrameScheduler<T = FrameData> {
    shared: Rc<RefCell<Shared<T>>>,
}

impl<T: 'static> FrameScheduler<T> {
    /// Creates a scheduler with the default configuration.
    pub fn new() -> Self {
        SchedulerBuilder::new().build()
    }

    pub(crate) fn with_config(capacity: usize, max_sync_depth: usize) -> Self {
        Self {
            shared: Rc::new(RefCell::new(Shared::new(capacity, max_sync_depth))),
        }
    }

    /// Binds a root task to this scheduler and queues its bootstrap.
    ///
    /// Nothing runs until the next [`Self::tick`].
    pub fn push(&mut self, task: Task<T>) -> Result<TaskHandle, SchedulerError> {
        self.shared.borrow_mut().push(task)
    }

    /// Advances one frame.
    ///
    /// Stores `payload` as the current frame snapshot, resumes every
    /// continuation queued before this call (FIFO), then bootstraps every task
    /// pushed before the bootstrap pass starts (FIFO). Tasks pushed while
    /// continuations are resumed are therefore started in this same tick.
    ///
    /// Root tasks that fail are released and returned together in a
    /// [`TickError`]; both passes always run to the end.
    pub fn tick(&mut self, payload: T) -> Result<(), TickError> {
        let frame = {
            let mut inner = self.shared.borrow_mut();
            inner.frame += 1;
            inner.payload = Some(payload);
            inner.collect_wakes();
            inner.frame
        };

        let span = tracing::trace_span!("tick", frame);
        let _enter = span.enter();

        let mut failures = Vec::new();
        self.run_pass(|inner| &mut inner.continuations, &mut failures);
        self.run_pass(|inner| &mut inner.bootstraps, &mut failures);

        if failures.is_empty() {
            Ok(())
        } else {
            Err(TickError { frame, failures })
        }
    }

    fn run_pass(
        &mut self,
        buffer: fn(&mut Shared<T>) -> &mut DoubleBuffer<TaskId>,
        failures: &mut Vec<TaskFailure>,
    ) {
        let pass = {
            let mut inner = self.shared.borrow_mut();
            let queue = buffer(&mut inner);
            queue.swap();
            queue.take_front()
        };

        for &id in &pass {
            drive(&self.shared, id, failures);
        }

        buffer(&mut self.shared.borrow_mut()).restore_front(pass);
    }

    /// Releases a root task before it finishes.
    ///
    /// Drops the task's body, and with it any child it was waiting on.
    /// Returns `false` if the task already finished or belongs to another
    /// scheduler.
    pub fn unschedule(&mut self, handle: &TaskHandle) -> bool {
        let released = {
            let mut inner = self.shared.borrow_mut();
            let owned = inner.tasks.get(handle.id().0).is_some_and(|record| {
                record.is_root() && record.shares_status(handle.status())
            });

            if owned { inner.tasks.remove(handle.id().0) } else { None }
        };

        match released {
            Some(record) => {
                record.set_state(TaskState::Released);
                drop(record);
                tracing::debug!(task = %handle.id(), "task unscheduled");
                true
            }
            None => false,
        }
    }

    /// Number of ticks run so far.
    pub fn frame(&self) -> u64 {
        self.shared.borrow().frame
    }

    /// Number of tasks (roots and children) currently held by the scheduler.
    pub fn live_tasks(&self) -> usize {
        self.shared.borrow().tasks.len()
    }

    /// Continuations waiting for the next tick.
    pub fn pending_continuations(&self) -> usize {
        self.shared.borrow().continuations.back_len()
    }

    /// Tasks waiting for their first resume.
    pub fn pending_bootstraps(&self) -> usize {
        self.shared.borrow().bootstraps.back_len()
    }

    /// Whether the scheduler holds no task at all.
    pub fn is_idle(&self) -> bool {
        self.live_tasks() == 0
    }
}

impl FrameScheduler {
    /// Returns a builder to configure a scheduler.
    ///
    /// Use [`SchedulerBuilder::new`] for a payload other than [`FrameData`].
    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::new()
    }
}

impl<T: 'static> Default for FrameScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for FrameScheduler<T> {
    fn drop(&mut self) {
        // Records are dropped outside the borrow: dropping a body can
        // release the child it was waiting on.
        let records = match self.shared.try_borrow_mut() {
            Ok(mut inner) => inner.tasks.drain(),
            Err(_) => return,
        };

        if !records.is_empty() {
            tracing::debug!(live = records.len(), "dropping scheduler with live tasks");
        }

        for record in records {
            record.set_state(TaskState::Released);
        }
    }
}
