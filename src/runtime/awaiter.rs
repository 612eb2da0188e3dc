//! Awaitable that runs a child task to completion.
//!
//! The first poll binds the child to the parent's scheduler, links the parent
//! as its awaiter, and resumes the child once on the parent's stack. A child
//! that finishes in that single step hands its result straight back, so a
//! chain of calls that never waits for a frame runs within one resume. A
//! child that suspends leaves the parent suspended too; the scheduler resumes
//! the parent when the child finishes.
//!
//! Inline bootstraps nest on the native stack. Past the scheduler's
//! `max_sync_depth`, the child is queued for bootstrap instead.

use crate::error::{SchedulerError, TaskResult};
use crate::runtime::TaskContext;
use crate::runtime::core::{Shared, Step, resume_once};
use crate::task::{ResultSlot, Task, TaskId};

use std::cell::RefCell;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

enum Stage<T, R> {
    /// Child not bound yet.
    Start(Task<T, R>),
    /// Child bound and running.
    Waiting { child: TaskId, slot: ResultSlot<R> },
    /// Outcome handed to the parent.
    Done,
}

/// Future returned by [`TaskContext::call`].
///
/// Resolves to the child's value, or to its error. Dropping the awaiter
/// before it resolves releases the child.
#[must_use = "futures do nothing unless awaited"]
pub struct TaskAwaiter<T, R> {
    parent: TaskContext<T>,
    stage: Stage<T, R>,
}

impl<T: 'static, R: 'static> TaskAwaiter<T, R> {
    pub(crate) fn new(parent: TaskContext<T>, task: Task<T, R>) -> Self {
        Self {
            parent,
            stage: Stage::Start(task),
        }
    }

    fn start(&mut self, task: Task<T, R>) -> Poll<TaskResult<R>> {
        let Some(shared) = self.parent.upgrade() else {
            return Poll::Ready(Err(SchedulerError::SchedulerGone.into()));
        };

        let slot = ResultSlot::new();
        let (start, status) = task.into_start_with(slot.clone());

        let linked = {
            let mut inner = shared.borrow_mut();
            match inner.bind(start, status) {
                Ok(child) => match inner.register_awaiter(child, self.parent.id()) {
                    Ok(()) => {
                        let deferred = inner.depth >= inner.max_sync_depth;
                        if deferred {
                            inner.bootstraps.push(child);
                        }
                        Ok((child, deferred))
                    }
                    Err(error) => Err((error, inner.tasks.remove(child.0))),
                },
                Err(error) => Err((error, None)),
            }
        };

        let (child, deferred) = match linked {
            Ok(linked) => linked,
            Err((error, released)) => {
                drop(released);
                return Poll::Ready(Err(error.into()));
            }
        };

        self.stage = Stage::Waiting { child, slot };

        if deferred {
            tracing::debug!(
                parent = %self.parent.id(),
                %child,
                "inline depth limit reached, deferring child bootstrap"
            );
            return Poll::Pending;
        }

        shared.borrow_mut().depth += 1;
        let step = resume_once(&shared, child);
        shared.borrow_mut().depth -= 1;

        match step {
            Step::Suspended => Poll::Pending,
            Step::Finished | Step::Skipped => self.finish(&shared),
        }
    }

    /// Releases the finished child and hands over its outcome.
    fn finish(&mut self, shared: &Rc<RefCell<Shared<T>>>) -> Poll<TaskResult<R>> {
        let Stage::Waiting { child, slot } = mem::replace(&mut self.stage, Stage::Done) else {
            return Poll::Pending;
        };

        let record = shared.borrow_mut().tasks.remove(child.0);
        let Some(mut record) = record else {
            return Poll::Ready(Err(SchedulerError::UnknownTask(child).into()));
        };

        if let Some(error) = record.error.take() {
            tracing::trace!(parent = %self.parent.id(), %child, "child task failed");
            return Poll::Ready(Err(error));
        }

        Poll::Ready(
            slot.take()
                .ok_or_else(|| SchedulerError::MissingResult(child).into()),
        )
    }
}

impl<T: 'static, R: 'static> Future for TaskAwaiter<T, R> {
    type Output = TaskResult<R>;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        match mem::replace(&mut this.stage, Stage::Done) {
            Stage::Start(task) => this.start(task),
            Stage::Waiting { child, slot } => {
                this.stage = Stage::Waiting { child, slot };

                let Some(shared) = this.parent.upgrade() else {
                    return Poll::Ready(Err(SchedulerError::SchedulerGone.into()));
                };
                let finished = shared
                    .borrow()
                    .state(child)
                    .is_none_or(|state| state.is_terminal());

                if finished {
                    this.finish(&shared)
                } else {
                    Poll::Pending
                }
            }
            Stage::Done => panic!("`TaskAwaiter` polled after completion"),
        }
    }
}

impl<T, R> Drop for TaskAwaiter<T, R> {
    fn drop(&mut self) {
        let Stage::Waiting { child, .. } = &self.stage else {
            return;
        };
        let Some(shared) = self.parent.upgrade() else {
            return;
        };

        // Dropped outside the borrow: the child's body may hold awaiters too.
        let released = match shared.try_borrow_mut() {
            Ok(mut inner) => inner.tasks.remove(child.0),
            Err(_) => None,
        };
        drop(released);
    }
}
