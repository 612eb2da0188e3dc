//! Error types for the scheduler and for task bodies.
//!
//! Task bodies fail with an opaque [`anyhow::Error`]; the scheduler never
//! inspects it, it only carries it to the single consumer that collects the
//! task. Misuse of the scheduler itself is reported through
//! [`SchedulerError`].

use crate::task::TaskId;

/// Result returned by a task body.
pub type TaskResult<R = ()> = anyhow::Result<R>;

/// Programming errors detected by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    /// The task was already bound to a scheduler.
    #[error("task is already bound to a scheduler")]
    AlreadyBound,

    /// A second awaiter tried to register on a task that already has one.
    #[error("task {child} is already awaited by task {existing}")]
    AwaiterConflict { child: TaskId, existing: TaskId },

    /// The id does not name a live task of this scheduler.
    #[error("task {0} is not registered with this scheduler")]
    UnknownTask(TaskId),

    /// A value task finished successfully without storing its value.
    #[error("task {0} completed without producing a value")]
    MissingResult(TaskId),

    /// The scheduler owning the calling task no longer exists.
    #[error("the scheduler owning this task has been dropped")]
    SchedulerGone,
}

/// A root task that failed during a tick.
#[derive(Debug)]
pub struct TaskFailure {
    /// Id of the failed root task.
    pub task: TaskId,
    /// Error returned by the task body.
    pub error: anyhow::Error,
}

/// Failures collected over one call to [`FrameScheduler::tick`].
///
/// Both passes of the tick always run to the end; every root task that
/// failed along the way is listed here in the order it failed.
///
/// [`FrameScheduler::tick`]: crate::FrameScheduler::tick
#[derive(Debug, thiserror::Error)]
#[error("{} task(s) failed during frame {frame}", .failures.len())]
pub struct TickError {
    /// Frame number of the tick that observed the failures.
    pub frame: u64,
    /// Failed root tasks, in failure order.
    pub failures: Vec<TaskFailure>,
}

impl TickError {
    /// Iterates over the captured task errors.
    pub fn errors(&self) -> impl Iterator<Item = &anyhow::Error> {
        self.failures.iter().map(|failure| &failure.error)
    }
}
