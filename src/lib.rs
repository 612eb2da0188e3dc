//! Cooperative, tick-driven task executor.
//!
//! This crate provides a minimal single-threaded async runtime in which tasks
//! are advanced one logical frame at a time by an external driver, typically
//! a game loop. A task can wait for the next tick, call other tasks and await
//! their value, and fail with an error that propagates to whoever awaits it.
//!
//! # Architecture
//!
//! - **FrameScheduler**: Owns every task and advances them on each `tick`
//! - **Task**: Move-only handle to a suspendable body, optionally producing a value
//! - **TaskContext**: Per-task scheduler access injected into the body on first resume
//! - **NextFrame**: Awaitable that suspends until the next tick and yields its payload
//! - **TaskAwaiter**: Awaitable that runs a child task, completing inline when possible
//! - **SchedulerBuilder**: Fluent builder for scheduler configuration
//!
//! # Example
//!
//! ```ignore
//! use frame_reactor::{FrameData, FrameScheduler, Task};
//!
//! fn add(a: u32, b: u32) -> Task<FrameData, u32> {
//!     Task::new(move |_cx| async move { Ok(a + b) })
//! }
//!
//! let mut scheduler = FrameScheduler::new();
//! let handle = scheduler.push(Task::new(|cx| async move {
//!     let sum = cx.call(add(1, 2)).await?;   // completes inline
//!     let frame = cx.next_frame().await;      // waits for the next tick
//!     println!("{sum} after {}s", frame.delta_time);
//!     Ok(())
//! }))?;
//!
//! scheduler.tick(FrameData { delta_time: 0.016 })?;
//! scheduler.tick(FrameData { delta_time: 0.016 })?;
//! assert!(handle.is_finished());
//! ```

mod builder;
mod error;
mod runtime;
mod task;
mod utils;

pub use builder::{DEFAULT_CAPACITY, DEFAULT_MAX_SYNC_DEPTH, SchedulerBuilder};
pub use error::{SchedulerError, TaskFailure, TaskResult, TickError};
pub use runtime::{FrameData, FrameScheduler, NextFrame, TaskAwaiter, TaskContext};
pub use task::{Task, TaskHandle, TaskId, TaskState};
