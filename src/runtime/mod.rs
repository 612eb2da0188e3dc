//! Runtime subsystem modules.

mod awaiter;
pub(crate) mod context;
pub(crate) mod core;
mod next_frame;
pub(crate) mod queue;
pub(crate) mod waker;

pub use awaiter::TaskAwaiter;
pub use context::TaskContext;
pub use self::core::{FrameData, FrameScheduler};
pub use next_frame::NextFrame;
