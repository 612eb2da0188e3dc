//! Fluent builder for FrameScheduler construction.
//!
//! Provides a builder pattern interface for creating and configuring
//! [`FrameScheduler`] instances.

use crate::runtime::FrameScheduler;

/// Initial capacity of the task arena and of each queue.
pub const DEFAULT_CAPACITY: usize = 64;

/// Default bound on nested inline child bootstraps.
pub const DEFAULT_MAX_SYNC_DEPTH: usize = 256;

/// Builder for constructing FrameScheduler instances with fluent API.
///
/// # Example
/// ```ignore
/// let scheduler: FrameScheduler = SchedulerBuilder::new()
///     .capacity(1024)
///     .max_sync_depth(64)
///     .build();
/// ```
#[derive(Clone, Debug)]
pub struct SchedulerBuilder {
    capacity: usize,
    max_sync_depth: usize,
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerBuilder {
    /// Creates a builder with the default configuration.
    pub fn new() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            max_sync_depth: DEFAULT_MAX_SYNC_DEPTH,
        }
    }

    /// Sets how many tasks the scheduler can hold before reallocating.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets how many child tasks may be started inline, nested inside each
    /// other, before further children are queued for bootstrap instead.
    ///
    /// Every inline level adds native stack frames. With `0`, no child is
    /// ever started inline.
    pub fn max_sync_depth(mut self, depth: usize) -> Self {
        self.max_sync_depth = depth;
        self
    }

    /// Consumes the builder and constructs the scheduler.
    pub fn build<T: 'static>(self) -> FrameScheduler<T> {
        tracing::trace!(
            capacity = self.capacity,
            max_sync_depth = self.max_sync_depth,
            "building frame scheduler"
        );
        FrameScheduler::with_config(self.capacity, self.max_sync_depth)
    }
}
