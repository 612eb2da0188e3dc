//! Swap-based double buffer used for the scheduler's per-tick queues.
//!
//! Items are always appended to the back buffer. At the start of a pass the
//! roles are swapped and the front buffer is walked in insertion order.
//! Anything appended while the pass is running lands in the (new) back buffer
//! and is only visited after the next swap.

use std::mem;

/// A pair of FIFO vectors with swappable front/back roles.
pub(crate) struct DoubleBuffer<Item> {
    buffers: [Vec<Item>; 2],
    front: usize,
}

impl<Item> DoubleBuffer<Item> {
    /// Creates a double buffer whose two halves can hold `capacity` items
    /// before reallocating.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            buffers: [Vec::with_capacity(capacity), Vec::with_capacity(capacity)],
            front: 0,
        }
    }

    /// Appends an item to the back buffer.
    pub(crate) fn push(&mut self, item: Item) {
        self.buffers[1 - self.front].push(item);
    }

    /// Swaps the front and back roles in O(1).
    pub(crate) fn swap(&mut self) {
        self.front = 1 - self.front;
    }

    /// Moves the front buffer out for a full pass.
    ///
    /// The caller hands the allocation back with [`Self::restore_front`] once
    /// the pass is over.
    pub(crate) fn take_front(&mut self) -> Vec<Item> {
        mem::take(&mut self.buffers[self.front])
    }

    /// Clears a drained front buffer and puts its allocation back in place.
    pub(crate) fn restore_front(&mut self, mut drained: Vec<Item>) {
        drained.clear();
        let front = &mut self.buffers[self.front];

        // Keep whichever allocation is larger.
        if front.capacity() < drained.capacity() && front.is_empty() {
            *front = drained;
        }
    }

    #[cfg(test)]
    pub(crate) fn front_len(&self) -> usize {
        self.buffers[self.front].len()
    }

    pub(crate) fn back_len(&self) -> usize {
        self.buffers[1 - self.front].len()
    }
}
