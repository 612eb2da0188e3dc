//! Internal data structures.

pub(crate) mod slab;
