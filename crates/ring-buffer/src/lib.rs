//! Fixed-Capacity Ring Buffer
//!
//! Provides a pre-allocated, overwrite-oldest ring buffer used to keep
//! rolling histories (e.g. the last N guidance candidates) and answer
//! "how many times did X appear recently" queries.

mod buffer;

pub use buffer::{RingBuffer, DEFAULT_CAPACITY};
