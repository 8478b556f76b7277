//! Queue containers backing the job pool.
//!
//! The pool keeps its pending entries in a [`BoundedQueue`]: a plain
//! fixed-capacity FIFO guarded by the pool's queue mutex. It is not
//! synchronized itself; locking and wakeups belong to [`ThreadPool`].
//!
//! [`ThreadPool`]: crate::pool::ThreadPool

mod bounded;

pub use bounded::BoundedQueue;

/// Default number of entries a pool queue can hold
pub const DEFAULT_QUEUE_CAPACITY: usize = 512;
