//! # Rust Job Pool
//!
//! A resizable worker thread pool that runs one-shot jobs with typed,
//! blocking results and recurring jobs that stay in rotation until cancelled.
//!
//! ## Features
//!
//! - **Typed results**: [`submit`](ThreadPool::submit) returns a [`JobResult<T>`]
//!   that blocks until the job's value is ready
//! - **Recurring jobs**: re-queued after every run, removed by identifier
//! - **Dynamic sizing**: grow or shrink the worker set at any time
//! - **Backpressure**: a bounded FIFO queue; a full queue is reported as an error
//! - **Panic isolation**: a panicking job is reported through its result and
//!   never takes down its worker
//!
//! ## Quick Start
//!
//! ```rust
//! use rust_job_pool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let pool = ThreadPool::new(4)?;
//!
//! let result = pool.submit(Job::new(|| 100))?;
//! assert_eq!(result.get()?, 100);
//!
//! pool.resize(2)?;
//! assert_eq!(pool.thread_count(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Recurring Jobs
//!
//! ```rust
//! use rust_job_pool::prelude::*;
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<()> {
//! let pool = ThreadPool::new(2)?;
//! let heartbeats = Arc::new(AtomicU64::new(0));
//!
//! let counter = Arc::clone(&heartbeats);
//! let id = pool.execute_recurring(move || {
//!     counter.fetch_add(1, Ordering::Relaxed);
//!     std::thread::sleep(std::time::Duration::from_millis(5));
//! })?;
//!
//! std::thread::sleep(std::time::Duration::from_millis(50));
//! pool.cancel(id);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use rust_job_pool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let config = ThreadPoolConfig::new(8)
//!     .with_queue_capacity(1000)
//!     .with_thread_name_prefix("ingest");
//!
//! let pool = ThreadPool::with_config(config)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod pool;
pub mod prelude;
pub mod queue;
pub mod tracing;

pub use core::{Job, JobFn, JobId, JobResult, Result, ThreadError};
pub use pool::{PoolStatsSnapshot, ThreadPool, ThreadPoolConfig};
pub use queue::BoundedQueue;
