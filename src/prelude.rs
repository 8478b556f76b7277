//! Convenient re-exports for common types

pub use crate::core::{Job, JobId, JobResult, Result, ThreadError};
pub use crate::pool::{PoolStatsSnapshot, ThreadPool, ThreadPoolConfig};
