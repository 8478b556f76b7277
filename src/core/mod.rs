//! Core types for the job pool

pub mod error;
pub mod job;
pub mod result;

pub use error::{Result, ThreadError};
pub use job::{Job, JobFn, JobId};
pub use result::JobResult;
