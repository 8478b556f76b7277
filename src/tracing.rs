//! Tracing integration for observability.
//!
//! With the `tracing` feature enabled, workers run inside a `worker` span,
//! every execution inside a `job_execution` span, and the pool emits the
//! metric events below. Without the feature only the `log` records remain.
//!
//! # Example
//!
//! ```rust,ignore
//! use rust_job_pool::prelude::*;
//! use tracing_subscriber::{fmt, prelude::*, EnvFilter};
//!
//! tracing_subscriber::registry()
//!     .with(fmt::layer())
//!     .with(EnvFilter::from_default_env()
//!         .add_directive("rust_job_pool=trace".parse().unwrap()))
//!     .init();
//!
//! let pool = ThreadPool::new(4)?;
//! let id = pool.execute_recurring(|| poll_sensors())?;
//! ```

/// Metrics recording functions for observability.
///
/// These functions emit tracing events that can be consumed by
/// metrics collection systems like Prometheus via tracing-opentelemetry.
#[cfg(feature = "tracing")]
pub mod metrics {
    use std::time::Duration;

    /// Records a job submission event.
    #[inline]
    pub fn record_submission(queue_depth: usize) {
        tracing::trace!(
            counter.jobs_submitted = 1,
            gauge.queue_depth = queue_depth as i64,
            "job submitted"
        );
    }

    /// Records the end of one execution with timing.
    ///
    /// `success` is false when the job panicked.
    #[inline]
    pub fn record_completion(duration: Duration, success: bool) {
        let duration_ms = duration.as_millis() as u64;
        if success {
            tracing::trace!(
                counter.jobs_completed = 1,
                histogram.job_duration_ms = duration_ms,
                "job completed successfully"
            );
        } else {
            tracing::trace!(
                counter.jobs_panicked = 1,
                histogram.job_duration_ms = duration_ms,
                "job panicked"
            );
        }
    }

    /// Records a recurring job leaving rotation after cancellation.
    #[inline]
    pub fn record_rotation_removed(job_id: u64) {
        tracing::debug!(
            counter.rotations_cancelled = 1,
            job_id = job_id,
            "recurring job removed"
        );
    }

    /// Records worker becoming busy.
    #[inline]
    pub fn record_worker_busy(worker_id: usize) {
        tracing::trace!(
            gauge.workers_busy = 1,
            worker_id = worker_id,
            "worker busy"
        );
    }

    /// Records worker becoming idle.
    #[inline]
    pub fn record_worker_idle(worker_id: usize) {
        tracing::trace!(
            gauge.workers_busy = -1i64,
            worker_id = worker_id,
            "worker idle"
        );
    }

    /// Records a change in worker count.
    #[inline]
    pub fn record_resize(from: usize, to: usize) {
        tracing::info!(
            gauge.workers = to as i64,
            previous = from,
            "thread pool resized"
        );
    }

    /// Records pool startup.
    #[inline]
    pub fn record_pool_start(num_workers: usize, queue_capacity: usize) {
        tracing::info!(
            workers = num_workers,
            queue_capacity = queue_capacity,
            "thread pool started"
        );
    }

    /// Records pool shutdown.
    #[inline]
    pub fn record_pool_shutdown(jobs_completed: u64, jobs_panicked: u64) {
        tracing::info!(
            jobs_completed = jobs_completed,
            jobs_panicked = jobs_panicked,
            "thread pool shutdown complete"
        );
    }

}
