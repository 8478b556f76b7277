//! Error types for the job pool

use crate::core::job::JobId;

/// Result type for job pool operations
pub type Result<T> = std::result::Result<T, ThreadError>;

/// Errors that can occur in the job pool
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ThreadError {
    /// Queue is full with capacity details
    #[error("Job queue is full: {current}/{max} jobs queued")]
    QueueFull {
        /// Current queue size (including reserved recurring slots)
        current: usize,
        /// Maximum queue size
        max: usize,
    },

    /// Submitted job carries no callable
    #[error("Cannot submit an empty job")]
    EmptyJob,

    /// Typed retrieval on a result that is not bound to any job
    #[error("Job result is not bound to a job")]
    Unbound,

    /// Job panicked on its worker thread
    #[error("Job {job_id} panicked: {message}")]
    JobPanicked {
        /// ID of the job that panicked
        job_id: JobId,
        /// Panic message
        message: String,
    },

    /// Job was dropped from the queue without being run
    #[error("Job {job_id} was abandoned before it could run")]
    Abandoned {
        /// ID of the abandoned job
        job_id: JobId,
    },

    /// Failed to spawn a worker thread with details
    #[error("Failed to spawn worker thread #{thread_id}: {message}")]
    SpawnError {
        /// Slot index of the thread that failed to spawn
        thread_id: usize,
        /// Error message
        message: String,
        /// Source IO error
        #[source]
        source: Option<std::io::Error>,
    },

    /// Failed to join a worker thread
    #[error("Failed to join worker thread #{thread_id}: {message}")]
    JoinError {
        /// Slot index of the thread that failed to join
        thread_id: usize,
        /// Error message
        message: String,
    },

    /// Invalid configuration with parameter
    #[error("Invalid configuration for '{parameter}': {message}")]
    InvalidConfig {
        /// Configuration parameter name
        parameter: String,
        /// Error message
        message: String,
    },
}

impl ThreadError {
    /// Create a queue full error
    pub fn queue_full(current: usize, max: usize) -> Self {
        ThreadError::QueueFull { current, max }
    }

    /// Create a job panicked error
    pub fn job_panicked(job_id: JobId, message: impl Into<String>) -> Self {
        ThreadError::JobPanicked {
            job_id,
            message: message.into(),
        }
    }

    /// Create an abandoned error
    pub fn abandoned(job_id: JobId) -> Self {
        ThreadError::Abandoned { job_id }
    }

    /// Create a spawn error with source
    pub fn spawn_with_source(
        thread_id: usize,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        ThreadError::SpawnError {
            thread_id,
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a join error
    pub fn join(thread_id: usize, message: impl Into<String>) -> Self {
        ThreadError::JoinError {
            thread_id,
            message: message.into(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        ThreadError::InvalidConfig {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error reports a full queue
    pub fn is_queue_full(&self) -> bool {
        matches!(self, ThreadError::QueueFull { .. })
    }
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
