//! Worker thread implementation

use crate::core::{Result, ThreadError};
use crate::pool::entry::{run_guarded, Entry, EntryKind};
use crate::pool::thread_pool::Shared;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[cfg(feature = "tracing")]
use tracing::{debug, span, Level};

/// Pool-wide job statistics, updated by the workers
#[derive(Debug, Default)]
pub(crate) struct PoolStats {
    /// Jobs accepted by `submit` or `submit_recurring`
    jobs_submitted: AtomicU64,
    /// One-shot jobs that produced a value
    jobs_completed: AtomicU64,
    /// Executions (one-shot or recurring) that panicked
    jobs_panicked: AtomicU64,
    /// Completed executions of recurring jobs
    recurring_runs: AtomicU64,
    /// Recurring rotations removed after cancellation
    rotations_cancelled: AtomicU64,
    /// Total time spent executing jobs (microseconds)
    total_processing_time_us: AtomicU64,
}

impl PoolStats {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn increment_submitted(&self) {
        self.jobs_submitted.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_completed(&self) {
        self.jobs_completed.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_panicked(&self) {
        self.jobs_panicked.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_recurring_runs(&self) {
        self.recurring_runs.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_rotations_cancelled(&self) {
        self.rotations_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    /// Saturates at `u64::MAX` microseconds per execution
    fn add_processing_time(&self, elapsed: Duration) {
        let microseconds = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.total_processing_time_us
            .fetch_add(microseconds, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters
    pub(crate) fn snapshot(&self) -> PoolStatsSnapshot {
        PoolStatsSnapshot {
            jobs_submitted: self.jobs_submitted.load(Ordering::Relaxed),
            jobs_completed: self.jobs_completed.load(Ordering::Relaxed),
            jobs_panicked: self.jobs_panicked.load(Ordering::Relaxed),
            recurring_runs: self.recurring_runs.load(Ordering::Relaxed),
            rotations_cancelled: self.rotations_cancelled.load(Ordering::Relaxed),
            total_processing_time_us: self.total_processing_time_us.load(Ordering::Relaxed),
        }
    }
}

/// Serializable point-in-time copy of a pool's job statistics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStatsSnapshot {
    /// Jobs accepted by the pool
    pub jobs_submitted: u64,
    /// One-shot jobs that produced a value
    pub jobs_completed: u64,
    /// Executions that panicked
    pub jobs_panicked: u64,
    /// Completed executions of recurring jobs
    pub recurring_runs: u64,
    /// Recurring rotations removed after cancellation
    pub rotations_cancelled: u64,
    /// Total time spent executing jobs (microseconds)
    pub total_processing_time_us: u64,
}

impl PoolStatsSnapshot {
    /// Get average processing time per execution in microseconds
    pub fn average_processing_time_us(&self) -> f64 {
        let count = self.jobs_completed + self.jobs_panicked + self.recurring_runs;
        if count > 0 {
            self.total_processing_time_us as f64 / count as f64
        } else {
            0.0
        }
    }
}

/// One worker slot: a thread plus the flag that keeps it running
#[derive(Debug)]
pub(crate) struct Worker {
    index: usize,
    running: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Worker {
    /// Start a worker bound to slot `index`
    pub(crate) fn spawn(index: usize, name_prefix: &str, shared: Arc<Shared>) -> Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = Arc::clone(&running);

        let thread = thread::Builder::new()
            .name(format!("{}-{}", name_prefix, index))
            .spawn(move || {
                Self::run(index, &running_clone, &shared);
            })
            .map_err(|e| ThreadError::spawn_with_source(index, "thread spawn failed", e))?;

        Ok(Self {
            index,
            running,
            thread: Some(thread),
        })
    }

    /// Slot index
    pub(crate) fn index(&self) -> usize {
        self.index
    }

    /// Clear the running flag. The thread exits at its next check.
    pub(crate) fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Whether the calling thread is this worker's thread
    pub(crate) fn is_current_thread(&self) -> bool {
        self.thread
            .as_ref()
            .map(|t| t.thread().id() == thread::current().id())
            .unwrap_or(false)
    }

    /// Join the worker thread
    pub(crate) fn join(mut self) -> Result<()> {
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .map_err(|_| ThreadError::join(self.index, "Worker panicked"))?;
        }
        Ok(())
    }

    /// Main worker loop: fetch, execute, resolve or requeue, until stopped.
    fn run(index: usize, running: &AtomicBool, shared: &Shared) {
        #[cfg(feature = "tracing")]
        let worker_span = span!(Level::DEBUG, "worker", index = index);
        #[cfg(feature = "tracing")]
        let _guard = worker_span.enter();

        log::debug!("worker {} started", index);

        while let Some(entry) = shared.next_entry(running) {
            #[cfg(feature = "tracing")]
            crate::tracing::metrics::record_worker_busy(index);

            Self::process(index, entry, shared);

            #[cfg(feature = "tracing")]
            crate::tracing::metrics::record_worker_idle(index);
        }

        log::debug!("worker {} stopped", index);
        #[cfg(feature = "tracing")]
        debug!("worker stopped");
    }

    fn process(index: usize, entry: Entry, shared: &Shared) {
        if entry.is_recurring() && shared.consume_cancellation(entry.id) {
            shared.release_reservation();
            shared.stats.increment_rotations_cancelled();
            log::trace!("worker {}: recurring job {} left rotation", index, entry.id);
            #[cfg(feature = "tracing")]
            crate::tracing::metrics::record_rotation_removed(entry.id.as_u64());
            return;
        }

        #[cfg(feature = "tracing")]
        let job_span = span!(Level::DEBUG, "job_execution", job_id = entry.id.as_u64());
        #[cfg(feature = "tracing")]
        let _job_guard = job_span.enter();

        let id = entry.id;
        let start = Instant::now();

        let panicked = match entry.kind {
            EntryKind::OneShot(task) => {
                let panicked = task.run();
                if panicked.is_none() {
                    shared.stats.increment_completed();
                }
                panicked
            }
            EntryKind::Recurring(callable) => {
                let panicked = run_guarded(|| callable()).err();
                if panicked.is_none() {
                    shared.stats.increment_recurring_runs();
                }
                // A panicking recurring job keeps its place in rotation
                shared.requeue(Entry {
                    id,
                    kind: EntryKind::Recurring(callable),
                });
                panicked
            }
        };

        let elapsed = start.elapsed();
        shared.stats.add_processing_time(elapsed);

        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_completion(elapsed, panicked.is_none());

        if let Some(message) = panicked {
            shared.stats.increment_panicked();
            log::warn!("worker {}: job {} panicked: {}", index, id, message);
        }
    }
}
