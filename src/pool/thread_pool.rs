//! Thread pool implementation

use crate::core::{Job, JobId, JobResult, Result, ThreadError};
use crate::pool::entry::Entry;
use crate::pool::worker::{PoolStats, PoolStatsSnapshot, Worker};
use crate::queue::{BoundedQueue, DEFAULT_QUEUE_CAPACITY};
use parking_lot::{Condvar, Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Configuration for thread pool
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadPoolConfig {
    /// Number of worker threads started with the pool (0 is allowed)
    pub num_threads: usize,
    /// Maximum number of queued entries
    pub queue_capacity: usize,
    /// Thread name prefix
    pub thread_name_prefix: String,
}

impl Default for ThreadPoolConfig {
    fn default() -> Self {
        Self {
            num_threads: num_cpus::get(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            thread_name_prefix: "pool-worker".to_string(),
        }
    }
}

impl ThreadPoolConfig {
    /// Create a new configuration with specified number of threads
    #[must_use]
    pub fn new(num_threads: usize) -> Self {
        Self {
            num_threads,
            ..Default::default()
        }
    }

    /// Set maximum queue size
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ThreadError::invalid_config("json", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(ThreadError::invalid_config(
                "queue_capacity",
                "Queue capacity must be greater than 0",
            ));
        }
        if self.thread_name_prefix.is_empty() {
            return Err(ThreadError::invalid_config(
                "thread_name_prefix",
                "Thread name prefix must not be empty",
            ));
        }
        Ok(())
    }
}

/// Pending entries plus the slots held by recurring jobs that are executing.
///
/// `entries.len() + reserved <= capacity` always holds, so a recurring
/// job can always go back into the queue after it runs.
#[derive(Debug)]
pub(crate) struct JobQueue {
    entries: BoundedQueue<Entry>,
    reserved: usize,
}

impl JobQueue {
    fn new(capacity: usize) -> Self {
        Self {
            entries: BoundedQueue::new(capacity),
            reserved: 0,
        }
    }

    fn occupied(&self) -> usize {
        self.entries.len() + self.reserved
    }

    fn try_push(&mut self, entry: Entry) -> Result<()> {
        let capacity = self.entries.capacity();
        if self.occupied() >= capacity {
            return Err(ThreadError::queue_full(self.occupied(), capacity));
        }
        self.entries
            .push_back(entry)
            .map_err(|_| ThreadError::queue_full(self.occupied(), capacity))
    }

    fn pop(&mut self) -> Option<Entry> {
        let entry = self.entries.pop_front()?;
        if entry.is_recurring() {
            self.reserved += 1;
        }
        Some(entry)
    }
}

/// Recurring identifiers in rotation and those awaiting removal
#[derive(Debug, Default)]
pub(crate) struct Rotation {
    live: HashSet<JobId>,
    pending_removal: HashSet<JobId>,
}

/// State shared by the pool handle and every worker thread
pub(crate) struct Shared {
    queue: Mutex<JobQueue>,
    available: Condvar,
    rotation: Mutex<Rotation>,
    next_id: AtomicU64,
    pub(crate) stats: PoolStats,
}

impl Shared {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(JobQueue::new(capacity)),
            available: Condvar::new(),
            rotation: Mutex::new(Rotation::default()),
            next_id: AtomicU64::new(1),
            stats: PoolStats::new(),
        }
    }

    fn next_id(&self) -> JobId {
        JobId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Append an entry and wake one idle worker
    fn enqueue(&self, entry: Entry) -> Result<()> {
        let depth = {
            let mut queue = self.queue.lock();
            queue.try_push(entry)?;
            queue.entries.len()
        };
        self.available.notify_one();

        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_submission(depth);
        #[cfg(not(feature = "tracing"))]
        let _ = depth;
        Ok(())
    }

    /// Block until an entry is available or `running` is cleared.
    ///
    /// Returns `None` once the worker should exit.
    pub(crate) fn next_entry(&self, running: &AtomicBool) -> Option<Entry> {
        let mut queue = self.queue.lock();
        loop {
            if !running.load(Ordering::Acquire) {
                // This worker may have swallowed a wakeup meant for queued work
                if !queue.entries.is_empty() {
                    self.available.notify_one();
                }
                return None;
            }
            if let Some(entry) = queue.pop() {
                return Some(entry);
            }
            self.available.wait(&mut queue);
        }
    }

    /// Put an executed recurring entry back at the tail
    pub(crate) fn requeue(&self, entry: Entry) {
        let id = entry.id;
        let pushed = {
            let mut queue = self.queue.lock();
            queue.reserved -= 1;
            queue.entries.push_back(entry).is_ok()
        };
        if pushed {
            self.available.notify_one();
        } else {
            log::error!("recurring job {} could not be requeued", id);
        }
    }

    /// Free the slot held by a recurring entry that left rotation
    pub(crate) fn release_reservation(&self) {
        self.queue.lock().reserved -= 1;
    }

    /// Consume a pending removal for `id`, if one was requested
    pub(crate) fn consume_cancellation(&self, id: JobId) -> bool {
        let mut rotation = self.rotation.lock();
        if rotation.pending_removal.remove(&id) {
            rotation.live.remove(&id);
            true
        } else {
            false
        }
    }

    /// Wake every idle worker so it re-checks its running flag
    pub(crate) fn wake_all(&self) {
        // Taking the lock orders the flag change before any worker's next
        // predicate check, so no sleeper misses it.
        drop(self.queue.lock());
        self.available.notify_all();
    }
}

/// A resizable thread pool for one-shot and recurring jobs
///
/// One-shot jobs are submitted with [`submit`](Self::submit) and hand back a
/// [`JobResult`]. Recurring jobs are submitted with
/// [`submit_recurring`](Self::submit_recurring); after every run they go back
/// to the tail of the queue until [`cancel`](Self::cancel) removes them.
///
/// # Example
///
/// ```rust
/// use rust_job_pool::prelude::*;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// # fn main() -> Result<()> {
/// let pool = ThreadPool::new(4)?;
///
/// let results: Vec<_> = (1..=6)
///     .map(|i| pool.submit(Job::new(move || i * 100)))
///     .collect::<Result<_>>()?;
/// for (i, result) in (1..=6).zip(&results) {
///     assert_eq!(result.get()?, i * 100);
/// }
///
/// let ticks = Arc::new(AtomicUsize::new(0));
/// let ticks_clone = Arc::clone(&ticks);
/// let id = pool.execute_recurring(move || {
///     ticks_clone.fetch_add(1, Ordering::Relaxed);
/// })?;
/// assert!(pool.cancel(id));
/// # Ok(())
/// # }
/// ```
pub struct ThreadPool {
    config: ThreadPoolConfig,
    shared: Arc<Shared>,
    workers: RwLock<Vec<Worker>>,
    resizing: Mutex<()>,
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("config", &self.config)
            .field("threads", &self.thread_count())
            .field("queued", &self.queue_len())
            .finish()
    }
}

impl ThreadPool {
    /// Create a pool running `num_threads` workers with default settings
    pub fn new(num_threads: usize) -> Result<Self> {
        Self::with_config(ThreadPoolConfig::new(num_threads))
    }

    /// Create a thread pool with custom configuration
    pub fn with_config(config: ThreadPoolConfig) -> Result<Self> {
        config.validate()?;

        let pool = Self {
            shared: Arc::new(Shared::new(config.queue_capacity)),
            workers: RwLock::new(Vec::with_capacity(config.num_threads)),
            resizing: Mutex::new(()),
            config,
        };
        pool.resize(pool.config.num_threads)?;

        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_pool_start(pool.config.num_threads, pool.capacity());

        Ok(pool)
    }

    /// Change the number of worker threads.
    ///
    /// Growing appends freshly spawned workers. Shrinking stops the trailing
    /// workers and blocks until each has finished its current job and exited.
    /// Queued entries are never lost; with zero threads they simply wait.
    ///
    /// Changes to the worker set are serialized with each other; joining the
    /// removed threads happens after that, so a job running on a removed
    /// worker may resize the pool again. A job that shrinks its own pool away
    /// from under itself is not joined; its thread exits once the job returns.
    ///
    /// # Errors
    ///
    /// - `ThreadError::SpawnError` - a new worker thread could not be started
    /// - `ThreadError::JoinError` - a removed worker thread panicked
    pub fn resize(&self, num_threads: usize) -> Result<()> {
        let resizing = self.resizing.lock();
        let current = self.workers.read().len();

        if num_threads < current {
            let removed = self.workers.write().split_off(num_threads);
            for worker in &removed {
                worker.stop();
            }
            self.shared.wake_all();
            // The removed slots are already gone from the pool. Joining without
            // the guard lets a job on one of them resize the pool itself.
            drop(resizing);

            let mut first_error = None;
            for worker in removed {
                if worker.is_current_thread() {
                    log::warn!(
                        "worker {} removed itself during resize; detaching",
                        worker.index()
                    );
                    continue;
                }
                if let Err(e) = worker.join() {
                    first_error.get_or_insert(e);
                }
            }
            log::debug!("pool shrank from {} to {} threads", current, num_threads);
            #[cfg(feature = "tracing")]
            crate::tracing::metrics::record_resize(current, num_threads);

            if let Some(e) = first_error {
                return Err(e);
            }
        } else if num_threads > current {
            for index in current..num_threads {
                let worker = Worker::spawn(
                    index,
                    &self.config.thread_name_prefix,
                    Arc::clone(&self.shared),
                )?;
                self.workers.write().push(worker);
            }
            log::debug!("pool grew from {} to {} threads", current, num_threads);
            #[cfg(feature = "tracing")]
            crate::tracing::metrics::record_resize(current, num_threads);
        }

        Ok(())
    }

    /// Current number of worker threads (a snapshot)
    pub fn thread_count(&self) -> usize {
        self.workers.read().len()
    }

    /// Submit a one-shot job.
    ///
    /// The job gets the next identifier and is queued behind everything
    /// already waiting. Returns immediately with a handle to its result.
    ///
    /// # Errors
    ///
    /// - `ThreadError::EmptyJob` - the job has no callable
    /// - `ThreadError::QueueFull` - the queue is at capacity
    pub fn submit<T: Send + 'static>(&self, mut job: Job<T>) -> Result<JobResult<T>> {
        if job.is_empty() {
            return Err(ThreadError::EmptyJob);
        }
        job.assign_id(self.shared.next_id());

        let (entry, result) = Entry::one_shot(&job).ok_or(ThreadError::EmptyJob)?;
        self.shared.enqueue(entry)?;
        self.shared.stats.increment_submitted();

        log::trace!("submitted job {}", job.id());
        Ok(result)
    }

    /// Submit a closure as a one-shot job
    pub fn execute<F, T>(&self, f: F) -> Result<JobResult<T>>
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Send + 'static,
    {
        self.submit(Job::new(f))
    }

    /// Submit a recurring job.
    ///
    /// After every run the job returns to the tail of the queue, sharing the
    /// workers round-robin with everything else, until it is cancelled. Its
    /// output is discarded.
    ///
    /// # Errors
    ///
    /// - `ThreadError::EmptyJob` - the job has no callable
    /// - `ThreadError::QueueFull` - the queue is at capacity
    pub fn submit_recurring<T: 'static>(&self, mut job: Job<T>) -> Result<JobId> {
        if job.is_empty() {
            return Err(ThreadError::EmptyJob);
        }
        let id = self.shared.next_id();
        job.assign_id(id);

        let entry = Entry::recurring(&job).ok_or(ThreadError::EmptyJob)?;
        self.shared.rotation.lock().live.insert(id);

        if let Err(e) = self.shared.enqueue(entry) {
            let mut rotation = self.shared.rotation.lock();
            rotation.live.remove(&id);
            rotation.pending_removal.remove(&id);
            return Err(e);
        }
        self.shared.stats.increment_submitted();

        log::trace!("submitted recurring job {}", id);
        Ok(id)
    }

    /// Submit a closure as a recurring job
    pub fn execute_recurring<F>(&self, f: F) -> Result<JobId>
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.submit_recurring(Job::new(f))
    }

    /// Request removal of a recurring job from rotation.
    ///
    /// The job's next dequeue drops it instead of running it; a run that is
    /// already in progress completes. Returns `false` (and does nothing) if
    /// `id` is not a recurring job in rotation: unknown, already removed, or
    /// a one-shot job.
    pub fn cancel(&self, id: JobId) -> bool {
        let mut rotation = self.shared.rotation.lock();
        if !rotation.live.contains(&id) {
            return false;
        }
        rotation.pending_removal.insert(id);
        log::trace!("recurring job {} marked for removal", id);
        true
    }

    /// Whether `id` is a recurring job that will keep running
    pub fn is_rotating(&self, id: JobId) -> bool {
        let rotation = self.shared.rotation.lock();
        rotation.live.contains(&id) && !rotation.pending_removal.contains(&id)
    }

    /// Whether an entry with `id` is waiting in the queue.
    ///
    /// Jobs being executed are not in the queue. The answer is a snapshot and
    /// may be stale by the time it is read.
    pub fn contains(&self, id: JobId) -> bool {
        self.shared
            .queue
            .lock()
            .entries
            .contains_by(|entry| entry.id == id)
    }

    /// Number of entries waiting in the queue
    pub fn queue_len(&self) -> usize {
        self.shared.queue.lock().entries.len()
    }

    /// Maximum number of queued entries
    pub fn capacity(&self) -> usize {
        self.config.queue_capacity
    }

    /// Pool configuration
    pub fn config(&self) -> &ThreadPoolConfig {
        &self.config
    }

    /// Snapshot of the pool's job statistics
    pub fn stats(&self) -> PoolStatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Stop every worker and discard all queued work.
    ///
    /// Waits for running jobs to finish. Results of discarded one-shot jobs
    /// resolve with `ThreadError::Abandoned`, and every recurring job leaves
    /// rotation. The pool stays usable: resizing up again accepts new work.
    pub fn shutdown(&self) -> Result<()> {
        let resized = self.resize(0);

        let discarded: Vec<Entry> = self.shared.queue.lock().entries.drain().collect();
        let count = discarded.len();
        {
            let mut rotation = self.shared.rotation.lock();
            for entry in discarded.iter().filter(|entry| entry.is_recurring()) {
                rotation.live.remove(&entry.id);
                rotation.pending_removal.remove(&entry.id);
            }
        }
        drop(discarded);

        log::debug!("pool shut down, {} queued entries discarded", count);
        #[cfg(feature = "tracing")]
        {
            let stats = self.stats();
            crate::tracing::metrics::record_pool_shutdown(stats.jobs_completed, stats.jobs_panicked);
        }
        resized
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::error!(
                "failed to shut down thread pool '{}' during drop: {}",
                self.config.thread_name_prefix,
                e
            );
        }
    }
}
