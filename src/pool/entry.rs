//! Queue entries: a job's identity paired with how it is delivered.

use crate::core::error::panic_message;
use crate::core::result::{Outcome, ResultState};
use crate::core::{Job, JobFn, JobId, JobResult};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Callable of a recurring entry; its output is discarded after every run
pub(crate) type RecurringFn = Arc<dyn Fn() + Send + Sync>;

/// Runs `f`, turning a panic into its message.
pub(crate) fn run_guarded<R>(f: impl FnOnce() -> R) -> std::result::Result<R, String> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(payload.as_ref()))
}

/// A type-erased one-shot job bound to its result state
pub(crate) trait OneShotTask: Send {
    /// Execute the callable and resolve the paired result.
    /// Returns the panic message if the callable panicked.
    fn run(self: Box<Self>) -> Option<String>;
}

struct BoundTask<T> {
    callable: JobFn<T>,
    state: Arc<ResultState<T>>,
}

impl<T: Send + 'static> OneShotTask for BoundTask<T> {
    fn run(self: Box<Self>) -> Option<String> {
        match run_guarded(|| (self.callable)()) {
            Ok(value) => {
                self.state.resolve(Outcome::Ready(value));
                None
            }
            Err(message) => {
                self.state.resolve(Outcome::Panicked(message.clone()));
                Some(message)
            }
        }
    }
}

impl<T> Drop for BoundTask<T> {
    // A task dropped without running (pool torn down with work queued) must
    // still release its waiters. No-op once run() resolved the state.
    fn drop(&mut self) {
        self.state.resolve(Outcome::Abandoned);
    }
}

/// How an entry is delivered after execution
pub(crate) enum EntryKind {
    /// Run once, resolving a [`JobResult`]
    OneShot(Box<dyn OneShotTask>),
    /// Run, then go back to the tail of the queue
    Recurring(RecurringFn),
}

/// One pending unit of work in the pool's queue
pub(crate) struct Entry {
    pub(crate) id: JobId,
    pub(crate) kind: EntryKind,
}

impl Entry {
    /// Pair a submitted job with a fresh result handle.
    ///
    /// Returns `None` for a job without a callable.
    pub(crate) fn one_shot<T: Send + 'static>(job: &Job<T>) -> Option<(Self, JobResult<T>)> {
        let callable = job.callable()?;
        let result = JobResult::new(job);
        let state = result.shared_state()?;
        let entry = Self {
            id: job.id(),
            kind: EntryKind::OneShot(Box::new(BoundTask { callable, state })),
        };
        Some((entry, result))
    }

    /// Wrap a submitted job for endless rotation.
    ///
    /// Returns `None` for a job without a callable.
    pub(crate) fn recurring<T: 'static>(job: &Job<T>) -> Option<Self> {
        let callable = job.callable()?;
        Some(Self {
            id: job.id(),
            kind: EntryKind::Recurring(Arc::new(move || {
                let _ = callable();
            })),
        })
    }

    pub(crate) fn is_recurring(&self) -> bool {
        matches!(self.kind, EntryKind::Recurring(_))
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("id", &self.id)
            .field("recurring", &self.is_recurring())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ThreadError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn submitted<T>(job: Job<T>, id: u64) -> Job<T> {
        let mut job = job;
        job.assign_id(JobId::new(id));
        job
    }

    #[test]
    fn test_one_shot_resolves_result() {
        let job = submitted(Job::new(|| "done".to_string()), 1);
        let (entry, result) = Entry::one_shot(&job).expect("callable present");
        assert_eq!(entry.id, JobId::new(1));
        assert_eq!(result.job_id(), JobId::new(1));

        match entry.kind {
            EntryKind::OneShot(task) => assert!(task.run().is_none()),
            EntryKind::Recurring(_) => panic!("expected one-shot entry"),
        }
        assert_eq!(result.get().unwrap(), "done");
    }

    #[test]
    fn test_one_shot_panic_is_captured() {
        let job = submitted(Job::new(|| -> u8 { panic!("exploded") }), 2);
        let (entry, result) = Entry::one_shot(&job).unwrap();

        if let EntryKind::OneShot(task) = entry.kind {
            assert_eq!(task.run().as_deref(), Some("exploded"));
        }
        assert!(matches!(result.get(), Err(ThreadError::JobPanicked { .. })));
    }

    #[test]
    fn test_dropped_entry_abandons_result() {
        let job = submitted(Job::new(|| 1u8), 3);
        let (entry, result) = Entry::one_shot(&job).unwrap();
        drop(entry);

        assert!(result.is_ready());
        assert!(matches!(result.get(), Err(ThreadError::Abandoned { .. })));
    }

    #[test]
    fn test_recurring_runs_repeatedly() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);
        let job = submitted(
            Job::new(move || counter_clone.fetch_add(1, Ordering::SeqCst)),
            4,
        );
        let entry = Entry::recurring(&job).unwrap();
        assert!(entry.is_recurring());

        if let EntryKind::Recurring(f) = &entry.kind {
            f();
            f();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_empty_job_has_no_entry() {
        let job: Job<u8> = Job::empty();
        assert!(Entry::one_shot(&job).is_none());
        assert!(Entry::recurring(&job).is_none());
    }
}
