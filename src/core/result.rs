//! Blocking result handle for one-shot jobs
//!
//! A [`JobResult`] is returned by [`ThreadPool::submit`] and resolves once a
//! worker has run the job. Handles are cheap to clone; every clone observes
//! the same outcome.
//!
//! ```rust
//! use rust_job_pool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let pool = ThreadPool::new(2)?;
//! let result = pool.submit(Job::new(|| 6 * 7))?;
//! assert_eq!(result.get()?, 42);
//! # Ok(())
//! # }
//! ```
//!
//! [`ThreadPool::submit`]: crate::pool::ThreadPool::submit

use crate::core::error::{Result, ThreadError};
use crate::core::job::{Job, JobId};
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::Arc;

/// Terminal or pending state of a one-shot job
#[derive(Debug)]
pub(crate) enum Outcome<T> {
    Pending,
    Ready(T),
    Panicked(String),
    Abandoned,
}

impl<T> Outcome<T> {
    fn is_resolved(&self) -> bool {
        !matches!(self, Outcome::Pending)
    }
}

/// State shared between the pool's queue entry and every caller handle
pub(crate) struct ResultState<T> {
    job_id: JobId,
    outcome: Mutex<Outcome<T>>,
    resolved: Condvar,
}

impl<T> ResultState<T> {
    fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            outcome: Mutex::new(Outcome::Pending),
            resolved: Condvar::new(),
        }
    }

    /// Stores the outcome and wakes every waiter.
    ///
    /// Only the first call has an effect; the state never leaves a terminal
    /// outcome.
    pub(crate) fn resolve(&self, outcome: Outcome<T>) -> bool {
        let mut slot = self.outcome.lock();
        if slot.is_resolved() {
            return false;
        }
        *slot = outcome;
        self.resolved.notify_all();
        true
    }

    fn wait(&self) {
        let mut slot = self.outcome.lock();
        while !slot.is_resolved() {
            self.resolved.wait(&mut slot);
        }
    }
}

/// Handle to the eventual output of one submitted job.
///
/// A default-constructed handle is unbound: [`wait`](Self::wait) returns
/// immediately and [`get`](Self::get) fails with [`ThreadError::Unbound`].
pub struct JobResult<T> {
    state: Option<Arc<ResultState<T>>>,
}

impl<T> JobResult<T> {
    /// Create a result bound to `job`, backed by fresh shared state
    pub(crate) fn new(job: &Job<T>) -> Self {
        Self {
            state: Some(Arc::new(ResultState::new(job.id()))),
        }
    }

    pub(crate) fn shared_state(&self) -> Option<Arc<ResultState<T>>> {
        self.state.clone()
    }

    /// Whether this handle is bound to a submitted job
    pub fn is_bound(&self) -> bool {
        self.state.is_some()
    }

    /// Identifier of the bound job, or [`JobId::UNSET`]
    pub fn job_id(&self) -> JobId {
        self.state
            .as_ref()
            .map(|state| state.job_id)
            .unwrap_or(JobId::UNSET)
    }

    /// Whether the job has finished (successfully or not)
    pub fn is_ready(&self) -> bool {
        self.state
            .as_ref()
            .map(|state| state.outcome.lock().is_resolved())
            .unwrap_or(false)
    }

    /// Block until the job has been resolved.
    ///
    /// Returns immediately if the result is already resolved or unbound.
    /// Any number of threads may wait concurrently; all are released.
    pub fn wait(&self) {
        if let Some(state) = &self.state {
            state.wait();
        }
    }
}

impl<T: Clone> JobResult<T> {
    /// Block until the job finishes and return a copy of its output.
    ///
    /// # Errors
    ///
    /// - `ThreadError::Unbound` - the handle is not bound to a job
    /// - `ThreadError::JobPanicked` - the job panicked on its worker
    /// - `ThreadError::Abandoned` - the pool was dropped before the job ran
    pub fn get(&self) -> Result<T> {
        let state = self.state.as_ref().ok_or(ThreadError::Unbound)?;
        state.wait();

        let slot = state.outcome.lock();
        match &*slot {
            Outcome::Ready(value) => Ok(value.clone()),
            Outcome::Panicked(message) => Err(ThreadError::job_panicked(state.job_id, message)),
            Outcome::Abandoned => Err(ThreadError::abandoned(state.job_id)),
            // wait() only returns once resolved
            Outcome::Pending => unreachable!("result read before resolution"),
        }
    }
}

impl<T> Default for JobResult<T> {
    fn default() -> Self {
        Self { state: None }
    }
}

impl<T> Clone for JobResult<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T> fmt::Debug for JobResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobResult")
            .field("job_id", &self.job_id())
            .field("bound", &self.is_bound())
            .field("ready", &self.is_ready())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    fn bound_result(id: u64) -> JobResult<u32> {
        let mut job = Job::new(|| 0u32);
        job.assign_id(JobId::new(id));
        JobResult::new(&job)
    }

    #[test]
    fn test_unbound_result() {
        let result: JobResult<u32> = JobResult::default();
        assert!(!result.is_bound());
        assert!(!result.is_ready());
        assert_eq!(result.job_id(), JobId::UNSET);

        // Must not block
        result.wait();
        assert!(matches!(result.get(), Err(ThreadError::Unbound)));
    }

    #[test]
    fn test_resolve_wakes_waiter() {
        let result = bound_result(1);
        let state = result.shared_state().unwrap();
        let waiter = {
            let result = result.clone();
            thread::spawn(move || result.get())
        };

        thread::sleep(Duration::from_millis(20));
        assert!(!result.is_ready());
        assert!(state.resolve(Outcome::Ready(17)));

        assert_eq!(waiter.join().expect("waiter panicked").unwrap(), 17);
        assert!(result.is_ready());
    }

    #[test]
    fn test_multiple_waiters_released() {
        let result = bound_result(2);
        let state = result.shared_state().unwrap();

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let result = result.clone();
                thread::spawn(move || result.get())
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        state.resolve(Outcome::Ready(99));

        for waiter in waiters {
            assert_eq!(waiter.join().expect("waiter panicked").unwrap(), 99);
        }
    }

    #[test]
    fn test_resolve_is_terminal() {
        let result = bound_result(3);
        let state = result.shared_state().unwrap();

        assert!(state.resolve(Outcome::Ready(1)));
        assert!(!state.resolve(Outcome::Ready(2)));
        assert!(!state.resolve(Outcome::Abandoned));
        assert_eq!(result.get().unwrap(), 1);
    }

    #[test]
    fn test_state_outlives_pool_side_owner() {
        let result = bound_result(4);
        let state = result.shared_state().unwrap();
        state.resolve(Outcome::Ready(8));
        drop(state);

        assert_eq!(result.get().unwrap(), 8);
    }

    #[test]
    fn test_panicked_and_abandoned_outcomes() {
        let result = bound_result(5);
        result
            .shared_state()
            .unwrap()
            .resolve(Outcome::Panicked("bad input".to_string()));
        match result.get() {
            Err(ThreadError::JobPanicked { job_id, message }) => {
                assert_eq!(job_id, JobId::new(5));
                assert_eq!(message, "bad input");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        let result = bound_result(6);
        result.shared_state().unwrap().resolve(Outcome::Abandoned);
        assert!(matches!(result.get(), Err(ThreadError::Abandoned { .. })));
    }
}
