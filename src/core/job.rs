//! Job value type and pool-assigned identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identifier assigned to a job by the pool that accepted it.
///
/// Identifiers are scoped to one pool instance, start at 1 and are never
/// reused. [`JobId::UNSET`] marks a job that has not been submitted yet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(u64);

impl JobId {
    /// Identifier of a job that has not been submitted
    pub const UNSET: JobId = JobId(0);

    /// Wrap a raw identifier
    pub const fn new(raw: u64) -> Self {
        JobId(raw)
    }

    /// Raw identifier value
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Whether this is the unset sentinel
    pub const fn is_unset(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<JobId> for u64 {
    fn from(id: JobId) -> Self {
        id.0
    }
}

/// Shared handle to a job's callable
pub type JobFn<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// A unit of work: a callable producing a `T`, plus the identifier the pool
/// gives it on submission.
///
/// The callable is held behind an [`Arc`], so cloning a job copies the handle
/// and not the state the closure captured. Recurring jobs call it many times.
pub struct Job<T> {
    id: JobId,
    callable: Option<JobFn<T>>,
}

impl<T> Job<T> {
    /// Create a new job from a closure
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            id: JobId::UNSET,
            callable: Some(Arc::new(f)),
        }
    }

    /// Create a job without a callable. The pool refuses to run it.
    pub fn empty() -> Self {
        Self {
            id: JobId::UNSET,
            callable: None,
        }
    }

    /// Identifier assigned by the pool, or [`JobId::UNSET`]
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Whether the job carries no callable
    pub fn is_empty(&self) -> bool {
        self.callable.is_none()
    }

    /// Shared handle to the callable
    pub fn callable(&self) -> Option<JobFn<T>> {
        self.callable.clone()
    }

    pub(crate) fn assign_id(&mut self, id: JobId) {
        debug_assert!(self.id.is_unset(), "job {} already has an identifier", self.id);
        debug_assert!(!id.is_unset());
        self.id = id;
    }
}

impl<T> Default for Job<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Clone for Job<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callable: self.callable.clone(),
        }
    }
}

impl<T> fmt::Debug for Job<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("empty", &self.is_empty())
            .finish()
    }
}
