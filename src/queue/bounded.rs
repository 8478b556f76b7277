//! Bounded FIFO container with capacity limit.

use std::collections::vec_deque::{self, VecDeque};

/// A fixed-capacity FIFO.
///
/// Pushing onto a full queue hands the item back instead of growing, so the
/// caller decides how to surface backpressure. Besides push-back/pop-front the
/// queue supports lookup and erase by predicate.
///
/// # Example
///
/// ```rust
/// use rust_job_pool::queue::BoundedQueue;
///
/// let mut queue = BoundedQueue::new(2);
/// queue.push_back("a").unwrap();
/// queue.push_back("b").unwrap();
///
/// // Queue is now full - the item comes back
/// assert_eq!(queue.push_back("c"), Err("c"));
/// assert_eq!(queue.pop_front(), Some("a"));
/// ```
#[derive(Debug)]
pub struct BoundedQueue<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Creates a new bounded queue with the specified capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be greater than 0");
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Returns the maximum capacity of this queue.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of queued items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the queue holds no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the queue is at capacity
    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    /// Append at the tail, returning the item if the queue is full
    pub fn push_back(&mut self, item: T) -> std::result::Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        self.items.push_back(item);
        Ok(())
    }

    /// Remove the oldest item
    pub fn pop_front(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// Oldest item without removing it
    pub fn front(&self) -> Option<&T> {
        self.items.front()
    }

    /// Iterate from oldest to newest
    pub fn iter(&self) -> vec_deque::Iter<'_, T> {
        self.items.iter()
    }

    /// First item matching `predicate`
    pub fn find<P>(&self, mut predicate: P) -> Option<&T>
    where
        P: FnMut(&T) -> bool,
    {
        self.items.iter().find(|item| predicate(item))
    }

    /// Whether any item matches `predicate`
    pub fn contains_by<P>(&self, predicate: P) -> bool
    where
        P: FnMut(&T) -> bool,
    {
        self.items.iter().any(predicate)
    }

    /// Erase and return the first item matching `predicate`
    pub fn remove_first<P>(&mut self, mut predicate: P) -> Option<T>
    where
        P: FnMut(&T) -> bool,
    {
        let index = self.items.iter().position(|item| predicate(item))?;
        self.items.remove(index)
    }

    /// Remove every item, oldest first
    pub fn drain(&mut self) -> vec_deque::Drain<'_, T> {
        self.items.drain(..)
    }
}

impl<'a, T> IntoIterator for &'a BoundedQueue<T> {
    type Item = &'a T;
    type IntoIter = vec_deque::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
