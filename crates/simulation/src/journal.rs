//! Snapshot journaling shared by every simulated venue.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A value with an optional checkpoint to roll back to.
#[derive(Debug, Clone, Default)]
pub struct Journaled<T: Clone> {
    current: T,
    checkpoint: Option<T>,
}

impl<T: Clone> Journaled<T> {
    pub fn new(value: T) -> Self {
        Self {
            current: value,
            checkpoint: None,
        }
    }

    pub fn begin(&mut self) {
        self.checkpoint = Some(self.current.clone());
    }

    pub fn commit(&mut self) {
        self.checkpoint = None;
    }

    pub fn rollback(&mut self) {
        if let Some(checkpoint) = self.checkpoint.take() {
            self.current = checkpoint;
        }
    }
}

impl<T: Clone> Deref for Journaled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.current
    }
}

impl<T: Clone> DerefMut for Journaled<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.current
    }
}

/// Journaled state shared between the handle a vault owns and the one a test keeps.
#[derive(Debug, Default)]
pub struct Shared<T: Clone>(Arc<Mutex<Journaled<T>>>);

impl<T: Clone> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: Clone> Shared<T> {
    pub fn new(value: T) -> Self {
        Self(Arc::new(Mutex::new(Journaled::new(value))))
    }

    /// A panic while holding the lock leaves the last written state in place.
    pub fn lock(&self) -> MutexGuard<'_, Journaled<T>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
