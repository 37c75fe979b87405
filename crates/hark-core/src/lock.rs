use async_trait::async_trait;
use tracing::warn;

use crate::error::HarkError;

/// A lock that has been acquired and can be given back.
///
/// Implementations undo every level they took, innermost first.
pub trait HeldLock: Send {
    fn release(self: Box<Self>) -> Result<(), HarkError>;
}

/// Scoped ownership of the state lock.
///
/// Call [`LockGuard::release`] on the success path to observe release
/// errors. Dropping the guard on any other path still releases the lock;
/// a failure there is logged.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard {
    held: Option<Box<dyn HeldLock>>,
}

impl LockGuard {
    pub fn new(held: impl HeldLock + 'static) -> Self {
        Self {
            held: Some(Box::new(held)),
        }
    }

    pub fn release(mut self) -> Result<(), HarkError> {
        match self.held.take() {
            Some(held) => held.release(),
            None => Ok(()),
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Some(held) = self.held.take() {
            if let Err(e) = held.release() {
                warn!("Failed to release state lock: {}", e);
            }
        }
    }
}

impl std::fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard")
            .field("held", &self.held.is_some())
            .finish()
    }
}

/// Mutual exclusion for writers of the state document.
///
/// Constructed once at startup and shared by reference with the store.
#[async_trait]
pub trait LockManager: Send + Sync {
    /// Acquire the lock, failing with an `Internal` error once the
    /// implementation's retry budget is spent.
    async fn acquire(&self) -> Result<LockGuard, HarkError>;
}
