//! Single-flight guard for user-triggered mutations
//!
//! A submit action holds a [`PendingGuard`] for the lifetime of its request.
//! A second submit of the same action while the first is pending is refused.

use std::sync::atomic::{AtomicBool, Ordering};

use super::ServiceError;

#[derive(Debug, Default)]
pub struct Mutation {
    pending: AtomicBool,
}

impl Mutation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Mark the action as in flight until the returned guard is dropped
    pub fn begin(&self) -> Result<PendingGuard<'_>, ServiceError> {
        self.pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ServiceError::AlreadyPending)?;

        Ok(PendingGuard { mutation: self })
    }
}

#[derive(Debug)]
pub struct PendingGuard<'a> {
    mutation: &'a Mutation,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.mutation.pending.store(false, Ordering::Release);
    }
}
