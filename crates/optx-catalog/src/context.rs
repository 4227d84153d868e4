//! Request cancellation.

use crate::error::{CatalogError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cancellation and deadline of one planning request. Clones share the
/// cancel flag.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    canceled: Arc<AtomicBool>,
}

impl Context {
    /// A context that is never canceled on its own.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            canceled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::Release);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Acquire) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fails with [`CatalogError::Canceled`] once canceled or past the deadline.
    pub fn check(&self) -> Result<()> {
        if self.is_canceled() {
            return Err(CatalogError::Canceled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_shared_by_clones() {
        let ctx = Context::background();
        let child = ctx.clone();
        assert!(child.check().is_ok());
        ctx.cancel();
        assert_eq!(child.check(), Err(CatalogError::Canceled));
    }

    #[test]
    fn test_deadline() {
        let ctx = Context::with_timeout(Duration::ZERO);
        assert!(ctx.is_canceled());
        assert!(Context::with_timeout(Duration::from_secs(3600)).check().is_ok());
    }
}
