//! Optimistic update outcome.
//!
//! A mutation is applied locally before the remote call resolves. The
//! outcome of that call is captured as [`Optimistic`]: either the change was
//! confirmed, or it was rejected and the caller receives the
//! [`Compensation`] that undoes the local change.

use std::fmt;

use crate::errors::{Error, Result};

/// Deferred action that reverts an optimistic local change.
pub struct Compensation(Box<dyn FnOnce() + Send>);

impl Compensation {
    pub fn new(undo: impl FnOnce() + Send + 'static) -> Self {
        Self(Box::new(undo))
    }

    /// Reverts the local change.
    pub fn run(self) {
        (self.0)()
    }
}

impl fmt::Debug for Compensation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Compensation")
    }
}

/// Outcome of an optimistic mutation.
#[derive(Debug)]
pub enum Optimistic<T> {
    /// The remote side confirmed the change.
    Applied(T),
    /// The remote side rejected the change; local state still reflects the
    /// attempted change until `compensation` is run.
    Rejected {
        attempted: T,
        reason: Error,
        compensation: Compensation,
    },
}

impl<T> Optimistic<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Optimistic::Applied(_))
    }

    /// Resolves the outcome: runs the compensation on rejection and returns
    /// the rejection reason.
    pub fn settle(self) -> Result<T> {
        match self {
            Optimistic::Applied(value) => Ok(value),
            Optimistic::Rejected {
                reason,
                compensation,
                ..
            } => {
                compensation.run();
                Err(reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_settle_applied_keeps_value() {
        let outcome = Optimistic::Applied(7);
        assert!(outcome.is_applied());
        assert_eq!(outcome.settle().unwrap(), 7);
    }

    #[test]
    fn test_settle_rejected_runs_compensation_once() {
        let undone = Arc::new(AtomicUsize::new(0));
        let counter = undone.clone();
        let outcome = Optimistic::Rejected {
            attempted: "a1",
            reason: Error::remote("boom"),
            compensation: Compensation::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        };

        assert!(!outcome.is_applied());
        let err = outcome.settle().unwrap_err();
        assert!(matches!(err, Error::Remote(_)));
        assert_eq!(undone.load(Ordering::SeqCst), 1);
    }
}
