//! Scheduling and locking primitives shared by the stores.
//!
//! Every timer in this crate is a tokio task owned by a [`ScheduledTask`].
//! Dropping the handle aborts the task, so teardown happens on every exit
//! path (explicit stop, owner dropped, panic unwinding).

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;

/// Owned handle to a spawned background task. Aborts the task on drop.
#[derive(Debug)]
pub struct ScheduledTask {
    handle: Option<JoinHandle<()>>,
}

impl ScheduledTask {
    /// Spawns `future` on the current tokio runtime.
    ///
    /// Panics if called outside a runtime, like `tokio::spawn`.
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            handle: Some(tokio::spawn(future)),
        }
    }

    /// Cancels the task. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Returns true once the task completed or was cancelled.
    pub fn is_finished(&self) -> bool {
        match &self.handle {
            Some(handle) => handle.is_finished(),
            None => true,
        }
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Locks a mutex, recovering the data if a previous holder panicked.
///
/// Critical sections in this crate never leave state half-written, so a
/// poisoned lock still guards consistent data.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_dropping_handle_aborts_task() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let task = ScheduledTask::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            flag.store(true, Ordering::SeqCst);
        });

        tokio::task::yield_now().await;
        drop(task);
        tokio::time::advance(Duration::from_millis(200)).await;
        tokio::task::yield_now().await;

        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_cancel_is_idempotent() {
        let mut task = ScheduledTask::spawn(async {});
        task.cancel();
        task.cancel();
        assert!(task.is_finished());
    }
}
