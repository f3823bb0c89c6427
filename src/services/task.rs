// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Abortable background work with an optional deadline.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("Task was cancelled")]
    Cancelled,

    #[error("Task panicked")]
    Panicked,

    #[error("Task timed out after {0:?}")]
    TimedOut(Duration),
}

/// A spawned unit of work. Dropping the handle does not stop the work; call
/// [`abort`](Self::abort).
#[derive(Debug)]
pub struct Task<T> {
    handle: JoinHandle<T>,
}

impl<T: Send + 'static> Task<T> {
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(future),
        }
    }

    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the result.
    pub async fn join(self) -> Result<T, TaskError> {
        self.handle.await.map_err(|e| {
            if e.is_cancelled() {
                TaskError::Cancelled
            } else {
                TaskError::Panicked
            }
        })
    }

    /// Wait at most `limit`; the task is aborted when the deadline passes.
    pub async fn join_timeout(self, limit: Duration) -> Result<T, TaskError> {
        let abort = self.handle.abort_handle();
        match tokio::time::timeout(limit, self.join()).await {
            Ok(result) => result,
            Err(_) => {
                abort.abort();
                Err(TaskError::TimedOut(limit))
            }
        }
    }
}
