// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Background activity logging.
//!
//! Feature flows hand their activity record to a queue and move on. A single
//! worker drains the queue into the store; failures are logged and reported
//! on an optional channel, never to the caller.

use crate::db::Database;
use crate::models::NewActivity;
use tokio::sync::mpsc;

/// An activity that could not be written.
#[derive(Debug, Clone)]
pub struct ActivityLogFailure {
    pub activity: NewActivity,
    pub error: String,
}

/// Handle for enqueueing activity records.
#[derive(Clone)]
pub struct ActivityLogger {
    tx: mpsc::UnboundedSender<NewActivity>,
}

impl ActivityLogger {
    /// Start the worker. Failures are only logged.
    pub fn spawn(db: Database) -> Self {
        Self::start(db, None)
    }

    /// Start the worker and also receive each failed write.
    pub fn spawn_with_failures(db: Database) -> (Self, mpsc::UnboundedReceiver<ActivityLogFailure>) {
        let (fail_tx, fail_rx) = mpsc::unbounded_channel();
        (Self::start(db, Some(fail_tx)), fail_rx)
    }

    fn start(db: Database, failures: Option<mpsc::UnboundedSender<ActivityLogFailure>>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<NewActivity>();

        tokio::spawn(async move {
            while let Some(activity) = rx.recv().await {
                if let Err(e) = db.create_activity(activity.clone()).await {
                    tracing::warn!(
                        user_id = %activity.user_id,
                        title = %activity.title,
                        error = %e,
                        "Failed to record activity"
                    );
                    if let Some(failures) = &failures {
                        // Receiver may be gone; nothing else to do
                        let _ = failures.send(ActivityLogFailure {
                            activity,
                            error: e.to_string(),
                        });
                    }
                }
            }
            tracing::debug!("Activity log worker stopped");
        });

        Self { tx }
    }

    /// Enqueue `activity`. Never blocks and never fails.
    pub fn log(&self, activity: NewActivity) {
        if self.tx.send(activity).is_err() {
            tracing::warn!("Activity log worker is not running, dropping activity");
        }
    }
}
