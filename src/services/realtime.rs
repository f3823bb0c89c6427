// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process change feed, one broadcast channel per table.
//!
//! The data access layer publishes after every successful write. Subscribers
//! get payloads in emission order for their table; there is no ordering
//! across tables.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Buffered events per table before slow subscribers start lagging.
const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeEvent {
    Insert,
    Update,
    Delete,
}

/// Which events a subscriber wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventFilter {
    Insert,
    Update,
    Delete,
    #[default]
    #[serde(alias = "*")]
    Any,
}

impl EventFilter {
    pub fn matches(self, event: ChangeEvent) -> bool {
        matches!(
            (self, event),
            (Self::Any, _)
                | (Self::Insert, ChangeEvent::Insert)
                | (Self::Update, ChangeEvent::Update)
                | (Self::Delete, ChangeEvent::Delete)
        )
    }
}

/// A single row change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePayload {
    pub schema: String,
    pub table: String,
    pub event_type: ChangeEvent,
    /// Row after the change (`Null` for deletes)
    pub new: Value,
    /// Row before the change, when known
    pub old: Value,
    pub commit_timestamp: DateTime<Utc>,
    /// Owner of the row; not part of the wire payload
    #[serde(skip)]
    pub user_id: String,
}

impl ChangePayload {
    pub fn new(table: &str, event_type: ChangeEvent, user_id: &str, new: Value, old: Value) -> Self {
        Self {
            schema: "public".to_string(),
            table: table.to_string(),
            event_type,
            new,
            old,
            commit_timestamp: Utc::now(),
            user_id: user_id.to_string(),
        }
    }
}

/// Registry of table channels. Cheap to clone.
#[derive(Clone, Default)]
pub struct RealtimeBridge {
    channels: Arc<DashMap<String, broadcast::Sender<ChangePayload>>>,
}

impl RealtimeBridge {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, table: &str) -> broadcast::Sender<ChangePayload> {
        self.channels
            .entry(table.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    /// Deliver a change to current subscribers of its table.
    pub fn publish(&self, payload: ChangePayload) {
        let Some(tx) = self.channels.get(&payload.table).map(|tx| tx.clone()) else {
            return;
        };
        let table = payload.table.clone();
        let event = payload.event_type;
        // No receivers is not an error
        if let Ok(receivers) = tx.send(payload) {
            tracing::debug!(table = %table, ?event, receivers, "Published change");
        }
    }

    /// Raw receiver for streaming consumers (SSE).
    pub fn receiver(&self, table: &str) -> broadcast::Receiver<ChangePayload> {
        self.sender(table).subscribe()
    }

    /// Invoke `callback` for each matching change on `table` until the
    /// returned subscription is unsubscribed or dropped.
    ///
    /// The receiver is registered before this returns, so changes published
    /// right after subscribing are delivered. The callback runs under the
    /// subscription's gate and must not unsubscribe its own subscription.
    pub fn subscribe<F>(&self, table: &str, filter: EventFilter, callback: F) -> Subscription
    where
        F: Fn(ChangePayload) + Send + 'static,
    {
        let mut rx = self.receiver(table);
        let gate = Arc::new(Mutex::new(true));
        let task_gate = gate.clone();
        let channel = format!("{}-changes", table);
        let task_channel = channel.clone();

        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(payload) => {
                        if !filter.matches(payload.event_type) {
                            continue;
                        }
                        // Held through the callback so teardown waits for it
                        let open = task_gate.lock().unwrap_or_else(PoisonError::into_inner);
                        if !*open {
                            break;
                        }
                        callback(payload);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(channel = %task_channel, skipped, "Subscriber lagged, events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        tracing::debug!(channel = %channel, ?filter, "Subscribed");

        Subscription {
            channel,
            gate,
            handle: Some(handle),
        }
    }
}

/// Live subscription handle. Dropping it unsubscribes.
pub struct Subscription {
    channel: String,
    /// `true` while callbacks may run.
    gate: Arc<Mutex<bool>>,
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Channel name, `<table>-changes`.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn is_active(&self) -> bool {
        *self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stop delivery. Waits for a callback already running; none runs after
    /// this returns.
    pub fn unsubscribe(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        *self.gate.lock().unwrap_or_else(PoisonError::into_inner) = false;
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!(channel = %self.channel, "Unsubscribed");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    fn insert(table: &str, n: i64) -> ChangePayload {
        ChangePayload::new(table, ChangeEvent::Insert, "u1", json!({ "n": n }), Value::Null)
    }

    #[tokio::test]
    async fn test_unsubscribe_before_publish_never_calls_back() {
        let bridge = RealtimeBridge::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();

        let sub = bridge.subscribe("activities", EventFilter::Any, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        sub.unsubscribe();

        bridge.publish(insert("activities", 1));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_unsubscribe_waits_for_running_callback() {
        let bridge = RealtimeBridge::new();
        let (started_tx, mut started_rx) = tokio::sync::mpsc::unbounded_channel();
        let finished = Arc::new(AtomicBool::new(false));
        let calls = Arc::new(AtomicUsize::new(0));
        let (f, c) = (finished.clone(), calls.clone());

        let sub = bridge.subscribe("activities", EventFilter::Any, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            let _ = started_tx.send(());
            std::thread::sleep(Duration::from_millis(100));
            f.store(true, Ordering::SeqCst);
        });
        assert!(sub.is_active());

        bridge.publish(insert("activities", 1));
        tokio::time::timeout(Duration::from_secs(1), started_rx.recv())
            .await
            .expect("callback should start");

        sub.unsubscribe();
        assert!(finished.load(Ordering::SeqCst));

        bridge.publish(insert("activities", 2));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_events_delivered_in_order() {
        let bridge = RealtimeBridge::new();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let _sub = bridge.subscribe("activities", EventFilter::Insert, move |p| {
            let _ = tx.send(p.new["n"].as_i64().unwrap_or(-1));
        });

        for n in 0..20 {
            bridge.publish(insert("activities", n));
        }

        let mut seen = Vec::new();
        while seen.len() < 20 {
            let n = tokio::time::timeout(Duration::from_secs(1), rx.recv())
                .await
                .expect("timed out waiting for event")
                .expect("channel closed");
            seen.push(n);
        }
        assert_eq!(seen, (0..20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_filter_and_table_isolation() {
        let bridge = RealtimeBridge::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();

        let _sub = bridge.subscribe("api_keys", EventFilter::Update, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        bridge.publish(insert("api_keys", 1));
        bridge.publish(ChangePayload::new(
            "api_keys",
            ChangeEvent::Update,
            "u1",
            json!({}),
            Value::Null,
        ));
        bridge.publish(ChangePayload::new(
            "activities",
            ChangeEvent::Update,
            "u1",
            json!({}),
            Value::Null,
        ));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_event_filter_parse() {
        let f: EventFilter = serde_json::from_value(json!("*")).unwrap();
        assert_eq!(f, EventFilter::Any);
        assert!(EventFilter::Delete.matches(ChangeEvent::Delete));
        assert!(!EventFilter::Delete.matches(ChangeEvent::Insert));
    }

    #[test]
    fn test_wire_payload_omits_owner() {
        let json = serde_json::to_value(insert("activities", 1)).unwrap();
        assert_eq!(json["schema"], "public");
        assert_eq!(json["event_type"], "INSERT");
        assert!(json.get("user_id").is_none());
    }
}
