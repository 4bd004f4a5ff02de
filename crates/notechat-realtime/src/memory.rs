//! In-memory store and notification surface.
//!
//! Used by the integration tests and the demo binary in place of the hosted
//! database and the platform alert API. Both record what they receive and
//! can be told to fail.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;
use tokio::sync::{mpsc, watch, Notify};

use crate::backend::{
    row_key, Backend, ChangeEvent, ChangeOperation, Filter, Subscription, SubscriptionId,
};
use crate::error::BackendError;
use crate::notify::{NotificationOptions, NotificationSurface};

/// Per-subscriber buffer; a full buffer drops the event for that subscriber.
const SUBSCRIBER_BUFFER: usize = 256;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(g) => g,
        Err(poison) => poison.into_inner(),
    }
}

// ── MemoryBackend ───────────────────────────────────────────────────────

struct Subscriber {
    relation: String,
    operations: Vec<ChangeOperation>,
    tx: mpsc::Sender<ChangeEvent>,
}

#[derive(Default)]
struct MemoryState {
    tables: HashMap<String, Vec<Value>>,
    subscribers: HashMap<u64, Subscriber>,
    next_row_id: u64,
    next_sub_id: u64,
    failing_inserts: HashSet<String>,
    failing_selects: HashSet<String>,
    fail_subscribe: bool,
}

/// Store double: tables of JSON rows plus change fan-out.
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
    inserts_open: watch::Sender<bool>,
    selects_open: watch::Sender<bool>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (inserts_open, _rx) = watch::channel(true);
        let (selects_open, _rx) = watch::channel(true);
        Self {
            state: Mutex::new(MemoryState::default()),
            inserts_open,
            selects_open,
        }
    }

    /// Store a row without emitting a change event.
    pub fn seed(&self, relation: &str, row: Value) {
        lock(&self.state)
            .tables
            .entry(relation.to_string())
            .or_default()
            .push(row);
    }

    /// Emit a change event without storing anything (simulates a write made
    /// by another client).
    pub fn publish(&self, relation: &str, operation: ChangeOperation, row: Value) {
        let state = lock(&self.state);
        fan_out(&state, relation, operation, &row);
    }

    /// Snapshot of a table.
    pub fn rows(&self, relation: &str) -> Vec<Value> {
        lock(&self.state)
            .tables
            .get(relation)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        lock(&self.state).subscribers.len()
    }

    /// Drop every live subscription, as a network disconnect would.
    pub fn drop_subscriptions(&self) {
        lock(&self.state).subscribers.clear();
    }

    pub fn set_fail_inserts(&self, relation: &str, fail: bool) {
        let mut state = lock(&self.state);
        if fail {
            state.failing_inserts.insert(relation.to_string());
        } else {
            state.failing_inserts.remove(relation);
        }
    }

    pub fn set_fail_selects(&self, relation: &str, fail: bool) {
        let mut state = lock(&self.state);
        if fail {
            state.failing_selects.insert(relation.to_string());
        } else {
            state.failing_selects.remove(relation);
        }
    }

    pub fn set_fail_subscribe(&self, fail: bool) {
        lock(&self.state).fail_subscribe = fail;
    }

    /// Hold every `insert` until [`resume_inserts`](Self::resume_inserts).
    pub fn pause_inserts(&self) {
        self.inserts_open.send_replace(false);
    }

    pub fn resume_inserts(&self) {
        self.inserts_open.send_replace(true);
    }

    /// Hold every `select` until [`resume_selects`](Self::resume_selects).
    pub fn pause_selects(&self) {
        self.selects_open.send_replace(false);
    }

    pub fn resume_selects(&self) {
        self.selects_open.send_replace(true);
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn fan_out(state: &MemoryState, relation: &str, operation: ChangeOperation, row: &Value) {
    for sub in state.subscribers.values() {
        if sub.relation == relation && sub.operations.contains(&operation) {
            let _ = sub.tx.try_send(ChangeEvent {
                relation: relation.to_string(),
                operation,
                new_row: row.clone(),
            });
        }
    }
}

#[async_trait::async_trait]
impl Backend for MemoryBackend {
    async fn insert(&self, relation: &str, row: Value) -> Result<Value, BackendError> {
        let mut open = self.inserts_open.subscribe();
        let _ = open.wait_for(|open| *open).await;

        let Value::Object(mut fields) = row else {
            return Err(BackendError::Rejected {
                relation: relation.to_string(),
                reason: "row must be an object".into(),
            });
        };

        let mut state = lock(&self.state);
        if state.failing_inserts.contains(relation) {
            return Err(BackendError::Unavailable(format!("insert into {relation} failed")));
        }

        state.next_row_id += 1;
        let id = state.next_row_id.to_string();
        fields.entry("id").or_insert_with(|| Value::String(id));
        fields
            .entry("created_at")
            .or_insert_with(|| Value::String(chrono::Utc::now().to_rfc3339()));
        let stored = Value::Object(fields);

        state
            .tables
            .entry(relation.to_string())
            .or_default()
            .push(stored.clone());
        fan_out(&state, relation, ChangeOperation::Insert, &stored);
        Ok(stored)
    }

    async fn select(&self, relation: &str, filter: &Filter) -> Result<Vec<Value>, BackendError> {
        let mut open = self.selects_open.subscribe();
        let _ = open.wait_for(|open| *open).await;

        let state = lock(&self.state);
        if state.failing_selects.contains(relation) {
            return Err(BackendError::Unavailable(format!("select from {relation} failed")));
        }
        Ok(state
            .tables
            .get(relation)
            .map(|rows| rows.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default())
    }

    async fn update(&self, relation: &str, id: &str, patch: Value) -> Result<(), BackendError> {
        let Value::Object(patch) = patch else {
            return Err(BackendError::Rejected {
                relation: relation.to_string(),
                reason: "patch must be an object".into(),
            });
        };

        let mut state = lock(&self.state);
        let row = state
            .tables
            .get_mut(relation)
            .and_then(|rows| rows.iter_mut().find(|r| row_key(r, "id").as_deref() == Some(id)))
            .ok_or_else(|| BackendError::NotFound {
                relation: relation.to_string(),
                key: format!("id={id}"),
            })?;

        if let Value::Object(fields) = row {
            for (k, v) in patch {
                fields.insert(k, v);
            }
        }
        let updated = row.clone();
        fan_out(&state, relation, ChangeOperation::Update, &updated);
        Ok(())
    }

    async fn subscribe(
        &self,
        relation: &str,
        operations: &[ChangeOperation],
    ) -> Result<Subscription, BackendError> {
        let mut state = lock(&self.state);
        if state.fail_subscribe {
            return Err(BackendError::Unavailable("realtime channel refused".into()));
        }
        state.next_sub_id += 1;
        let id = state.next_sub_id;
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        state.subscribers.insert(
            id,
            Subscriber {
                relation: relation.to_string(),
                operations: operations.to_vec(),
                tx,
            },
        );
        Ok(Subscription {
            id: SubscriptionId(id),
            events: rx,
        })
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), BackendError> {
        lock(&self.state).subscribers.remove(&id.0);
        Ok(())
    }
}

// ── RecordingSurface ────────────────────────────────────────────────────

/// One alert as received by [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedNotification {
    pub title: String,
    pub body: String,
    pub tag: String,
}

/// Notification surface double that records every alert.
pub struct RecordingSurface {
    sent: Mutex<Vec<RecordedNotification>>,
    grant_permission: Mutex<bool>,
    fail_sends: Mutex<bool>,
    attempts: Mutex<usize>,
    changed: Notify,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            grant_permission: Mutex::new(true),
            fail_sends: Mutex::new(false),
            attempts: Mutex::new(0),
            changed: Notify::new(),
        }
    }

    pub fn sent(&self) -> Vec<RecordedNotification> {
        lock(&self.sent).clone()
    }

    /// Sends attempted, including failed ones.
    pub fn attempts(&self) -> usize {
        *lock(&self.attempts)
    }

    pub fn set_grant_permission(&self, grant: bool) {
        *lock(&self.grant_permission) = grant;
    }

    pub fn set_fail_sends(&self, fail: bool) {
        *lock(&self.fail_sends) = fail;
    }

    /// Wait until at least `count` send attempts happened.
    pub async fn wait_for_attempts(&self, count: usize) {
        loop {
            let notified = self.changed.notified();
            if self.attempts() >= count {
                return;
            }
            notified.await;
        }
    }
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl NotificationSurface for RecordingSurface {
    async fn request_permission(&self) -> bool {
        *lock(&self.grant_permission)
    }

    async fn send(&self, title: &str, options: NotificationOptions) -> Result<(), String> {
        let result = if *lock(&self.fail_sends) {
            Err("surface: send failed".to_string())
        } else {
            lock(&self.sent).push(RecordedNotification {
                title: title.to_string(),
                body: options.body,
                tag: options.tag,
            });
            Ok(())
        };
        *lock(&self.attempts) += 1;
        self.changed.notify_waiters();
        result
    }
}
