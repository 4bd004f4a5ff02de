use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::BackendError;

/// Kind of row change carried by a [`ChangeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeOperation {
    Insert,
    Update,
    Delete,
}

/// One change notification from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub relation: String,
    pub operation: ChangeOperation,
    pub new_row: Value,
}

/// Equality filter for `select`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub eq: Vec<(String, Value)>,
}

impl Filter {
    /// Match every row.
    pub fn all() -> Self {
        Self::default()
    }

    /// Add a `column == value` condition.
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.eq.push((column.into(), value.into()));
        self
    }

    /// Whether every condition holds. Keys compare as [`row_key`] does, so
    /// the string "7" matches the integer 7.
    pub fn matches(&self, row: &Value) -> bool {
        self.eq.iter().all(|(column, value)| {
            row.get(column).is_some_and(|cell| {
                cell == value
                    || matches!(
                        (key_text(cell), key_text(value)),
                        (Some(a), Some(b)) if a == b
                    )
            })
        })
    }
}

/// Handle of a live subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// A live change-event subscription.
///
/// When the store side drops the stream, `events.recv()` returns `None`;
/// the caller treats that as a disconnect and resubscribes.
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub events: mpsc::Receiver<ChangeEvent>,
}

/// Abstraction over the hosted relational store.
///
/// In production: impl over the hosted database client.
/// In tests and the demo: [`MemoryBackend`](crate::memory::MemoryBackend).
#[async_trait::async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Insert a row; returns the stored row including assigned `id`.
    async fn insert(&self, relation: &str, row: Value) -> Result<Value, BackendError>;

    /// Rows of `relation` matching `filter`.
    async fn select(&self, relation: &str, filter: &Filter) -> Result<Vec<Value>, BackendError>;

    /// Merge `patch` (an object) into the row with the given `id`.
    async fn update(&self, relation: &str, id: &str, patch: Value) -> Result<(), BackendError>;

    /// Subscribe to changes of `relation` restricted to `operations`.
    async fn subscribe(
        &self,
        relation: &str,
        operations: &[ChangeOperation],
    ) -> Result<Subscription, BackendError>;

    /// Tear down a subscription. No further events are delivered for it.
    async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), BackendError>;
}

/// Select exactly one row, mapping "no rows" to `NotFound`.
pub async fn select_single<B: Backend + ?Sized>(
    backend: &B,
    relation: &str,
    filter: &Filter,
) -> Result<Value, BackendError> {
    let rows = backend.select(relation, filter).await?;
    rows.into_iter().next().ok_or_else(|| BackendError::NotFound {
        relation: relation.to_string(),
        key: filter
            .eq
            .iter()
            .map(|(c, v)| format!("{c}={}", key_text(v).unwrap_or_else(|| v.to_string())))
            .collect::<Vec<_>>()
            .join(","),
    })
}

/// Row key as a string: non-empty string, or integer rendered as decimal.
pub fn row_key(row: &Value, column: &str) -> Option<String> {
    key_text(row.get(column)?)
}

fn key_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.is_u64() || n.is_i64() => Some(n.to_string()),
        _ => None,
    }
}
