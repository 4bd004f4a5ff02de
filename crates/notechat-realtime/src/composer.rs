//! Composer: optimistic local send plus background persist.
//!
//! `send` appends the optimistic message before returning; the persist runs
//! on its own task. The optimistic copy is permanent: the store's echo of
//! the write is discarded by ingress as a self echo, and a failed persist
//! leaves the message in place.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::backend::{row_key, Backend};
use crate::error::RealtimeError;
use crate::message::{Message, MessageRow, ReplyRef};
use crate::metrics::IngressMetrics;
use crate::session::SessionEvent;
use crate::transcript::MessageStore;
use crate::types::{now_ms, CurrentUser, GroupId, MessageId, GROUP_MESSAGES};

/// A send in flight.
///
/// `message` is already in the transcript. Awaiting [`outcome`](Self::outcome)
/// yields the store-assigned id, or the persist error.
#[derive(Debug)]
pub struct PendingSend {
    pub message: Message,
    task: JoinHandle<Result<MessageId, RealtimeError>>,
}

impl PendingSend {
    pub async fn outcome(self) -> Result<MessageId, RealtimeError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(RealtimeError::Persist {
                reason: format!("persist task aborted: {e}"),
            }),
        }
    }
}

pub(crate) struct Composer {
    user: CurrentUser,
    backend: Arc<dyn Backend>,
    store: MessageStore,
    events: mpsc::Sender<SessionEvent>,
    metrics: Arc<IngressMetrics>,
}

impl Composer {
    pub(crate) fn new(
        user: CurrentUser,
        backend: Arc<dyn Backend>,
        store: MessageStore,
        events: mpsc::Sender<SessionEvent>,
        metrics: Arc<IngressMetrics>,
    ) -> Self {
        Self {
            user,
            backend,
            store,
            events,
            metrics,
        }
    }

    pub(crate) fn send(
        &self,
        group_id: GroupId,
        body: String,
        reply_ref: Option<ReplyRef>,
    ) -> PendingSend {
        let message = Message::optimistic(&self.user, group_id.clone(), body, reply_ref, now_ms());
        self.store.append(&group_id, message.clone());
        tracing::debug!(
            group_id = %group_id,
            message_id = %message.id,
            "composer: optimistic append"
        );

        let task = tokio::spawn(persist(
            self.backend.clone(),
            MessageRow::from(&message),
            message.id.clone(),
            self.events.clone(),
            self.metrics.clone(),
        ));
        PendingSend { message, task }
    }
}

async fn persist(
    backend: Arc<dyn Backend>,
    row: MessageRow,
    local_id: MessageId,
    events: mpsc::Sender<SessionEvent>,
    metrics: Arc<IngressMetrics>,
) -> Result<MessageId, RealtimeError> {
    let group_id = row.group_id.clone();
    match insert_row(backend.as_ref(), &row).await {
        Ok(remote_id) => {
            tracing::debug!(
                group_id = %group_id,
                local_id = %local_id,
                remote_id = %remote_id,
                "composer: persisted"
            );
            let _ = events.try_send(SessionEvent::MessagePersisted {
                group_id,
                local_id,
                remote_id: remote_id.clone(),
            });
            Ok(remote_id)
        }
        Err(e) => {
            metrics.persist_failures.inc();
            tracing::warn!(
                group_id = %group_id,
                local_id = %local_id,
                "composer: persist failed, keeping local copy: {e}"
            );
            let _ = events.try_send(SessionEvent::PersistFailed {
                group_id,
                local_id,
                reason: e.to_string(),
            });
            Err(RealtimeError::Persist {
                reason: e.to_string(),
            })
        }
    }
}

async fn insert_row(backend: &dyn Backend, row: &MessageRow) -> Result<MessageId, RealtimeError> {
    let stored = backend.insert(GROUP_MESSAGES, serde_json::to_value(row)?).await?;
    row_key(&stored, "id")
        .map(MessageId)
        .ok_or_else(|| RealtimeError::Persist {
            reason: "store returned a row without id".into(),
        })
}
