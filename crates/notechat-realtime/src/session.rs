//! Session: the realtime subscription scoped to "signed in".
//!
//! Owns the ingress loop, the notification delivery task and the composer
//! for one user. [`Session::close`] stops ingress and waits for it, so no
//! handler runs once it returns. Dropping a session aborts its tasks.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::backend::{Backend, SubscriptionId};
use crate::composer::{Composer, PendingSend};
use crate::config::ClientConfig;
use crate::focus::FocusTracker;
use crate::ingress::lookup::NameResolver;
use crate::ingress::r#loop::{ingress_loop, subscribe_messages};
use crate::ingress::IngressHandler;
use crate::message::ReplyRef;
use crate::metrics::IngressMetrics;
use crate::notify::{NotificationRouter, NotificationSurface};
use crate::transcript::MessageStore;
use crate::types::{CurrentUser, GroupId, MessageId};

/// Lifecycle and delivery events of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A subscription is live (initial or after a drop).
    Subscribed { subscription: SubscriptionId },

    /// The subscription dropped or could not be opened; retrying.
    SubscriptionLost { reason: String, retry_in: Duration },

    /// An event could not be parsed and was skipped.
    MalformedEventDiscarded { reason: String },

    /// An optimistic message reached the store.
    MessagePersisted {
        group_id: GroupId,
        local_id: MessageId,
        remote_id: MessageId,
    },

    /// Persisting an optimistic message failed. The local copy stays.
    PersistFailed {
        group_id: GroupId,
        local_id: MessageId,
        reason: String,
    },
}

/// Shared pieces a session is started from.
pub(crate) struct SessionDeps {
    pub backend: Arc<dyn Backend>,
    pub surface: Arc<dyn NotificationSurface>,
    pub store: MessageStore,
    pub focus: FocusTracker,
    pub config: Arc<ClientConfig>,
    pub metrics: Arc<IngressMetrics>,
}

pub struct Session {
    user: CurrentUser,
    composer: Composer,
    router: NotificationRouter,
    shutdown_tx: watch::Sender<bool>,
    ingress_task: Option<JoinHandle<()>>,
    delivery_task: Option<JoinHandle<()>>,
}

impl Session {
    /// Subscribe (first attempt inline) and spawn the session tasks.
    pub(crate) async fn start(
        user: CurrentUser,
        deps: SessionDeps,
    ) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (event_tx, event_rx) = mpsc::channel(deps.config.event_buffer);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let (router, delivery_task) = NotificationRouter::spawn(
            deps.surface,
            deps.config.notification_buffer,
            deps.metrics.clone(),
        );

        let subscription = match subscribe_messages(deps.backend.as_ref()).await {
            Ok(sub) => Some(sub),
            Err(e) => {
                let retry_in = deps.config.resubscribe_initial_backoff;
                tracing::warn!("session: initial subscribe failed, retrying in {retry_in:?}: {e}");
                let _ = event_tx.try_send(SessionEvent::SubscriptionLost {
                    reason: e.to_string(),
                    retry_in,
                });
                None
            }
        };

        let handler = IngressHandler::new(
            user.clone(),
            NameResolver::new(deps.backend.clone(), &deps.config, deps.metrics.clone()),
            deps.focus,
            deps.store.clone(),
            router.clone(),
            deps.config.clone(),
            deps.metrics.clone(),
            shutdown_rx.clone(),
        );
        let ingress_task = tokio::spawn(ingress_loop(
            deps.backend.clone(),
            handler,
            subscription,
            event_tx.clone(),
            shutdown_rx,
            deps.config,
            deps.metrics.clone(),
        ));

        let composer = Composer::new(
            user.clone(),
            deps.backend,
            deps.store,
            event_tx,
            deps.metrics,
        );
        tracing::info!(user_id = %user.id, "session: started");

        (
            Self {
                user,
                composer,
                router,
                shutdown_tx,
                ingress_task: Some(ingress_task),
                delivery_task: Some(delivery_task),
            },
            event_rx,
        )
    }

    pub fn user(&self) -> &CurrentUser {
        &self.user
    }

    /// Whether the alert surface granted permission.
    pub fn notifications_permitted(&self) -> bool {
        self.router.permission_granted()
    }

    pub(crate) fn send(
        &self,
        group_id: GroupId,
        body: String,
        reply_ref: Option<ReplyRef>,
    ) -> PendingSend {
        self.composer.send(group_id, body, reply_ref)
    }

    /// Stop ingress and wait for the loop to unsubscribe and exit.
    ///
    /// Alerts already queued are still delivered.
    pub(crate) async fn close(mut self) {
        self.shutdown_tx.send_replace(true);
        if let Some(task) = self.ingress_task.take() {
            if let Err(e) = task.await {
                tracing::warn!("session: ingress task ended abnormally: {e}");
            }
        }
        // Detach: the delivery task drains and exits once every router clone is gone.
        drop(self.delivery_task.take());
        tracing::info!(user_id = %self.user.id, "session: closed");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown_tx.send_replace(true);
        if let Some(task) = self.ingress_task.take() {
            task.abort();
        }
        if let Some(task) = self.delivery_task.take() {
            task.abort();
        }
    }
}
