//! The ingress event loop.
//!
//! A single task that owns the subscription and the handler. Events are
//! handled one at a time in arrival order. When the event stream ends or a
//! subscribe attempt fails, the loop resubscribes with exponential backoff;
//! a dropped subscription is never fatal.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::backend::{Backend, ChangeEvent, ChangeOperation, Subscription};
use crate::config::ClientConfig;
use crate::metrics::IngressMetrics;
use crate::session::SessionEvent;
use crate::types::GROUP_MESSAGES;

use super::handler::{IngressHandler, IngressOutcome};

enum Next {
    Shutdown,
    Event(ChangeEvent),
    StreamEnded,
}

/// Open the `group_messages` insert subscription.
pub(crate) async fn subscribe_messages(
    backend: &dyn Backend,
) -> Result<Subscription, crate::error::BackendError> {
    backend.subscribe(GROUP_MESSAGES, &[ChangeOperation::Insert]).await
}

pub(crate) async fn ingress_loop(
    backend: Arc<dyn Backend>,
    mut handler: IngressHandler,
    mut subscription: Option<Subscription>,
    event_tx: mpsc::Sender<SessionEvent>,
    mut shutdown: watch::Receiver<bool>,
    config: Arc<ClientConfig>,
    metrics: Arc<IngressMetrics>,
) {
    let mut backoff = config.resubscribe_initial_backoff;
    if let Some(sub) = &subscription {
        let _ = event_tx.try_send(SessionEvent::Subscribed { subscription: sub.id });
    }

    loop {
        if *shutdown.borrow() {
            break;
        }

        let Some(sub) = subscription.as_mut() else {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = tokio::time::sleep(backoff) => {}
            }
            match subscribe_messages(backend.as_ref()).await {
                Ok(sub) => {
                    metrics.resubscribes.inc();
                    tracing::info!(subscription = sub.id.0, "ingress: resubscribed");
                    let _ = event_tx.try_send(SessionEvent::Subscribed { subscription: sub.id });
                    backoff = config.resubscribe_initial_backoff;
                    subscription = Some(sub);
                }
                Err(e) => {
                    backoff = next_backoff(backoff, config.resubscribe_max_backoff);
                    tracing::warn!("ingress: resubscribe failed, retrying in {backoff:?}: {e}");
                    let _ = event_tx.try_send(SessionEvent::SubscriptionLost {
                        reason: e.to_string(),
                        retry_in: backoff,
                    });
                }
            }
            continue;
        };

        let next = tokio::select! {
            biased;
            _ = shutdown.changed() => Next::Shutdown,
            event = sub.events.recv() => match event {
                Some(event) => Next::Event(event),
                None => Next::StreamEnded,
            },
        };

        match next {
            Next::Shutdown => break,
            Next::Event(event) => {
                if let IngressOutcome::Malformed(reason) = handler.handle(&event).await {
                    let _ = event_tx.try_send(SessionEvent::MalformedEventDiscarded { reason });
                }
            }
            Next::StreamEnded => {
                tracing::warn!("ingress: subscription stream ended, resubscribing in {backoff:?}");
                let _ = event_tx.try_send(SessionEvent::SubscriptionLost {
                    reason: "event stream ended".into(),
                    retry_in: backoff,
                });
                subscription = None;
            }
        }
    }

    if let Some(sub) = subscription {
        if let Err(e) = backend.unsubscribe(sub.id).await {
            tracing::debug!("ingress: unsubscribe failed: {e}");
        }
    }
    tracing::info!("ingress: stopped");
}

fn next_backoff(current: Duration, max: Duration) -> Duration {
    current.saturating_mul(2).min(max)
}
