//! Per-event ingress handler.
//!
//! Order of operations for one change event:
//! parse → self-echo check → duplicate check → name lookups (raced
//! against shutdown) → read focus → plan → execute.
//!
//! Focus is read after the lookups, right before planning, so a
//! navigation that happens while a lookup is in flight is honoured.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tokio::sync::watch;

use crate::backend::ChangeEvent;
use crate::config::ClientConfig;
use crate::focus::FocusTracker;
use crate::metrics::IngressMetrics;
use crate::notify::{NotificationKind, NotificationRouter};
use crate::transcript::MessageStore;
use crate::types::{now_ms, CurrentUser, MessageId};

use super::decision::{is_self_echo, plan, DecisionContext, ResolvedNames};
use super::effect::IngressEffect;
use super::event::InboundMessage;
use super::executor::execute_effects;
use super::lookup::NameResolver;

/// What happened to one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngressOutcome {
    Malformed(String),
    SelfEcho,
    Duplicate,
    /// Shutdown was signalled while lookups were in flight; nothing applied.
    Cancelled,
    Applied {
        appended: bool,
        notification: Option<NotificationKind>,
    },
}

pub struct IngressHandler {
    current_user: CurrentUser,
    resolver: NameResolver,
    seen: LruCache<MessageId, ()>,
    focus: FocusTracker,
    store: MessageStore,
    router: NotificationRouter,
    config: Arc<ClientConfig>,
    metrics: Arc<IngressMetrics>,
    shutdown: watch::Receiver<bool>,
}

impl IngressHandler {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        current_user: CurrentUser,
        resolver: NameResolver,
        focus: FocusTracker,
        store: MessageStore,
        router: NotificationRouter,
        config: Arc<ClientConfig>,
        metrics: Arc<IngressMetrics>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let seen_capacity =
            NonZeroUsize::new(config.seen_ids_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            current_user,
            resolver,
            seen: LruCache::new(seen_capacity),
            focus,
            store,
            router,
            config,
            metrics,
            shutdown,
        }
    }

    pub async fn handle(&mut self, event: &ChangeEvent) -> IngressOutcome {
        self.metrics.events_received.inc();
        let outcome = self.process(event).await;
        self.metrics.events_processed.inc();
        outcome
    }

    async fn process(&mut self, event: &ChangeEvent) -> IngressOutcome {
        let inbound = match InboundMessage::from_change(event, now_ms()) {
            Ok(inbound) => inbound,
            Err(e) => {
                self.metrics.malformed_discarded.inc();
                tracing::warn!("ingress: discarding event: {e}");
                return IngressOutcome::Malformed(e.to_string());
            }
        };

        if is_self_echo(&inbound, &self.current_user) {
            self.metrics.self_echoes_discarded.inc();
            tracing::debug!(message_id = %inbound.id, "ingress: self echo discarded");
            return IngressOutcome::SelfEcho;
        }

        if self.seen.contains(&inbound.id) {
            self.metrics.duplicates_discarded.inc();
            tracing::debug!(message_id = %inbound.id, "ingress: duplicate delivery discarded");
            return IngressOutcome::Duplicate;
        }

        let resolver = &mut self.resolver;
        let lookups = async {
            ResolvedNames {
                author: resolver.author_name(&inbound.author_id).await,
                group: resolver.group_name(&inbound.group_id).await,
            }
        };
        let names = tokio::select! {
            biased;
            _ = shutdown_signalled(self.shutdown.clone()) => None,
            names = lookups => Some(names),
        };
        let Some(names) = names else {
            tracing::debug!(
                message_id = %inbound.id,
                "ingress: shutdown during lookup, event dropped"
            );
            return IngressOutcome::Cancelled;
        };

        let message_id = inbound.id.clone();
        let focused = self.focus.current();
        let ctx = DecisionContext {
            current_user: &self.current_user,
            focused: focused.as_ref(),
            config: &self.config,
        };
        let effects = plan(inbound, names, &ctx);
        let notification = effects.iter().find_map(|effect| match effect {
            IngressEffect::Notify(intent) => Some(intent.kind),
            IngressEffect::AppendToTranscript { .. } => None,
        });

        let appended = execute_effects(effects, &self.store, &self.router, &self.metrics);
        self.seen.put(message_id, ());

        IngressOutcome::Applied {
            appended,
            notification,
        }
    }
}

/// Resolves once shutdown is set, or once the session owning the sender is gone.
async fn shutdown_signalled(mut shutdown: watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
