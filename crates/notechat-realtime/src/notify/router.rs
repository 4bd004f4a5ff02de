//! Notification router, the only place that talks to the alert surface.
//!
//! `route()` enqueues with `try_send` and returns immediately; a delivery
//! task drains the queue. Surface failures are logged and counted, never
//! returned to the caller, so ingress never stalls on alerts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

use crate::metrics::IngressMetrics;

use super::{NotificationIntent, NotificationOptions, NotificationSurface};

/// Enqueue side of the notification pipeline. Cheap to clone.
#[derive(Clone)]
pub struct NotificationRouter {
    tx: mpsc::Sender<NotificationIntent>,
    permission: Arc<AtomicBool>,
    metrics: Arc<IngressMetrics>,
}

impl NotificationRouter {
    /// Start the delivery task. Permission is requested once, first.
    pub fn spawn(
        surface: Arc<dyn NotificationSurface>,
        buffer: usize,
        metrics: Arc<IngressMetrics>,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let permission = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(delivery_loop(
            surface,
            rx,
            permission.clone(),
            metrics.clone(),
        ));
        (
            Self {
                tx,
                permission,
                metrics,
            },
            task,
        )
    }

    /// Fire-and-forget: queue an alert for delivery.
    pub fn route(&self, intent: NotificationIntent) {
        match self.tx.try_send(intent) {
            Ok(()) => self.metrics.notifications_routed.inc(),
            Err(TrySendError::Full(intent)) => {
                self.metrics.notifications_dropped.inc();
                tracing::warn!(tag = %intent.dedupe_tag, "notify: queue full, alert dropped");
            }
            Err(TrySendError::Closed(intent)) => {
                self.metrics.notifications_dropped.inc();
                tracing::debug!(
                    tag = %intent.dedupe_tag,
                    "notify: delivery stopped, alert dropped"
                );
            }
        }
    }

    /// Whether the surface granted permission (false until asked).
    pub fn permission_granted(&self) -> bool {
        self.permission.load(Ordering::Relaxed)
    }
}

async fn delivery_loop(
    surface: Arc<dyn NotificationSurface>,
    mut rx: mpsc::Receiver<NotificationIntent>,
    permission: Arc<AtomicBool>,
    metrics: Arc<IngressMetrics>,
) {
    let granted = surface.request_permission().await;
    permission.store(granted, Ordering::Relaxed);
    if !granted {
        tracing::info!("notify: permission not granted, alerts will be dropped");
    }

    while let Some(intent) = rx.recv().await {
        if !permission.load(Ordering::Relaxed) {
            metrics.notifications_dropped.inc();
            tracing::debug!(tag = %intent.dedupe_tag, "notify: no permission, alert dropped");
            continue;
        }

        let options = NotificationOptions {
            body: intent.body,
            tag: intent.dedupe_tag.to_string(),
        };
        if let Err(e) = surface.send(&intent.title, options).await {
            metrics.notification_failures.inc();
            tracing::warn!("notify: surface send failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::RecordingSurface;
    use crate::notify::NotificationKind;
    use crate::types::GroupId;

    fn intent(tag: &str) -> NotificationIntent {
        NotificationIntent {
            kind: NotificationKind::Unfocused,
            title: "New message in G".into(),
            body: "Bob: hi...".into(),
            dedupe_tag: GroupId::from(tag),
        }
    }

    #[tokio::test]
    async fn delivers_to_surface_with_group_tag() {
        let surface = Arc::new(RecordingSurface::new());
        let metrics = Arc::new(IngressMetrics::default());
        let (router, task) = NotificationRouter::spawn(surface.clone(), 8, metrics.clone());

        router.route(intent("g-1"));
        surface.wait_for_attempts(1).await;

        let sent = surface.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].tag, "g-1");
        assert_eq!(sent[0].title, "New message in G");
        assert!(router.permission_granted());
        assert_eq!(metrics.notifications_routed.get(), 1);

        drop(router);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn surface_failure_is_swallowed() {
        let surface = Arc::new(RecordingSurface::new());
        surface.set_fail_sends(true);
        let metrics = Arc::new(IngressMetrics::default());
        let (router, task) = NotificationRouter::spawn(surface.clone(), 8, metrics.clone());

        router.route(intent("g-1"));
        router.route(intent("g-2"));
        surface.wait_for_attempts(2).await;

        assert_eq!(metrics.notification_failures.get(), 2);
        drop(router);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn denied_permission_drops_alerts() {
        let surface = Arc::new(RecordingSurface::new());
        surface.set_grant_permission(false);
        let metrics = Arc::new(IngressMetrics::default());
        let (router, task) = NotificationRouter::spawn(surface.clone(), 8, metrics.clone());

        router.route(intent("g-1"));
        drop(router);
        task.await.unwrap();

        assert!(surface.sent().is_empty());
        assert_eq!(metrics.notifications_dropped.get(), 1);
    }

    #[tokio::test]
    async fn full_queue_drops_without_blocking() {
        let surface = Arc::new(RecordingSurface::new());
        let metrics = Arc::new(IngressMetrics::default());
        // Current-thread runtime: the delivery task cannot run until we yield.
        let (router, task) = NotificationRouter::spawn(surface.clone(), 1, metrics.clone());

        router.route(intent("g-1"));
        router.route(intent("g-2"));
        assert_eq!(metrics.notifications_routed.get(), 1);
        assert_eq!(metrics.notifications_dropped.get(), 1);

        drop(router);
        task.await.unwrap();
    }
}
