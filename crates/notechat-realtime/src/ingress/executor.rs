//! Effect executor: applies [`IngressEffect`]s.
//!
//! No awaits: the transcript write is a short critical section and
//! routing is a `try_send`.

use crate::metrics::IngressMetrics;
use crate::notify::NotificationRouter;
use crate::transcript::MessageStore;

use super::effect::IngressEffect;

/// Apply one plan. Returns whether a transcript entry was added.
pub(crate) fn execute_effects(
    effects: Vec<IngressEffect>,
    store: &MessageStore,
    router: &NotificationRouter,
    metrics: &IngressMetrics,
) -> bool {
    let mut appended = false;
    for effect in effects {
        match effect {
            IngressEffect::AppendToTranscript { group_id, message } => {
                if store.merge(&group_id, message) {
                    metrics.transcript_appends.inc();
                    appended = true;
                } else {
                    metrics.duplicates_discarded.inc();
                    tracing::debug!(group_id = %group_id, "ingress: message already in transcript");
                }
            }
            IngressEffect::Notify(intent) => router.route(intent),
        }
    }
    appended
}
