use crate::message::Message;
use crate::notify::NotificationIntent;
use crate::types::GroupId;

/// Intent produced by the pure ingress decision.
///
/// [`plan`](super::decision::plan) returns a `Vec<IngressEffect>`; the
/// executor applies them against the transcript store and the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngressEffect {
    /// Merge the message into its group's transcript (idempotent on id).
    AppendToTranscript { group_id: GroupId, message: Message },

    /// Queue an alert.
    Notify(NotificationIntent),
}
