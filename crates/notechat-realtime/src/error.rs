use crate::types::{GroupId, UserId};

/// Errors raised by a [`Backend`](crate::backend::Backend) implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("no row in {relation} matches {key}")]
    NotFound { relation: String, key: String },

    #[error("store rejected write to {relation}: {reason}")]
    Rejected { relation: String, reason: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Realtime-layer errors.
///
/// Wraps store errors and adds pipeline-specific variants
/// (malformed events, session lifecycle, group permissions).
#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    #[error("store error: {0}")]
    Backend(#[from] BackendError),

    #[error("malformed event: {reason}")]
    MalformedEvent { reason: String },

    #[error("no user is signed in")]
    NotSignedIn,

    #[error("a session is already active for {user_id}")]
    AlreadySignedIn { user_id: UserId },

    #[error("persist failed: {reason}")]
    Persist { reason: String },

    #[error("unknown group: {group_id}")]
    GroupNotFound { group_id: GroupId },

    #[error("{user_id} is not the admin of {group_id}")]
    NotGroupAdmin { group_id: GroupId, user_id: UserId },

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl RealtimeError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        RealtimeError::MalformedEvent {
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for RealtimeError {
    fn from(e: serde_json::Error) -> Self {
        RealtimeError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_malformed_event() {
        let err = RealtimeError::malformed("missing group_id");
        assert_eq!(err.to_string(), "malformed event: missing group_id");
    }

    #[test]
    fn test_display_backend_wrapped() {
        let err: RealtimeError = BackendError::Unavailable("socket reset".into()).into();
        assert_eq!(err.to_string(), "store error: store unavailable: socket reset");
    }

    #[test]
    fn test_display_not_found() {
        let err = BackendError::NotFound {
            relation: "profiles".into(),
            key: "id=u-9".into(),
        };
        assert_eq!(err.to_string(), "no row in profiles matches id=u-9");
    }

    #[test]
    fn test_display_not_admin() {
        let err = RealtimeError::NotGroupAdmin {
            group_id: GroupId::from("g-1"),
            user_id: UserId::from("u-2"),
        };
        assert_eq!(err.to_string(), "u-2 is not the admin of g-1");
    }

    #[test]
    fn test_display_already_signed_in() {
        let err = RealtimeError::AlreadySignedIn {
            user_id: UserId::from("u-1"),
        };
        assert_eq!(err.to_string(), "a session is already active for u-1");
    }
}
