use serde_json::Value;

use crate::backend::{row_key, ChangeEvent, ChangeOperation};
use crate::error::RealtimeError;
use crate::message::ReplyRef;
use crate::types::{GroupId, MessageId, UserId, GROUP_MESSAGES};

/// Fields extracted from a raw `group_messages` insert event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub id: MessageId,
    pub group_id: GroupId,
    pub author_id: UserId,
    pub body: String,
    pub created_at: u64,
    pub reply_ref: Option<ReplyRef>,
}

impl InboundMessage {
    /// Parse a change event.
    ///
    /// id / group_id / user_id / text are required. `created_at` falls back
    /// to `arrival_ms`; an unreadable `reply_to` is dropped.
    pub fn from_change(event: &ChangeEvent, arrival_ms: u64) -> Result<Self, RealtimeError> {
        if event.relation != GROUP_MESSAGES {
            return Err(RealtimeError::malformed(format!(
                "unexpected relation {}",
                event.relation
            )));
        }
        if event.operation != ChangeOperation::Insert {
            return Err(RealtimeError::malformed(format!(
                "unexpected operation {:?}",
                event.operation
            )));
        }

        let row = &event.new_row;
        if !row.is_object() {
            return Err(RealtimeError::malformed("row is not an object"));
        }

        let text = match row.get("text") {
            Some(Value::String(s)) => s.clone(),
            _ => return Err(RealtimeError::malformed("missing text")),
        };

        Ok(Self {
            id: MessageId(key_field(row, "id")?),
            group_id: GroupId(key_field(row, "group_id")?),
            author_id: UserId(key_field(row, "user_id")?),
            body: text,
            created_at: timestamp_ms(row.get("created_at")).unwrap_or(arrival_ms),
            reply_ref: reply_field(row.get("reply_to")),
        })
    }
}

fn key_field(row: &Value, field: &str) -> Result<String, RealtimeError> {
    row_key(row, field).ok_or_else(|| RealtimeError::malformed(format!("missing {field}")))
}

/// RFC 3339 string or integer milliseconds.
fn timestamp_ms(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::String(s) => chrono::DateTime::parse_from_rfc3339(s)
            .ok()
            .and_then(|dt| u64::try_from(dt.timestamp_millis()).ok()),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

fn reply_field(value: Option<&Value>) -> Option<ReplyRef> {
    match value? {
        Value::Null => None,
        v => match serde_json::from_value::<ReplyRef>(v.clone()) {
            Ok(reply) => Some(reply),
            Err(e) => {
                tracing::debug!("ingress: ignoring unreadable reply_to: {e}");
                None
            }
        },
    }
}
