/// Group chat message types.
///
/// A `Message` is immutable once created. Reply metadata is a snapshot
/// taken at send time, never a live reference to the quoted message.
use serde::{Deserialize, Serialize};

use crate::types::{CurrentUser, GroupId, MessageId, UserId};

/// Frozen quote of the message being replied to.
///
/// Serialized with the persisted field names (`userName`, `text`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRef {
    #[serde(rename = "userName")]
    pub quoted_author_name: String,
    #[serde(rename = "text")]
    pub quoted_body: String,
}

impl ReplyRef {
    pub fn new(quoted_author_name: impl Into<String>, quoted_body: impl Into<String>) -> Self {
        Self {
            quoted_author_name: quoted_author_name.into(),
            quoted_body: quoted_body.into(),
        }
    }

    /// Snapshot an existing message as a quote.
    pub fn quoting(message: &Message) -> Self {
        Self::new(message.author_display_name.clone(), message.body.clone())
    }
}

/// Where a transcript entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageOrigin {
    /// Created by the composer before any store confirmation.
    Local,
    /// Received through the realtime subscription.
    Remote,
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub group_id: GroupId,
    pub author_id: UserId,
    pub author_display_name: String,
    pub author_avatar_ref: String,
    pub body: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: u64,
    pub reply_ref: Option<ReplyRef>,
    pub origin: MessageOrigin,
}

impl Message {
    /// Build an optimistic message authored by `author`.
    pub fn optimistic(
        author: &CurrentUser,
        group_id: GroupId,
        body: String,
        reply_ref: Option<ReplyRef>,
        created_at: u64,
    ) -> Self {
        Self {
            id: MessageId::local(),
            group_id,
            author_id: author.id.clone(),
            author_display_name: author.display_name.clone(),
            author_avatar_ref: author.avatar_ref.clone(),
            body,
            created_at,
            reply_ref,
            origin: MessageOrigin::Local,
        }
    }

    pub fn is_optimistic(&self) -> bool {
        self.origin == MessageOrigin::Local
    }
}

/// Row shape written to the `group_messages` relation.
///
/// The store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRow {
    pub group_id: GroupId,
    pub user_id: UserId,
    pub text: String,
    pub reply_to: Option<ReplyRef>,
}

impl From<&Message> for MessageRow {
    fn from(message: &Message) -> Self {
        Self {
            group_id: message.group_id.clone(),
            user_id: message.author_id.clone(),
            text: message.body.clone(),
            reply_to: message.reply_ref.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ana() -> CurrentUser {
        CurrentUser::new("u-ana", "Ana", "https://img/ana.png")
    }

    #[test]
    fn optimistic_message_carries_author_snapshot() {
        let msg = Message::optimistic(&ana(), GroupId::from("g-1"), "oi".into(), None, 1000);
        assert!(msg.id.is_local());
        assert!(msg.is_optimistic());
        assert_eq!(msg.author_display_name, "Ana");
        assert_eq!(msg.author_avatar_ref, "https://img/ana.png");
        assert_eq!(msg.created_at, 1000);
    }

    #[test]
    fn row_uses_persisted_field_names() {
        let reply = ReplyRef::new("Bia", "original text");
        let msg = Message::optimistic(&ana(), GroupId::from("g-1"), "reply".into(), Some(reply), 1);
        let row = serde_json::to_value(MessageRow::from(&msg)).unwrap();

        assert_eq!(row["group_id"], "g-1");
        assert_eq!(row["user_id"], "u-ana");
        assert_eq!(row["text"], "reply");
        assert_eq!(row["reply_to"]["userName"], "Bia");
        assert_eq!(row["reply_to"]["text"], "original text");
    }

    #[test]
    fn row_without_reply_serializes_null() {
        let msg = Message::optimistic(&ana(), GroupId::from("g-1"), "x".into(), None, 1);
        let row = serde_json::to_value(MessageRow::from(&msg)).unwrap();
        assert!(row["reply_to"].is_null());
    }

    #[test]
    fn quote_is_a_frozen_copy() {
        let mut original =
            Message::optimistic(&ana(), GroupId::from("g-1"), "before".into(), None, 1);
        let quote = ReplyRef::quoting(&original);
        original.body = "after".into();
        assert_eq!(quote.quoted_body, "before");
        assert_eq!(quote.quoted_author_name, "Ana");
    }
}
