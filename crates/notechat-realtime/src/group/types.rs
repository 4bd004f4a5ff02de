/// Group data structures.
///
/// A group's transcript is not stored here: it lives in the
/// [`MessageStore`](crate::transcript::MessageStore) under the group id.
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::backend::row_key;
use crate::error::RealtimeError;
use crate::types::{GroupId, UserId};

/// Group metadata, serialized in the `groups` row shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub admin_id: UserId,
    #[serde(rename = "members", default)]
    pub member_ids: BTreeSet<UserId>,
    #[serde(rename = "pending_requests", default)]
    pub pending_request_ids: BTreeSet<UserId>,
    #[serde(default)]
    pub is_private: bool,
}

/// Result of asking to join a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Public group: the user is now a member.
    Joined,
    /// Private group: the request waits for the admin.
    Pending,
    /// Nothing changed (already a member, or already pending).
    Unchanged,
}

impl Group {
    /// New group whose only member is its admin.
    pub fn new(
        id: GroupId,
        name: impl Into<String>,
        description: impl Into<String>,
        admin_id: UserId,
        is_private: bool,
    ) -> Self {
        let mut member_ids = BTreeSet::new();
        member_ids.insert(admin_id.clone());
        Self {
            id,
            name: name.into(),
            description: description.into(),
            admin_id,
            member_ids,
            pending_request_ids: BTreeSet::new(),
            is_private,
        }
    }

    pub fn is_member(&self, user_id: &UserId) -> bool {
        self.member_ids.contains(user_id)
    }

    pub fn is_admin(&self, user_id: &UserId) -> bool {
        self.admin_id == *user_id
    }

    pub fn has_pending_request(&self, user_id: &UserId) -> bool {
        self.pending_request_ids.contains(user_id)
    }

    pub fn member_count(&self) -> usize {
        self.member_ids.len()
    }

    /// Ask to join: public groups admit directly, private ones queue.
    pub fn request_join(&mut self, user_id: &UserId) -> JoinOutcome {
        if self.is_member(user_id) {
            return JoinOutcome::Unchanged;
        }
        if !self.is_private {
            self.pending_request_ids.remove(user_id);
            self.member_ids.insert(user_id.clone());
            return JoinOutcome::Joined;
        }
        if self.pending_request_ids.insert(user_id.clone()) {
            JoinOutcome::Pending
        } else {
            JoinOutcome::Unchanged
        }
    }

    /// Admin approves a pending request.
    ///
    /// Returns `Ok(false)` if `requester` had no pending request.
    pub fn approve_request(
        &mut self,
        approver: &UserId,
        requester: &UserId,
    ) -> Result<bool, RealtimeError> {
        if !self.is_admin(approver) {
            return Err(RealtimeError::NotGroupAdmin {
                group_id: self.id.clone(),
                user_id: approver.clone(),
            });
        }
        if !self.pending_request_ids.remove(requester) {
            return Ok(false);
        }
        self.member_ids.insert(requester.clone());
        Ok(true)
    }

    /// Parse a `groups` row. Integer ids are accepted and kept as strings.
    pub fn from_row(mut row: serde_json::Value) -> Result<Self, RealtimeError> {
        if let Some(id) = row_key(&row, "id") {
            row["id"] = serde_json::Value::String(id);
        }
        Ok(serde_json::from_value(row)?)
    }

    /// Row to insert for a new group. The store assigns the id.
    pub fn creation_row(&self) -> Result<serde_json::Value, RealtimeError> {
        let mut row = serde_json::to_value(self)?;
        if let Some(fields) = row.as_object_mut() {
            fields.remove("id");
        }
        Ok(row)
    }

    /// Membership fields as an update patch.
    pub fn membership_patch(&self) -> serde_json::Value {
        serde_json::json!({
            "members": self.member_ids,
            "pending_requests": self.pending_request_ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(is_private: bool) -> Group {
        Group::new(
            GroupId::from("g-1"),
            "Book Club",
            "",
            UserId::from("u-admin"),
            is_private,
        )
    }

    #[test]
    fn admin_is_member_at_creation() {
        let g = group(false);
        assert!(g.is_member(&UserId::from("u-admin")));
        assert!(g.is_admin(&UserId::from("u-admin")));
        assert_eq!(g.member_count(), 1);
    }

    #[test]
    fn creation_row_has_admin_member_and_no_id() {
        let row = group(true).creation_row().unwrap();
        assert!(row.get("id").is_none());
        assert_eq!(row["admin_id"], "u-admin");
        assert_eq!(row["members"], serde_json::json!(["u-admin"]));
        assert_eq!(row["pending_requests"], serde_json::json!([]));
        assert_eq!(row["is_private"], true);
    }

    #[test]
    fn public_join_is_immediate() {
        let mut g = group(false);
        let bob = UserId::from("u-bob");
        assert_eq!(g.request_join(&bob), JoinOutcome::Joined);
        assert!(g.is_member(&bob));
        assert_eq!(g.request_join(&bob), JoinOutcome::Unchanged);
    }

    #[test]
    fn private_join_waits_for_admin() {
        let mut g = group(true);
        let bob = UserId::from("u-bob");
        assert_eq!(g.request_join(&bob), JoinOutcome::Pending);
        assert_eq!(g.request_join(&bob), JoinOutcome::Unchanged);
        assert!(!g.is_member(&bob));
        assert_eq!(g.pending_request_ids.len(), 1);

        assert!(g.approve_request(&UserId::from("u-admin"), &bob).unwrap());
        assert!(g.is_member(&bob));
        assert!(!g.has_pending_request(&bob));
    }

    #[test]
    fn only_admin_approves() {
        let mut g = group(true);
        let bob = UserId::from("u-bob");
        g.request_join(&bob);
        let err = g.approve_request(&UserId::from("u-eve"), &bob).unwrap_err();
        assert!(matches!(err, RealtimeError::NotGroupAdmin { .. }));
        assert!(!g.is_member(&bob));
    }

    #[test]
    fn approving_unknown_request_is_noop() {
        let mut g = group(true);
        let changed = g
            .approve_request(&UserId::from("u-admin"), &UserId::from("u-x"))
            .unwrap();
        assert!(!changed);
        assert_eq!(g.member_count(), 1);
    }

    #[test]
    fn row_shape_roundtrip() {
        let row = serde_json::json!({
            "id": "g-9",
            "name": "Runners",
            "admin_id": "u-1",
            "members": ["u-1", "u-2", "u-2"],
            "is_private": true
        });
        let g: Group = serde_json::from_value(row).unwrap();
        assert_eq!(g.member_count(), 2);
        assert!(g.pending_request_ids.is_empty());
        assert_eq!(g.description, "");

        let back = serde_json::to_value(&g).unwrap();
        assert_eq!(back["members"], serde_json::json!(["u-1", "u-2"]));
        assert_eq!(back["pending_requests"], serde_json::json!([]));
    }

    #[test]
    fn from_row_accepts_integer_id() {
        let row = serde_json::json!({
            "id": 7,
            "name": "Chess",
            "admin_id": "u-1",
            "members": ["u-1"],
        });
        let g = Group::from_row(row).unwrap();
        assert_eq!(g.id, GroupId::from("7"));

        assert!(Group::from_row(serde_json::json!({"id": "g", "members": []})).is_err());
    }
}
