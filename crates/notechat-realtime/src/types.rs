use serde::{Deserialize, Serialize};
use std::fmt;

/// Relation holding group chat messages.
pub const GROUP_MESSAGES: &str = "group_messages";

/// Relation holding user profiles (id, name, avatar).
pub const PROFILES: &str = "profiles";

/// Relation holding group metadata.
pub const GROUPS: &str = "groups";

/// Prefix of ids minted locally for optimistic messages.
pub const LOCAL_ID_PREFIX: &str = "local-";

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identity of a user, as assigned by the auth layer.
    UserId
);

string_id!(
    /// Group identifier, assigned by the store.
    GroupId
);

string_id!(
    /// Message identifier. Optimistic messages carry a "local-<uuid>" id.
    MessageId
);

impl MessageId {
    /// Mint a temporary id for an optimistic message.
    pub fn local() -> Self {
        Self(format!("{LOCAL_ID_PREFIX}{}", uuid::Uuid::new_v4()))
    }

    /// Whether this id was minted locally rather than assigned by the store.
    pub fn is_local(&self) -> bool {
        self.0.starts_with(LOCAL_ID_PREFIX)
    }
}

/// The signed-in user, as handed over by the auth layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub display_name: String,
    pub avatar_ref: String,
}

impl CurrentUser {
    pub fn new(
        id: impl Into<UserId>,
        display_name: impl Into<String>,
        avatar_ref: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            avatar_ref: avatar_ref.into(),
        }
    }

    /// Build from a `profiles` row ({id, name, avatar}). Integer ids are
    /// kept as their decimal text.
    pub fn from_profile_row(row: &serde_json::Value) -> Option<Self> {
        let id = crate::backend::row_key(row, "id")?;
        let name = row.get("name")?.as_str()?;
        let avatar = row.get("avatar").and_then(|v| v.as_str()).unwrap_or_default();
        Some(Self::new(id, name, avatar))
    }
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
