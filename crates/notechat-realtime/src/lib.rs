//! NoteChat realtime layer.
//!
//! Receives message-insert events for every group over one subscription,
//! merges them into per-group transcripts, and decides between "already on
//! screen" and "raise an alert" using the chat the user has open right now.
//! Sends are optimistic: appended locally first, persisted in the
//! background, and their echo from the store is discarded.
//!
//! Store: any [`Backend`] (in-memory [`MemoryBackend`] included).
//! Alerts: any [`NotificationSurface`].

pub mod backend;
pub mod client;
pub mod composer;
pub mod config;
pub mod error;
pub mod focus;
pub mod group;
pub mod ingress;
pub mod memory;
pub mod mention;
pub mod message;
pub mod metrics;
pub mod notify;
pub mod session;
pub mod transcript;
pub mod types;

pub use backend::{
    row_key, select_single, Backend, ChangeEvent, ChangeOperation, Filter, Subscription,
    SubscriptionId,
};
pub use client::{Client, View};
pub use composer::PendingSend;
pub use config::ClientConfig;
pub use error::{BackendError, RealtimeError};
pub use focus::FocusTracker;
pub use group::{Group, GroupDirectory, JoinOutcome};
pub use ingress::{
    is_self_echo, plan, DecisionContext, InboundMessage, IngressEffect, IngressOutcome,
    ResolvedNames,
};
pub use memory::{MemoryBackend, RecordedNotification, RecordingSurface};
pub use mention::is_mentioned;
pub use message::{Message, MessageOrigin, MessageRow, ReplyRef};
pub use metrics::{IngressMetrics, MetricsSnapshot};
pub use notify::{
    preview, NotificationIntent, NotificationKind, NotificationOptions, NotificationRouter,
    NotificationSurface,
};
pub use session::{Session, SessionEvent};
pub use transcript::MessageStore;
pub use types::{
    now_ms, CurrentUser, GroupId, MessageId, UserId, GROUPS, GROUP_MESSAGES, LOCAL_ID_PREFIX,
    PROFILES,
};
