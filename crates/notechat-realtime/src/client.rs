//! Client: application facade.
//!
//! Owns everything that outlives a sign-in (config, store handle, focus,
//! transcripts, group directory, metrics) plus the optional active
//! [`Session`]. Navigation goes through here so focus is the single
//! source of truth for "which chat is on screen".

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::backend::{select_single, Backend, Filter};
use crate::composer::PendingSend;
use crate::config::ClientConfig;
use crate::error::RealtimeError;
use crate::focus::FocusTracker;
use crate::group::{Group, GroupDirectory, JoinOutcome};
use crate::message::{Message, ReplyRef};
use crate::metrics::{IngressMetrics, MetricsSnapshot};
use crate::notify::NotificationSurface;
use crate::session::{Session, SessionDeps, SessionEvent};
use crate::transcript::MessageStore;
use crate::types::{CurrentUser, GroupId, UserId, GROUPS, PROFILES};

/// Top-level screens. Switching between them closes any open chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Feed,
    Groups,
    Dashboard,
    Profile,
}

pub struct Client {
    backend: Arc<dyn Backend>,
    surface: Arc<dyn NotificationSurface>,
    config: Arc<ClientConfig>,
    focus: FocusTracker,
    store: MessageStore,
    groups: GroupDirectory,
    metrics: Arc<IngressMetrics>,
    view: View,
    session: Option<Session>,
}

impl Client {
    pub fn new(
        backend: Arc<dyn Backend>,
        surface: Arc<dyn NotificationSurface>,
        config: ClientConfig,
    ) -> Self {
        Self {
            backend,
            surface,
            config: Arc::new(config),
            focus: FocusTracker::new(),
            store: MessageStore::new(),
            groups: GroupDirectory::new(),
            metrics: Arc::new(IngressMetrics::default()),
            view: View::default(),
            session: None,
        }
    }

    // ── Session ─────────────────────────────────────────────────────────

    /// Start the realtime session for `user`.
    ///
    /// The subscription is open when this returns (unless the first
    /// attempt failed, in which case the loop keeps retrying).
    pub async fn sign_in(
        &mut self,
        user: CurrentUser,
    ) -> Result<mpsc::Receiver<SessionEvent>, RealtimeError> {
        if let Some(session) = &self.session {
            return Err(RealtimeError::AlreadySignedIn {
                user_id: session.user().id.clone(),
            });
        }
        let deps = SessionDeps {
            backend: self.backend.clone(),
            surface: self.surface.clone(),
            store: self.store.clone(),
            focus: self.focus.clone(),
            config: self.config.clone(),
            metrics: self.metrics.clone(),
        };
        let (session, events) = Session::start(user, deps).await;
        self.session = Some(session);
        Ok(events)
    }

    /// End the session. No inbound event is handled after this returns.
    pub async fn sign_out(&mut self) {
        if let Some(session) = self.session.take() {
            session.close().await;
        }
        self.focus.close();
        self.view = View::Feed;
    }

    pub fn current_user(&self) -> Option<&CurrentUser> {
        self.session.as_ref().map(Session::user)
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    /// Whether alerts will be shown (false when signed out or denied).
    pub fn notifications_permitted(&self) -> bool {
        self.session.as_ref().is_some_and(Session::notifications_permitted)
    }

    /// Fetch a profile row and build the signed-in identity from it.
    pub async fn load_profile(&self, user_id: &UserId) -> Result<CurrentUser, RealtimeError> {
        let filter = Filter::all().eq("id", user_id.as_ref());
        let row = select_single(self.backend.as_ref(), PROFILES, &filter).await?;
        CurrentUser::from_profile_row(&row)
            .ok_or_else(|| RealtimeError::malformed(format!("profile {user_id} has no id or name")))
    }

    // ── Navigation ──────────────────────────────────────────────────────

    pub fn open_chat(&mut self, group_id: GroupId) {
        self.focus.open(group_id);
    }

    pub fn close_chat(&mut self) {
        self.focus.close();
    }

    pub fn navigate(&mut self, view: View) {
        self.view = view;
        self.focus.close();
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn focused(&self) -> Option<GroupId> {
        self.focus.current()
    }

    pub fn focus(&self) -> &FocusTracker {
        &self.focus
    }

    // ── Messages ────────────────────────────────────────────────────────

    /// Optimistic send. `None` when nobody is signed in.
    pub fn send_message(
        &self,
        group_id: GroupId,
        body: impl Into<String>,
        reply_ref: Option<ReplyRef>,
    ) -> Option<PendingSend> {
        let Some(session) = &self.session else {
            tracing::debug!(group_id = %group_id, "client: send ignored, not signed in");
            return None;
        };
        Some(session.send(group_id, body.into(), reply_ref))
    }

    pub fn transcript(&self, group_id: &GroupId) -> Arc<Vec<Message>> {
        self.store.transcript(group_id)
    }

    pub fn messages(&self) -> &MessageStore {
        &self.store
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ── Groups ──────────────────────────────────────────────────────────

    pub fn groups(&self) -> &GroupDirectory {
        &self.groups
    }

    /// Replace the directory with every `groups` row. Unreadable rows are
    /// skipped. Returns the number of groups loaded.
    pub async fn load_groups(&mut self) -> Result<usize, RealtimeError> {
        let rows = self.backend.select(GROUPS, &Filter::all()).await?;
        let groups: Vec<Group> = rows
            .into_iter()
            .filter_map(|row| match Group::from_row(row) {
                Ok(group) => Some(group),
                Err(e) => {
                    tracing::warn!("client: skipping unreadable group row: {e}");
                    None
                }
            })
            .collect();
        let count = groups.len();
        self.groups.replace_all(groups);
        Ok(count)
    }

    /// Create a group administered by the signed-in user.
    pub async fn create_group(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        is_private: bool,
    ) -> Result<Group, RealtimeError> {
        let admin = self.require_user()?.id.clone();
        let draft = Group::new(GroupId::from(""), name, description, admin, is_private);
        let stored = self.backend.insert(GROUPS, draft.creation_row()?).await?;
        let group = Group::from_row(stored)?;
        tracing::info!(group_id = %group.id, "client: group created");
        self.groups.upsert(group.clone());
        Ok(group)
    }

    /// Join a public group, or queue a request for a private one.
    pub async fn request_to_join(
        &mut self,
        group_id: &GroupId,
    ) -> Result<JoinOutcome, RealtimeError> {
        let user_id = self.require_user()?.id.clone();
        let mut group = self.known_group(group_id)?;
        let outcome = group.request_join(&user_id);
        if outcome != JoinOutcome::Unchanged {
            self.backend
                .update(GROUPS, group_id.as_ref(), group.membership_patch())
                .await?;
            self.groups.upsert(group);
        }
        Ok(outcome)
    }

    /// Admin approves `requester`. Returns whether membership changed.
    pub async fn approve_request(
        &mut self,
        group_id: &GroupId,
        requester: &UserId,
    ) -> Result<bool, RealtimeError> {
        let approver = self.require_user()?.id.clone();
        let mut group = self.known_group(group_id)?;
        if !group.approve_request(&approver, requester)? {
            return Ok(false);
        }
        self.backend
            .update(GROUPS, group_id.as_ref(), group.membership_patch())
            .await?;
        self.groups.upsert(group);
        Ok(true)
    }

    fn require_user(&self) -> Result<&CurrentUser, RealtimeError> {
        self.current_user().ok_or(RealtimeError::NotSignedIn)
    }

    fn known_group(&self, group_id: &GroupId) -> Result<Group, RealtimeError> {
        self.groups
            .get(group_id)
            .cloned()
            .ok_or_else(|| RealtimeError::GroupNotFound {
                group_id: group_id.clone(),
            })
    }
}
