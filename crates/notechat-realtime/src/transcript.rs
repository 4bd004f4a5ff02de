/// Per-group transcripts.
///
/// Append-only: entries are never removed or reordered. Each write builds a
/// new snapshot for the touched group and swaps it in, so readers holding an
/// older `Arc` keep a consistent view. Writes to one group never touch
/// another group's snapshot.
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::watch;

use crate::message::Message;
use crate::types::{GroupId, MessageId};

type Transcripts = HashMap<GroupId, Arc<Vec<Message>>>;

/// Shared transcript store. Cheap to clone.
#[derive(Clone)]
pub struct MessageStore {
    inner: Arc<RwLock<Transcripts>>,
    rev_tx: Arc<watch::Sender<u64>>,
}

impl MessageStore {
    pub fn new() -> Self {
        let (rev_tx, _rx) = watch::channel(0);
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            rev_tx: Arc::new(rev_tx),
        }
    }

    /// Append to the end of a group's transcript unconditionally.
    pub fn append(&self, group_id: &GroupId, message: Message) {
        self.write(group_id, |_| true, message);
    }

    /// Append unless an entry with the same id already exists.
    ///
    /// Returns `true` if the message was added.
    pub fn merge(&self, group_id: &GroupId, message: Message) -> bool {
        let id = message.id.clone();
        self.write(group_id, |current| !current.iter().any(|m| m.id == id), message)
    }

    /// Full ordered transcript of a group (empty if none).
    pub fn transcript(&self, group_id: &GroupId) -> Arc<Vec<Message>> {
        self.read()
            .get(group_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn len(&self, group_id: &GroupId) -> usize {
        self.read().get(group_id).map(|t| t.len()).unwrap_or(0)
    }

    pub fn contains(&self, group_id: &GroupId, message_id: &MessageId) -> bool {
        self.read()
            .get(group_id)
            .is_some_and(|t| t.iter().any(|m| &m.id == message_id))
    }

    /// Groups that have at least one entry.
    pub fn groups(&self) -> Vec<GroupId> {
        self.read().keys().cloned().collect()
    }

    /// Bumped on every successful write.
    pub fn revision(&self) -> u64 {
        *self.rev_tx.borrow()
    }

    /// Observe the revision counter (re-render trigger for views).
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.rev_tx.subscribe()
    }

    // ── Internal ───────────────────────────────────────────────────────

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Transcripts> {
        match self.inner.read() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        }
    }

    fn write(
        &self,
        group_id: &GroupId,
        accept: impl FnOnce(&[Message]) -> bool,
        message: Message,
    ) -> bool {
        let mut guard = match self.inner.write() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        };
        let current = guard.get(group_id).cloned().unwrap_or_default();
        if !accept(&current) {
            return false;
        }

        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend(current.iter().cloned());
        next.push(message);
        guard.insert(group_id.clone(), Arc::new(next));
        drop(guard);

        self.rev_tx.send_modify(|rev| *rev += 1);
        true
    }
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new()
    }
}
