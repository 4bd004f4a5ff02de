/// Focus tracking: which group chat is open right now.
///
/// The value lives in a `watch` channel shared by every clone of the
/// tracker. Handlers call [`FocusTracker::current`] at the moment they need
/// it, so they always observe the latest navigation, never a value captured
/// when the subscription was set up.
use tokio::sync::watch;

use crate::types::GroupId;

#[derive(Clone, Debug)]
pub struct FocusTracker {
    tx: watch::Sender<Option<GroupId>>,
}

impl FocusTracker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// The user opened a group chat.
    pub fn open(&self, group_id: GroupId) {
        tracing::debug!(group_id = %group_id, "focus: open");
        self.tx.send_replace(Some(group_id));
    }

    /// The chat view was closed, or the user navigated elsewhere.
    pub fn close(&self) {
        if self.tx.send_replace(None).is_some() {
            tracing::debug!("focus: closed");
        }
    }

    /// Focused group at this instant.
    pub fn current(&self) -> Option<GroupId> {
        self.tx.borrow().clone()
    }

    pub fn is_focused(&self, group_id: &GroupId) -> bool {
        self.tx.borrow().as_ref() == Some(group_id)
    }

    /// Observe focus changes (for view layers).
    pub fn subscribe(&self) -> watch::Receiver<Option<GroupId>> {
        self.tx.subscribe()
    }
}

impl Default for FocusTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unfocused() {
        let focus = FocusTracker::new();
        assert_eq!(focus.current(), None);
    }

    #[test]
    fn clones_share_state() {
        let focus = FocusTracker::new();
        let captured = focus.clone();

        focus.open(GroupId::from("g-1"));
        assert_eq!(captured.current(), Some(GroupId::from("g-1")));

        focus.open(GroupId::from("g-2"));
        assert!(captured.is_focused(&GroupId::from("g-2")));
        assert!(!captured.is_focused(&GroupId::from("g-1")));

        focus.close();
        assert_eq!(captured.current(), None);
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let focus = FocusTracker::new();
        let mut rx = focus.subscribe();
        focus.open(GroupId::from("g-1"));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), Some(GroupId::from("g-1")));
    }
}
