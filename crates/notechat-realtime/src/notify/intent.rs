use crate::config::ClientConfig;
use crate::types::GroupId;

/// Why an alert is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// The body mentions the current user (alerts even when the chat is open).
    Mention,
    /// A message arrived in a group that is not focused.
    Unfocused,
}

/// A request to show one alert.
///
/// `dedupe_tag` is the group id: the surface may collapse several unseen
/// alerts from the same group into one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationIntent {
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub dedupe_tag: GroupId,
}

impl NotificationIntent {
    /// Format the alert for a message from `author` in `group_name`.
    pub fn for_message(
        kind: NotificationKind,
        group_id: &GroupId,
        group_name: &str,
        author: &str,
        text: &str,
        config: &ClientConfig,
    ) -> Self {
        let title = match kind {
            NotificationKind::Mention => config.mention_title.clone(),
            NotificationKind::Unfocused => format!("New message in {group_name}"),
        };
        Self {
            kind,
            title,
            body: format!("{author}: {}...", preview(text, config.preview_chars)),
            dedupe_tag: group_id.clone(),
        }
    }
}

/// First `max_chars` characters of `text` (char boundary safe).
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
