use std::time::Duration;

use crate::types::UserId;

/// Placeholder used in avatar templates.
const USER_ID_PLACEHOLDER: &str = "{user_id}";

/// Configuration for a [`Client`](crate::Client).
///
/// All fields have sensible defaults. Use the builder pattern:
///
/// ```rust
/// use notechat_realtime::ClientConfig;
///
/// let config = ClientConfig::new()
///     .preview_chars(80)
///     .record_unfocused_messages(true);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Buffer of the session event channel (runtime → app).
    pub(crate) event_buffer: usize,
    /// Buffer of the notification queue feeding the surface.
    pub(crate) notification_buffer: usize,
    /// First delay before resubscribing after the stream drops.
    pub(crate) resubscribe_initial_backoff: Duration,
    /// Upper bound for the resubscribe delay.
    pub(crate) resubscribe_max_backoff: Duration,
    /// Entries kept in each name-lookup cache.
    pub(crate) name_cache_capacity: usize,
    /// Recently seen message ids kept for duplicate suppression.
    pub(crate) seen_ids_capacity: usize,
    /// Characters of the body shown in a notification preview.
    pub(crate) preview_chars: usize,
    /// Author label when the profile lookup fails.
    pub(crate) placeholder_author: String,
    /// Group label when the group lookup fails.
    pub(crate) placeholder_group: String,
    /// Title used for notifications that mention the user.
    pub(crate) mention_title: String,
    /// Template for a remote author's avatar; `{user_id}` is substituted.
    pub(crate) avatar_url_template: String,
    /// Also merge messages of unfocused groups into their transcripts.
    pub(crate) record_unfocused_messages: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientConfig {
    /// Create a new config with defaults.
    ///
    /// If the `NOTECHAT_AVATAR_URL` environment variable is set, it is used
    /// as the avatar template. This can be overridden with
    /// [`.avatar_url_template()`](Self::avatar_url_template).
    pub fn new() -> Self {
        let avatar_url_template = std::env::var("NOTECHAT_AVATAR_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "https://picsum.photos/seed/{user_id}/200".to_string());

        Self {
            event_buffer: 64,
            notification_buffer: 64,
            resubscribe_initial_backoff: Duration::from_millis(500),
            resubscribe_max_backoff: Duration::from_secs(30),
            name_cache_capacity: 256,
            seen_ids_capacity: 1024,
            preview_chars: 50,
            placeholder_author: "Member".to_string(),
            placeholder_group: "Group".to_string(),
            mention_title: "🔔 You were mentioned!".to_string(),
            avatar_url_template,
            record_unfocused_messages: false,
        }
    }

    /// Set the session event channel buffer (default: 64).
    pub fn event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity.max(1);
        self
    }

    /// Set the notification queue buffer (default: 64).
    pub fn notification_buffer(mut self, capacity: usize) -> Self {
        self.notification_buffer = capacity.max(1);
        self
    }

    /// Set the resubscribe backoff bounds (default: 500 ms → 30 s).
    pub fn resubscribe_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.resubscribe_initial_backoff = initial;
        self.resubscribe_max_backoff = max.max(initial);
        self
    }

    /// Set the name cache size (default: 256).
    pub fn name_cache_capacity(mut self, capacity: usize) -> Self {
        self.name_cache_capacity = capacity.max(1);
        self
    }

    /// Set how many recent message ids are remembered for dedup (default: 1024).
    pub fn seen_ids_capacity(mut self, capacity: usize) -> Self {
        self.seen_ids_capacity = capacity.max(1);
        self
    }

    /// Set the notification preview length in characters (default: 50).
    pub fn preview_chars(mut self, chars: usize) -> Self {
        self.preview_chars = chars;
        self
    }

    /// Set the fallback author and group labels.
    pub fn placeholders(mut self, author: impl Into<String>, group: impl Into<String>) -> Self {
        self.placeholder_author = author.into();
        self.placeholder_group = group.into();
        self
    }

    /// Set the title of mention notifications.
    pub fn mention_title(mut self, title: impl Into<String>) -> Self {
        self.mention_title = title.into();
        self
    }

    /// Set the avatar template; `{user_id}` is replaced by the author id.
    pub fn avatar_url_template(mut self, template: impl Into<String>) -> Self {
        self.avatar_url_template = template.into();
        self
    }

    /// Merge messages of unfocused groups into their transcripts too
    /// (default: false, only the focused transcript grows).
    pub fn record_unfocused_messages(mut self, enabled: bool) -> Self {
        self.record_unfocused_messages = enabled;
        self
    }

    /// Avatar reference for a remote author.
    pub fn avatar_for(&self, user_id: &UserId) -> String {
        self.avatar_url_template
            .replace(USER_ID_PLACEHOLDER, user_id.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::new().avatar_url_template("https://a/{user_id}.png");
        assert_eq!(config.preview_chars, 50);
        assert_eq!(config.placeholder_author, "Member");
        assert!(!config.record_unfocused_messages);
        assert_eq!(config.resubscribe_initial_backoff, Duration::from_millis(500));
    }

    #[test]
    fn avatar_substitution() {
        let config = ClientConfig::new().avatar_url_template("https://a/{user_id}/200");
        assert_eq!(config.avatar_for(&UserId::from("u-7")), "https://a/u-7/200");
    }

    #[test]
    fn backoff_max_never_below_initial() {
        let config = ClientConfig::new()
            .resubscribe_backoff(Duration::from_secs(5), Duration::from_secs(1));
        assert_eq!(config.resubscribe_max_backoff, Duration::from_secs(5));
    }

    #[test]
    fn zero_capacities_are_clamped() {
        let config = ClientConfig::new().event_buffer(0).name_cache_capacity(0);
        assert_eq!(config.event_buffer, 1);
        assert_eq!(config.name_cache_capacity, 1);
    }
}
