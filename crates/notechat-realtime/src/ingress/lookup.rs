//! Author / group name resolution for inbound messages.
//!
//! Successful lookups are cached (LRU). A failed lookup never aborts the
//! pipeline: the configured placeholder is returned and the failure is
//! counted. Placeholders are not cached, so the next event retries.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use crate::backend::{select_single, Backend, Filter};
use crate::config::ClientConfig;
use crate::error::RealtimeError;
use crate::metrics::IngressMetrics;
use crate::types::{GroupId, UserId, GROUPS, PROFILES};

pub struct NameResolver {
    backend: Arc<dyn Backend>,
    authors: LruCache<UserId, String>,
    groups: LruCache<GroupId, String>,
    placeholder_author: String,
    placeholder_group: String,
    metrics: Arc<IngressMetrics>,
}

impl NameResolver {
    pub fn new(
        backend: Arc<dyn Backend>,
        config: &ClientConfig,
        metrics: Arc<IngressMetrics>,
    ) -> Self {
        let capacity = NonZeroUsize::new(config.name_cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            backend,
            authors: LruCache::new(capacity),
            groups: LruCache::new(capacity),
            placeholder_author: config.placeholder_author.clone(),
            placeholder_group: config.placeholder_group.clone(),
            metrics,
        }
    }

    /// Display name of a user, or the author placeholder.
    pub async fn author_name(&mut self, user_id: &UserId) -> String {
        if let Some(name) = self.authors.get(user_id) {
            return name.clone();
        }
        match self.lookup(PROFILES, user_id.as_ref()).await {
            Ok(name) => {
                self.authors.put(user_id.clone(), name.clone());
                name
            }
            Err(e) => {
                self.metrics.lookup_fallbacks.inc();
                tracing::debug!(user_id = %user_id, "ingress: author lookup failed: {e}");
                self.placeholder_author.clone()
            }
        }
    }

    /// Name of a group, or the group placeholder.
    pub async fn group_name(&mut self, group_id: &GroupId) -> String {
        if let Some(name) = self.groups.get(group_id) {
            return name.clone();
        }
        match self.lookup(GROUPS, group_id.as_ref()).await {
            Ok(name) => {
                self.groups.put(group_id.clone(), name.clone());
                name
            }
            Err(e) => {
                self.metrics.lookup_fallbacks.inc();
                tracing::debug!(group_id = %group_id, "ingress: group lookup failed: {e}");
                self.placeholder_group.clone()
            }
        }
    }

    async fn lookup(&self, relation: &str, id: &str) -> Result<String, RealtimeError> {
        let filter = Filter::all().eq("id", id);
        let row = select_single(self.backend.as_ref(), relation, &filter).await?;
        row.get("name")
            .and_then(|v| v.as_str())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .ok_or_else(|| RealtimeError::malformed(format!("{relation} row {id} has no name")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;
    use serde_json::json;

    fn resolver(backend: Arc<MemoryBackend>) -> (NameResolver, Arc<IngressMetrics>) {
        let metrics = Arc::new(IngressMetrics::default());
        let r = NameResolver::new(backend, &ClientConfig::new(), metrics.clone());
        (r, metrics)
    }

    #[tokio::test]
    async fn resolves_and_caches() {
        let backend = Arc::new(MemoryBackend::new());
        backend.seed(PROFILES, json!({"id": "u-bob", "name": "Bob"}));
        backend.seed(GROUPS, json!({"id": "g-1", "name": "Book Club"}));
        let (mut r, metrics) = resolver(backend.clone());

        assert_eq!(r.author_name(&UserId::from("u-bob")).await, "Bob");
        assert_eq!(r.group_name(&GroupId::from("g-1")).await, "Book Club");

        // Served from cache even when the store goes away.
        backend.set_fail_selects(PROFILES, true);
        assert_eq!(r.author_name(&UserId::from("u-bob")).await, "Bob");
        assert_eq!(metrics.lookup_fallbacks.get(), 0);
    }

    #[tokio::test]
    async fn failures_degrade_to_placeholders() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set_fail_selects(PROFILES, true);
        let (mut r, metrics) = resolver(backend);

        assert_eq!(r.author_name(&UserId::from("u-x")).await, "Member");
        assert_eq!(r.group_name(&GroupId::from("g-missing")).await, "Group");
        assert_eq!(metrics.lookup_fallbacks.get(), 2);
    }

    #[tokio::test]
    async fn placeholder_not_cached() {
        let backend = Arc::new(MemoryBackend::new());
        let (mut r, _) = resolver(backend.clone());

        assert_eq!(r.author_name(&UserId::from("u-late")).await, "Member");
        backend.seed(PROFILES, json!({"id": "u-late", "name": "Late"}));
        assert_eq!(r.author_name(&UserId::from("u-late")).await, "Late");
    }

    #[tokio::test]
    async fn empty_name_uses_placeholder() {
        let backend = Arc::new(MemoryBackend::new());
        backend.seed(PROFILES, json!({"id": "u-anon", "name": ""}));
        let (mut r, _) = resolver(backend);
        assert_eq!(r.author_name(&UserId::from("u-anon")).await, "Member");
    }
}
