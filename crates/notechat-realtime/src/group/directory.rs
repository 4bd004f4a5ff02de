/// GroupDirectory: the client's view of known groups.
///
/// Pure state, no I/O. The client persists changes through the backend and
/// then records the resulting group here.
use std::collections::HashMap;

use crate::group::types::Group;
use crate::types::{GroupId, UserId};

pub struct GroupDirectory {
    groups: HashMap<GroupId, Group>,
    /// Listing order, newest first.
    order: Vec<GroupId>,
}

impl GroupDirectory {
    pub fn new() -> Self {
        Self {
            groups: HashMap::new(),
            order: Vec::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────

    /// All groups in listing order.
    pub fn all(&self) -> Vec<&Group> {
        self.order.iter().filter_map(|id| self.groups.get(id)).collect()
    }

    pub fn get(&self, group_id: &GroupId) -> Option<&Group> {
        self.groups.get(group_id)
    }

    /// Groups `user_id` belongs to.
    pub fn joined_by(&self, user_id: &UserId) -> Vec<&Group> {
        self.all().into_iter().filter(|g| g.is_member(user_id)).collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    // ── Updates ──────────────────────────────────────────────────────────

    /// Replace the whole directory (initial load), keeping the given order.
    pub fn replace_all(&mut self, groups: Vec<Group>) {
        self.groups.clear();
        self.order.clear();
        for group in groups {
            if !self.groups.contains_key(&group.id) {
                self.order.push(group.id.clone());
            }
            self.groups.insert(group.id.clone(), group);
        }
    }

    /// Insert a new group at the top, or update an existing one in place.
    pub fn upsert(&mut self, group: Group) {
        if !self.groups.contains_key(&group.id) {
            self.order.insert(0, group.id.clone());
        }
        self.groups.insert(group.id.clone(), group);
    }
}

impl Default for GroupDirectory {
    fn default() -> Self {
        Self::new()
    }
}
