//! In-memory roster and modification tracking

use std::cell::Cell;

use hashbrown::HashMap;
use tracing::warn;

use crate::entity::{new_handle, UserEntity, UserHandle};

// ----------------------------------------------------------------------------
// Roster Store
// ----------------------------------------------------------------------------

/// Contacts of the current session, keyed by entity id
///
/// Ids are unique. Iteration order is unspecified.
#[derive(Debug)]
pub struct RosterStore<E> {
    entries: HashMap<String, UserHandle<E>>,
}

impl<E> Default for RosterStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> RosterStore<E> {
    /// Create an empty roster
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Get a handle to the entry with the given id
    pub fn get(&self, id: &str) -> Option<UserHandle<E>> {
        self.entries.get(id).cloned()
    }

    /// Check whether an entry exists
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Remove an entry, returning the container's handle to it
    pub fn remove(&mut self, id: &str) -> Option<UserHandle<E>> {
        self.entries.remove(id)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterate over `(id, handle)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &UserHandle<E>)> {
        self.entries.iter().map(|(id, handle)| (id.as_str(), handle))
    }

    /// All entry ids, sorted for stable presentation
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl<E: UserEntity> RosterStore<E> {
    /// Build a roster from loaded entities
    ///
    /// Entities with an empty id are skipped; on duplicate ids the first wins.
    pub fn from_entities<I: IntoIterator<Item = E>>(entities: I) -> Self {
        let mut roster = Self::new();
        for entity in entities {
            let id = entity.id().to_string();
            if id.is_empty() {
                warn!("Skipping roster entry with empty id");
                continue;
            }
            if roster.contains(&id) {
                warn!("Skipping duplicate roster entry {}", id);
                continue;
            }
            roster.entries.insert(id, new_handle(entity));
        }
        roster
    }

    /// Write each entry's key back into its entity id
    ///
    /// Handles let callers rewrite an entity's id while the roster still files
    /// it under the old key. Returns the number of entries repaired.
    pub fn restore_ids(&self) -> usize {
        let mut repaired = 0;
        for (key, handle) in &self.entries {
            let mut entity = handle.borrow_mut();
            if entity.id() != key.as_str() {
                warn!("Roster entry {} had its id changed to {:?}, restoring", key, entity.id());
                entity.set_id(key.clone());
                repaired += 1;
            }
        }
        repaired
    }

    /// Insert an entity under its own id
    ///
    /// Returns the new handle, or `None` without touching the roster if the id
    /// is already present.
    pub fn insert(&mut self, entity: E) -> Option<UserHandle<E>> {
        let id = entity.id().to_string();
        if self.entries.contains_key(&id) {
            return None;
        }
        let handle = new_handle(entity);
        self.entries.insert(id, handle.clone());
        Some(handle)
    }
}

impl<E: Clone> RosterStore<E> {
    /// Clone every entity out of the roster
    pub fn snapshot(&self) -> Vec<E> {
        self.entries
            .values()
            .map(|handle| handle.borrow().clone())
            .collect()
    }
}

// ----------------------------------------------------------------------------
// Modify Tracker
// ----------------------------------------------------------------------------

/// Dirty flag recording whether in-memory state differs from storage
///
/// Interior mutability lets roster operations, which only see a shared view,
/// mark the session as modified.
#[derive(Debug, Default)]
pub struct ModifyTracker {
    modified: Cell<bool>,
}

impl ModifyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_modified(&self) -> bool {
        self.modified.get()
    }

    pub fn set(&self, modified: bool) {
        self.modified.set(modified);
    }

    pub fn mark(&self) {
        self.modified.set(true);
    }

    /// Reset after a successful save
    pub fn clear(&self) {
        self.modified.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::BasicUser;

    #[test]
    fn test_from_entities_dedup_and_skip_empty() {
        let roster = RosterStore::from_entities(vec![
            BasicUser::new("bob").with_nickname("first"),
            BasicUser::new(""),
            BasicUser::new("bob").with_nickname("second"),
            BasicUser::new("carol"),
        ]);

        assert_eq!(roster.len(), 2);
        assert_eq!(roster.ids(), vec!["bob".to_string(), "carol".to_string()]);
        let bob = roster.get("bob").unwrap();
        assert_eq!(bob.borrow().nickname.as_deref(), Some("first"));
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut roster = RosterStore::new();
        assert!(roster.insert(BasicUser::new("bob")).is_some());
        assert!(roster.insert(BasicUser::new("bob")).is_none());
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_removed_handle_is_detached() {
        let mut roster = RosterStore::new();
        let handle = roster.insert(BasicUser::new("bob")).unwrap();

        roster.remove("bob");
        assert!(roster.get("bob").is_none());

        handle.borrow_mut().nickname = Some("Bobby".to_string());
        assert_eq!(handle.borrow().nickname.as_deref(), Some("Bobby"));
        assert!(roster.is_empty());
    }

    #[test]
    fn test_restore_ids_rekeys_edited_entries() {
        let mut roster = RosterStore::new();
        let bob = roster.insert(BasicUser::new("bob")).unwrap();
        roster.insert(BasicUser::new("carol")).unwrap();

        bob.borrow_mut().id = "carol".to_string();
        assert_eq!(roster.restore_ids(), 1);
        assert_eq!(bob.borrow().id, "bob");
        assert_eq!(roster.restore_ids(), 0);

        let reloaded = RosterStore::from_entities(roster.snapshot());
        assert_eq!(reloaded.ids(), vec!["bob".to_string(), "carol".to_string()]);
    }

    #[test]
    fn test_modify_tracker() {
        let tracker = ModifyTracker::new();
        assert!(!tracker.is_modified());
        tracker.mark();
        assert!(tracker.is_modified());
        tracker.clear();
        assert!(!tracker.is_modified());
        tracker.set(true);
        assert!(tracker.is_modified());
    }
}
