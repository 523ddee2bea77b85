//! User entities and the shared handles that point at them
//!
//! An entity is the profile of one identity: either the locally logged-in user
//! or a contact in the roster. The core only needs an id; protocols add the
//! rest of the fields.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// Entity Trait
// ----------------------------------------------------------------------------

/// Profile data for one identity
///
/// Implementations carry protocol-specific fields. The core reads and writes
/// the id only; everything else is opaque to it.
pub trait UserEntity: std::fmt::Debug {
    /// Unique, non-empty identifier (JID, account name, ...)
    fn id(&self) -> &str;

    /// Assign the identifier; called on freshly constructed entities
    fn set_id(&mut self, id: String);

    /// Name to show for this identity
    fn display_name(&self) -> &str {
        self.id()
    }
}

/// Shared, reference-counted handle to an entity
///
/// Containers and callers hold clones of the same handle. Removing an entry
/// from its container only drops the container's clone, so any handle a
/// caller still holds keeps a detached copy alive.
pub type UserHandle<E> = Rc<RefCell<E>>;

/// Wrap an entity in a fresh handle
pub fn new_handle<E>(entity: E) -> UserHandle<E> {
    Rc::new(RefCell::new(entity))
}

// ----------------------------------------------------------------------------
// Basic User
// ----------------------------------------------------------------------------

/// Presence state shared by most chat protocols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Online,
    Away,
    Busy,
    Invisible,
    Offline,
}

impl Default for Status {
    fn default() -> Self {
        Self::Offline
    }
}

/// Protocol-agnostic entity for simple protocols and tests
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicUser {
    /// Account identifier
    pub id: String,
    /// Self-chosen nickname
    pub nickname: Option<String>,
    /// Last known presence
    pub status: Status,
    /// Free-form status message
    pub status_text: Option<String>,
    /// Extra protocol attributes
    pub attributes: BTreeMap<String, String>,
}

impl BasicUser {
    /// Create an empty user with the given id
    pub fn new<T: Into<String>>(id: T) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Set nickname
    pub fn with_nickname<T: Into<String>>(mut self, nickname: T) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    /// Set presence status
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }
}

impl UserEntity for BasicUser {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.id)
    }
}
