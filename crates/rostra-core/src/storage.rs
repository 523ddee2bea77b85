//! Storage abstraction for session data
//!
//! Protocols implement `StorageGateway` to decide where the local user and the
//! roster live and how they are encoded. The session manager only ever talks
//! to this trait.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::entity::UserEntity;
use crate::errors::{LoadError, SaveError};
use crate::roster::RosterStore;

// ----------------------------------------------------------------------------
// Storage Location
// ----------------------------------------------------------------------------

/// Where a piece of session data lives (file path, database key, URI, ...)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StorageLocation(String);

impl StorageLocation {
    pub fn new<T: Into<String>>(location: T) -> Self {
        Self(location.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&std::path::Path> for StorageLocation {
    fn from(path: &std::path::Path) -> Self {
        Self(path.display().to_string())
    }
}

// ----------------------------------------------------------------------------
// Gateway Trait
// ----------------------------------------------------------------------------

/// Persistence boundary for the local user and the roster
///
/// Location functions must be deterministic and must map distinct ids to
/// distinct locations. Saving and then loading the same id must reproduce
/// field-equivalent entities; roster order is not preserved.
pub trait StorageGateway<E: UserEntity> {
    /// Location of the local user's profile for session `id`
    fn locale_location(&self, id: &str) -> StorageLocation;

    /// Location of the roster owned by session `id`
    fn roster_location(&self, id: &str) -> StorageLocation;

    /// Load the local user for session `id`
    fn load_locale(&self, id: &str) -> Result<E, LoadError>;

    /// Persist the local user, keyed by its own id
    fn save_locale(&mut self, entity: &E) -> Result<(), SaveError>;

    /// Load the roster owned by session `id`
    fn load_roster(&self, id: &str) -> Result<RosterStore<E>, LoadError>;

    /// Persist exactly the given roster for session `owner`
    fn save_roster(&mut self, owner: &str, roster: &RosterStore<E>) -> Result<(), SaveError>;
}

// ----------------------------------------------------------------------------
// Memory Gateway Implementation
// ----------------------------------------------------------------------------

/// Counters of gateway calls, for asserting on persistence behaviour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryGatewayStats {
    pub locale_loads: usize,
    pub locale_saves: usize,
    pub roster_loads: usize,
    pub roster_saves: usize,
}

#[derive(Debug)]
struct MemoryState<E> {
    locales: BTreeMap<StorageLocation, E>,
    rosters: BTreeMap<StorageLocation, Vec<E>>,
    corrupt: Vec<StorageLocation>,
    available: bool,
    stats: MemoryGatewayStats,
}

/// In-memory gateway for tests and storage-less deployments
///
/// Clones share the same backing state, so a test can keep one clone while the
/// session manager owns another.
#[derive(Debug)]
pub struct MemoryGateway<E> {
    state: Rc<RefCell<MemoryState<E>>>,
}

impl<E> Clone for MemoryGateway<E> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<E> Default for MemoryGateway<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> MemoryGateway<E> {
    /// Create an empty, available memory gateway
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(MemoryState {
                locales: BTreeMap::new(),
                rosters: BTreeMap::new(),
                corrupt: Vec::new(),
                available: true,
                stats: MemoryGatewayStats::default(),
            })),
        }
    }

    /// Toggle availability; an unavailable gateway fails every call with an I/O error
    pub fn set_available(&self, available: bool) {
        self.state.borrow_mut().available = available;
    }

    /// Make subsequent loads from `location` fail as corrupt data
    pub fn mark_corrupt(&self, location: StorageLocation) {
        self.state.borrow_mut().corrupt.push(location);
    }

    /// Snapshot of the call counters
    pub fn stats(&self) -> MemoryGatewayStats {
        self.state.borrow().stats
    }

    /// Number of sessions with a stored local user
    pub fn stored_locale_count(&self) -> usize {
        self.state.borrow().locales.len()
    }

    fn check_load(&self, location: &StorageLocation) -> Result<(), LoadError> {
        let state = self.state.borrow();
        if !state.available {
            return Err(LoadError::Io {
                location: location.clone(),
                source: unavailable(),
            });
        }
        if state.corrupt.contains(location) {
            return Err(LoadError::corrupt(location.clone(), "marked corrupt"));
        }
        Ok(())
    }

    fn check_save(&self, location: &StorageLocation) -> Result<(), SaveError> {
        if !self.state.borrow().available {
            return Err(SaveError::Io {
                location: location.clone(),
                source: unavailable(),
            });
        }
        Ok(())
    }
}

fn unavailable() -> std::io::Error {
    std::io::Error::other("Storage not available")
}

impl<E: UserEntity + Clone> StorageGateway<E> for MemoryGateway<E> {
    fn locale_location(&self, id: &str) -> StorageLocation {
        StorageLocation::new(format!("memory://locale/{}", id))
    }

    fn roster_location(&self, id: &str) -> StorageLocation {
        StorageLocation::new(format!("memory://roster/{}", id))
    }

    fn load_locale(&self, id: &str) -> Result<E, LoadError> {
        let location = self.locale_location(id);
        self.state.borrow_mut().stats.locale_loads += 1;
        self.check_load(&location)?;

        let state = self.state.borrow();
        state
            .locales
            .get(&location)
            .cloned()
            .ok_or(LoadError::NotFound { location })
    }

    fn save_locale(&mut self, entity: &E) -> Result<(), SaveError> {
        let location = self.locale_location(entity.id());
        self.state.borrow_mut().stats.locale_saves += 1;
        self.check_save(&location)?;

        let mut state = self.state.borrow_mut();
        state.corrupt.retain(|loc| loc != &location);
        state.locales.insert(location, entity.clone());
        Ok(())
    }

    fn load_roster(&self, id: &str) -> Result<RosterStore<E>, LoadError> {
        let location = self.roster_location(id);
        self.state.borrow_mut().stats.roster_loads += 1;
        self.check_load(&location)?;

        let state = self.state.borrow();
        let entries = state
            .rosters
            .get(&location)
            .cloned()
            .ok_or(LoadError::NotFound { location })?;
        Ok(RosterStore::from_entities(entries))
    }

    fn save_roster(&mut self, owner: &str, roster: &RosterStore<E>) -> Result<(), SaveError> {
        let location = self.roster_location(owner);
        self.state.borrow_mut().stats.roster_saves += 1;
        self.check_save(&location)?;

        let entries = roster.snapshot();
        let mut state = self.state.borrow_mut();
        state.corrupt.retain(|loc| loc != &location);
        state.rosters.insert(location, entries);
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
