//! Rostra Core
//!
//! Session-scoped identity and roster management for chat clients that speak
//! more than one protocol. The crate owns the logged-in user's profile and the
//! contact roster for the length of a login session, persists them through a
//! protocol-supplied storage gateway, and tracks whether memory has diverged
//! from storage.
//!
//! Protocols plug in three things: an entity type (`UserEntity`), a factory
//! for empty entities (`EntityFactory`) and a persistence boundary
//! (`StorageGateway`).

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod config;
pub mod entity;
pub mod errors;
pub mod factory;
pub mod manager;
pub mod observer;
pub mod operation;
pub mod roster;
pub mod storage;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use config::{DuplicatePolicy, RosterLoadPolicy, SessionConfig};
pub use entity::{new_handle, BasicUser, Status, UserEntity, UserHandle};
pub use errors::{
    InitError, LoadError, OperationError, PersistError, Result, RosterError, RostraError,
    SaveError,
};
pub use factory::{DefaultFactory, EntityFactory};
pub use manager::{InitReport, LoadStatus, SessionManager};
pub use observer::{ObserverId, RosterEvent, RosterObserver};
pub use operation::{
    operation_fn, CollectIds, CountMatching, FnOperation, ForEachEntry, RosterOperation,
    RosterView,
};
pub use roster::{ModifyTracker, RosterStore};
pub use storage::{MemoryGateway, MemoryGatewayStats, StorageGateway, StorageLocation};
