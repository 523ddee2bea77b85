//! Error types for session and roster management
//!
//! Storage failures are split by direction (`LoadError`, `SaveError`) and then
//! folded into the per-operation errors returned by the session manager.
//! `RostraError` unifies them all for callers that just want one type.

use std::fmt;

use crate::storage::StorageLocation;

// ----------------------------------------------------------------------------
// Storage Errors
// ----------------------------------------------------------------------------

/// Failure to read an entity or roster back from storage
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Nothing has been persisted at this location yet (first use)
    #[error("No stored data at {location}")]
    NotFound { location: StorageLocation },

    #[error("I/O error reading {location}: {source}")]
    Io {
        location: StorageLocation,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt data at {location}: {reason}")]
    CorruptData {
        location: StorageLocation,
        reason: String,
    },
}

impl LoadError {
    /// Whether this is the benign "nothing stored yet" case
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::NotFound { .. })
    }

    /// Location the failed load was reading from
    pub fn location(&self) -> &StorageLocation {
        match self {
            LoadError::NotFound { location }
            | LoadError::Io { location, .. }
            | LoadError::CorruptData { location, .. } => location,
        }
    }

    /// Create a corrupt data error with a reason
    pub fn corrupt<T: Into<String>>(location: StorageLocation, reason: T) -> Self {
        LoadError::CorruptData {
            location,
            reason: reason.into(),
        }
    }
}

/// Failure to write an entity or roster to storage
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("I/O error writing {location}: {source}")]
    Io {
        location: StorageLocation,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize data for {location}: {reason}")]
    Serialization {
        location: StorageLocation,
        reason: String,
    },
}

impl SaveError {
    /// Location the failed save was writing to
    pub fn location(&self) -> &StorageLocation {
        match self {
            SaveError::Io { location, .. } | SaveError::Serialization { location, .. } => location,
        }
    }
}

// ----------------------------------------------------------------------------
// Session Errors
// ----------------------------------------------------------------------------

/// Reasons a session could not be started
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("Invalid session id: {reason}")]
    InvalidId { reason: String },

    /// The local user could not be loaded for a reason other than "not found"
    #[error("Failed to load local user: {0}")]
    LocaleLoad(#[source] LoadError),

    /// Roster load failed and the session is configured to treat that as fatal
    #[error("Failed to load roster: {0}")]
    RosterLoad(#[source] LoadError),
}

/// Persistence failures reported by `SessionManager::clean`
///
/// In-memory state has already been released when one of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("Failed to save local user: {0}")]
    Locale(#[source] SaveError),

    #[error("Failed to save roster: {0}")]
    Roster(#[source] SaveError),

    #[error("Failed to save local user ({locale}) and roster ({roster})")]
    Both { locale: SaveError, roster: SaveError },
}

impl PersistError {
    /// Combine the outcome of the two saves into a single error, if any failed
    pub(crate) fn from_outcomes(
        locale: core::result::Result<(), SaveError>,
        roster: core::result::Result<(), SaveError>,
    ) -> core::result::Result<(), PersistError> {
        match (locale, roster) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(locale), Ok(())) => Err(PersistError::Locale(locale)),
            (Ok(()), Err(roster)) => Err(PersistError::Roster(roster)),
            (Err(locale), Err(roster)) => Err(PersistError::Both { locale, roster }),
        }
    }
}

/// Roster mutation failures; the roster is left untouched when returned
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RosterError {
    #[error("Invalid roster id {id:?}: {reason}")]
    InvalidId { id: String, reason: String },

    #[error("Roster entry already exists: {id}")]
    AlreadyExists { id: String },

    #[error("Roster entry not found: {id}")]
    RosterEntryNotFound { id: String },

    #[error("No active session")]
    NoActiveSession,
}

impl RosterError {
    /// Create an invalid id error with a reason
    pub fn invalid_id<I: Into<String>, R: Into<String>>(id: I, reason: R) -> Self {
        RosterError::InvalidId {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create a roster entry not found error
    pub fn not_found<I: Into<String>>(id: I) -> Self {
        RosterError::RosterEntryNotFound { id: id.into() }
    }
}

// ----------------------------------------------------------------------------
// Operation Errors
// ----------------------------------------------------------------------------

/// Opaque error produced by a roster operation
///
/// The session manager never inspects it; it is handed back to the caller of
/// `process_roster` exactly as the operation produced it.
pub struct OperationError {
    inner: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl OperationError {
    /// Wrap any error value
    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            inner: Box::new(error),
        }
    }

    /// Create an operation error from a plain message
    pub fn msg<T: Into<String>>(message: T) -> Self {
        let message: String = message.into();
        Self {
            inner: message.into(),
        }
    }

    /// Borrow the wrapped error
    pub fn get_ref(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        &*self.inner
    }

    /// Attempt to recover the concrete error the operation produced
    pub fn downcast<E: std::error::Error + 'static>(self) -> core::result::Result<E, Self> {
        match self.inner.downcast::<E>() {
            Ok(error) => Ok(*error),
            Err(inner) => Err(Self { inner }),
        }
    }

    /// Consume and return the boxed error
    pub fn into_inner(self) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self.inner
    }
}

impl fmt::Debug for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OperationError").field(&self.inner).finish()
    }
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl std::error::Error for OperationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

// ----------------------------------------------------------------------------
// Unified Error
// ----------------------------------------------------------------------------

/// Umbrella error for callers that do not care which operation failed
#[derive(Debug, thiserror::Error)]
pub enum RostraError {
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Save error: {0}")]
    Save(#[from] SaveError),

    #[error("Init error: {0}")]
    Init(#[from] InitError),

    #[error("Persist error: {0}")]
    Persist(#[from] PersistError),

    #[error("Roster error: {0}")]
    Roster(#[from] RosterError),

    #[error("Operation error: {0}")]
    Operation(#[from] OperationError),

    /// Configuration error
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },
}

impl RostraError {
    /// Create a configuration error with a reason
    pub fn config_error<T: Into<String>>(reason: T) -> Self {
        RostraError::Configuration {
            reason: reason.into(),
        }
    }
}

// ----------------------------------------------------------------------------
// Type Aliases
// ----------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, RostraError>;
