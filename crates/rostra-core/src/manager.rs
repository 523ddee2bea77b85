//! Session Manager
//!
//! Owns the logged-in user's profile and roster for the length of a login
//! session, loads them from a protocol's storage gateway at login and writes
//! them back at logout when something changed.

use tracing::{debug, error, info, warn};

use crate::config::{DuplicatePolicy, RosterLoadPolicy, SessionConfig};
use crate::entity::{new_handle, UserEntity, UserHandle};
use crate::errors::{InitError, LoadError, OperationError, PersistError, RosterError};
use crate::factory::EntityFactory;
use crate::observer::{ObserverId, ObserverRegistry, RosterEvent, RosterObserver};
use crate::operation::{RosterOperation, RosterView};
use crate::roster::{ModifyTracker, RosterStore};
use crate::storage::StorageGateway;

// ----------------------------------------------------------------------------
// Init Report
// ----------------------------------------------------------------------------

/// How one half of the session state was obtained during `init`
#[derive(Debug)]
pub enum LoadStatus {
    /// Read from storage
    Loaded,
    /// Nothing stored yet; started from an empty value
    Fresh,
    /// Stored data was unreadable; started from an empty value
    Degraded(LoadError),
    /// Session was already active for this id; state kept as is
    Retained,
}

impl LoadStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadStatus::Loaded)
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, LoadStatus::Fresh)
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, LoadStatus::Degraded(_))
    }
}

/// Outcome of a successful `init`
#[derive(Debug)]
pub struct InitReport {
    pub locale: LoadStatus,
    pub roster: LoadStatus,
    /// Persistence failure of the session implicitly cleaned by this `init`
    pub prior_clean: Option<PersistError>,
}

impl InitReport {
    fn retained() -> Self {
        Self {
            locale: LoadStatus::Retained,
            roster: LoadStatus::Retained,
            prior_clean: None,
        }
    }

    /// No local user was stored for this id before
    pub fn is_first_login(&self) -> bool {
        self.locale.is_fresh()
    }

    /// Roster load failure the caller may want to show the user
    pub fn warning(&self) -> Option<&LoadError> {
        match &self.roster {
            LoadStatus::Degraded(err) => Some(err),
            _ => None,
        }
    }
}

// ----------------------------------------------------------------------------
// Session Manager
// ----------------------------------------------------------------------------

struct ActiveSession<E> {
    id: String,
    locale: UserHandle<E>,
    roster: RosterStore<E>,
}

/// Session-scoped owner of the local user and the roster
///
/// Single-threaded: every call runs on the caller's thread and storage I/O
/// blocks until it completes. At most one session is active at a time.
pub struct SessionManager<E: UserEntity> {
    factory: Box<dyn EntityFactory<E>>,
    storage: Box<dyn StorageGateway<E>>,
    config: SessionConfig,
    session: Option<ActiveSession<E>>,
    tracker: ModifyTracker,
    observers: ObserverRegistry,
}

impl<E: UserEntity> SessionManager<E> {
    /// Create a manager with the default configuration
    pub fn new(factory: Box<dyn EntityFactory<E>>, storage: Box<dyn StorageGateway<E>>) -> Self {
        Self::with_config(factory, storage, SessionConfig::default())
    }

    /// Create a manager with custom configuration
    pub fn with_config(
        factory: Box<dyn EntityFactory<E>>,
        storage: Box<dyn StorageGateway<E>>,
        config: SessionConfig,
    ) -> Self {
        Self {
            factory,
            storage,
            config,
            session: None,
            tracker: ModifyTracker::new(),
            observers: ObserverRegistry::new(),
        }
    }

    // ----------------------------------------------------------------------------
    // Session Lifecycle
    // ----------------------------------------------------------------------------

    /// Start a session for local user `id`
    ///
    /// A missing local user or roster is a first login, not an error. An
    /// unreadable roster degrades to an empty one unless the configuration says
    /// otherwise; an unreadable local user aborts. A session already active for
    /// another id is cleaned first.
    pub fn init(&mut self, id: &str) -> Result<InitReport, InitError> {
        if id.trim().is_empty() {
            return Err(InitError::InvalidId {
                reason: "session id must not be empty".to_string(),
            });
        }

        if let Some(active) = &self.session {
            if active.id == id {
                debug!("Session for {} already active", id);
                return Ok(InitReport::retained());
            }
            info!("Switching session from {} to {}", active.id, id);
        }
        let prior_clean = self.clean().err();

        let (mut locale, locale_status) = match self.storage.load_locale(id) {
            Ok(entity) => (entity, LoadStatus::Loaded),
            Err(err) if err.is_not_found() => {
                info!("No stored profile for {}, starting fresh", id);
                (self.factory.new_user(), LoadStatus::Fresh)
            }
            Err(err) => {
                error!("Failed to load local user {}: {}", id, err);
                return Err(InitError::LocaleLoad(err));
            }
        };
        let mut locale_repaired = false;
        if locale.id() != id {
            if locale_status.is_loaded() {
                warn!("Stored profile id {:?} does not match session {}", locale.id(), id);
                locale_repaired = true;
            }
            locale.set_id(id.to_string());
        }

        let (mut roster, roster_status) = match self.storage.load_roster(id) {
            Ok(roster) => (roster, LoadStatus::Loaded),
            Err(err) if err.is_not_found() => (RosterStore::new(), LoadStatus::Fresh),
            Err(err) => match self.config.roster_load_policy {
                RosterLoadPolicy::Degrade => {
                    warn!("Failed to load roster for {}, continuing with empty roster: {}", id, err);
                    (RosterStore::new(), LoadStatus::Degraded(err))
                }
                RosterLoadPolicy::Fail => {
                    error!("Failed to load roster for {}: {}", id, err);
                    return Err(InitError::RosterLoad(err));
                }
            },
        };

        self.tracker.set(locale_repaired);
        if roster.remove(id).is_some() {
            warn!("Dropping local user {} from its own roster", id);
            self.tracker.mark();
        }

        info!("Session started for {} with {} contacts", id, roster.len());
        self.session = Some(ActiveSession {
            id: id.to_string(),
            locale: new_handle(locale),
            roster,
        });
        self.observers.notify(&RosterEvent::SessionStarted { id: id.to_string() });

        Ok(InitReport {
            locale: locale_status,
            roster: roster_status,
            prior_clean,
        })
    }

    /// End the session, saving it first if it was modified
    ///
    /// The local user is saved before the roster. Both saves are attempted even
    /// if the first fails. In-memory state is released whatever the outcome.
    pub fn clean(&mut self) -> Result<(), PersistError> {
        let Some(session) = self.session.take() else {
            self.tracker.clear();
            return Ok(());
        };

        let result = if self.tracker.is_modified() {
            {
                let mut locale = session.locale.borrow_mut();
                if locale.id() != session.id {
                    warn!("Local user id was changed to {:?}, restoring {}", locale.id(), session.id);
                    locale.set_id(session.id.clone());
                }
            }
            session.roster.restore_ids();
            let locale = self.storage.save_locale(&session.locale.borrow());
            let roster = self.storage.save_roster(&session.id, &session.roster);
            PersistError::from_outcomes(locale, roster)
        } else {
            debug!("Session for {} unmodified, nothing to save", session.id);
            Ok(())
        };

        match &result {
            Ok(()) => info!("Session ended for {}", session.id),
            Err(err) => error!("Session for {} ended with unsaved changes: {}", session.id, err),
        }

        self.tracker.clear();
        let ActiveSession { id, .. } = session;
        self.observers.notify(&RosterEvent::SessionEnded { id });

        result
    }

    /// Flag that in-memory state has (or has not) diverged from storage
    ///
    /// Callers editing entity fields through a handle use this so the next
    /// `clean` saves their edits.
    pub fn set_modify(&mut self, modified: bool) {
        self.tracker.set(modified);
    }

    pub fn is_modified(&self) -> bool {
        self.tracker.is_modified()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Id of the active session
    pub fn session_id(&self) -> Option<&str> {
        self.session.as_ref().map(|session| session.id.as_str())
    }

    // ----------------------------------------------------------------------------
    // Entity Access
    // ----------------------------------------------------------------------------

    /// Handle to the local user, if a session is active
    pub fn get_user_info_locale(&self) -> Option<UserHandle<E>> {
        self.session.as_ref().map(|session| session.locale.clone())
    }

    /// Handle to a roster entry
    pub fn get_user_info_roster(&self, id: &str) -> Option<UserHandle<E>> {
        self.session.as_ref().and_then(|session| session.roster.get(id))
    }

    pub fn roster_len(&self) -> usize {
        self.session.as_ref().map_or(0, |session| session.roster.len())
    }

    /// Sorted ids of every roster entry
    pub fn roster_ids(&self) -> Vec<String> {
        self.session
            .as_ref()
            .map(|session| session.roster.ids())
            .unwrap_or_default()
    }

    /// Build an empty entity without adding it anywhere
    pub fn new_user(&self) -> E {
        self.factory.new_user()
    }

    // ----------------------------------------------------------------------------
    // Roster Mutation
    // ----------------------------------------------------------------------------

    /// Add an empty contact with the given id and return its handle
    pub fn add_user_info_roster(&mut self, id: &str) -> Result<UserHandle<E>, RosterError> {
        if id.trim().is_empty() {
            return Err(RosterError::invalid_id(id, "id must not be empty"));
        }
        let session = self.session.as_mut().ok_or(RosterError::NoActiveSession)?;
        if session.id == id {
            return Err(RosterError::invalid_id(id, "local user cannot be a roster entry"));
        }

        if let Some(existing) = session.roster.get(id) {
            return match self.config.duplicate_policy {
                DuplicatePolicy::ReturnExisting => Ok(existing),
                DuplicatePolicy::Reject => Err(RosterError::AlreadyExists { id: id.to_string() }),
            };
        }

        let handle = session
            .roster
            .insert(self.factory.new_user_with_id(id))
            .ok_or_else(|| RosterError::AlreadyExists { id: id.to_string() })?;

        self.tracker.mark();
        debug!("Added {} to roster", id);
        self.observers.notify(&RosterEvent::EntryAdded { id: id.to_string() });
        Ok(handle)
    }

    /// Remove a contact from the roster
    ///
    /// Handles to the entry held elsewhere stay valid but are detached.
    pub fn remove_user_info_roster(&mut self, id: &str) -> Result<(), RosterError> {
        let session = self.session.as_mut().ok_or(RosterError::NoActiveSession)?;
        session
            .roster
            .remove(id)
            .ok_or_else(|| RosterError::not_found(id))?;

        self.tracker.mark();
        debug!("Removed {} from roster", id);
        self.observers.notify(&RosterEvent::EntryRemoved { id: id.to_string() });
        Ok(())
    }

    /// Run an operation over the roster with a caller-supplied context
    ///
    /// The result is returned untouched. Without an active session the
    /// operation sees an empty roster.
    pub fn process_roster<C, Op>(&self, mut operation: Op, context: C) -> Result<Op::Output, OperationError>
    where
        Op: RosterOperation<E, C>,
    {
        let empty;
        let roster = match &self.session {
            Some(session) => &session.roster,
            None => {
                empty = RosterStore::new();
                &empty
            }
        };
        operation.process(&RosterView::new(roster, &self.tracker), context)
    }

    // ----------------------------------------------------------------------------
    // Observers and Accessors
    // ----------------------------------------------------------------------------

    /// Register an observer for session and roster events
    pub fn subscribe(&mut self, observer: Box<dyn RosterObserver>) -> ObserverId {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The storage gateway, e.g. to resolve locations for display
    pub fn storage(&self) -> &dyn StorageGateway<E> {
        &*self.storage
    }
}

impl<E: UserEntity> Drop for SessionManager<E> {
    fn drop(&mut self) {
        if self.config.clean_on_drop && self.session.is_some() {
            // Errors are already logged by clean
            let _ = self.clean();
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
