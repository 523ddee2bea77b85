//! Change notifications for session and roster state

use std::fmt;

/// Something that happened to the session or its roster
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterEvent {
    /// A session became active for the given local id
    SessionStarted { id: String },
    /// The session for the given local id was cleaned
    SessionEnded { id: String },
    /// A contact was added to the roster
    EntryAdded { id: String },
    /// A contact was removed from the roster
    EntryRemoved { id: String },
}

/// Receives roster events
pub trait RosterObserver {
    fn on_event(&mut self, event: &RosterEvent);
}

impl<F: FnMut(&RosterEvent)> RosterObserver for F {
    fn on_event(&mut self, event: &RosterEvent) {
        self(event)
    }
}

/// Token returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Registered observers, notified in subscription order
#[derive(Default)]
pub struct ObserverRegistry {
    next_id: u64,
    observers: Vec<(ObserverId, Box<dyn RosterObserver>)>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Box<dyn RosterObserver>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    /// Returns whether an observer was removed
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    pub fn notify(&mut self, event: &RosterEvent) {
        for (_, observer) in self.observers.iter_mut() {
            observer.on_event(event);
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.observers.len())
            .finish()
    }
}
