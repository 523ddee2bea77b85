//! Pluggable roster operations
//!
//! Batch queries and bulk edits over the roster are written as operations and
//! run through `SessionManager::process_roster`, so the manager does not grow a
//! method for every new question callers want to ask of the roster.

use core::ops::Deref;

use crate::entity::UserEntity;
use crate::errors::OperationError;
use crate::roster::{ModifyTracker, RosterStore};

// ----------------------------------------------------------------------------
// Roster View
// ----------------------------------------------------------------------------

/// What an operation sees: the roster plus the session's dirty flag
pub struct RosterView<'a, E> {
    roster: &'a RosterStore<E>,
    tracker: &'a ModifyTracker,
}

impl<'a, E> RosterView<'a, E> {
    pub fn new(roster: &'a RosterStore<E>, tracker: &'a ModifyTracker) -> Self {
        Self { roster, tracker }
    }

    /// The underlying roster mapping
    pub fn roster(&self) -> &'a RosterStore<E> {
        self.roster
    }

    /// Record that the operation changed entity fields in place
    pub fn mark_modified(&self) {
        self.tracker.mark();
    }
}

impl<E> Deref for RosterView<'_, E> {
    type Target = RosterStore<E>;

    fn deref(&self) -> &Self::Target {
        self.roster
    }
}

// ----------------------------------------------------------------------------
// Operation Trait
// ----------------------------------------------------------------------------

/// A unit of work applied to the roster with a caller-supplied context
pub trait RosterOperation<E, C> {
    type Output;

    fn process(&mut self, roster: &RosterView<'_, E>, context: C) -> Result<Self::Output, OperationError>;
}

impl<E, C, T: RosterOperation<E, C> + ?Sized> RosterOperation<E, C> for &mut T {
    type Output = T::Output;

    fn process(&mut self, roster: &RosterView<'_, E>, context: C) -> Result<Self::Output, OperationError> {
        (**self).process(roster, context)
    }
}

/// Operation backed by a closure; see [`operation_fn`]
#[derive(Debug, Clone, Copy)]
pub struct FnOperation<F> {
    f: F,
}

/// Turn a closure into a roster operation
pub fn operation_fn<E, C, T, F>(f: F) -> FnOperation<F>
where
    F: FnMut(&RosterView<'_, E>, C) -> Result<T, OperationError>,
{
    FnOperation { f }
}

impl<E, C, T, F> RosterOperation<E, C> for FnOperation<F>
where
    F: FnMut(&RosterView<'_, E>, C) -> Result<T, OperationError>,
{
    type Output = T;

    fn process(&mut self, roster: &RosterView<'_, E>, context: C) -> Result<T, OperationError> {
        (self.f)(roster, context)
    }
}

// ----------------------------------------------------------------------------
// Built-in Operations
// ----------------------------------------------------------------------------

/// Count entries matching the predicate passed as context
#[derive(Debug, Clone, Copy, Default)]
pub struct CountMatching;

impl<E, P> RosterOperation<E, P> for CountMatching
where
    E: UserEntity,
    P: Fn(&E) -> bool,
{
    type Output = usize;

    fn process(&mut self, roster: &RosterView<'_, E>, predicate: P) -> Result<usize, OperationError> {
        Ok(roster
            .iter()
            .filter(|(_, handle)| predicate(&handle.borrow()))
            .count())
    }
}

/// Collect the sorted ids of entries matching the predicate passed as context
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectIds;

impl<E, P> RosterOperation<E, P> for CollectIds
where
    E: UserEntity,
    P: Fn(&E) -> bool,
{
    type Output = Vec<String>;

    fn process(&mut self, roster: &RosterView<'_, E>, predicate: P) -> Result<Vec<String>, OperationError> {
        let mut ids: Vec<String> = roster
            .iter()
            .filter(|(_, handle)| predicate(&handle.borrow()))
            .map(|(id, _)| id.to_string())
            .collect();
        ids.sort();
        Ok(ids)
    }
}

/// Apply an in-place edit to every entry
///
/// The context closure returns whether it changed the entity. If any entry
/// changed, the session is marked modified. Outputs the number changed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForEachEntry;

impl<E, F> RosterOperation<E, F> for ForEachEntry
where
    E: UserEntity,
    F: FnMut(&mut E) -> bool,
{
    type Output = usize;

    fn process(&mut self, roster: &RosterView<'_, E>, mut edit: F) -> Result<usize, OperationError> {
        let mut changed = 0;
        for (_, handle) in roster.iter() {
            if edit(&mut handle.borrow_mut()) {
                changed += 1;
            }
        }
        if changed > 0 {
            roster.mark_modified();
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{BasicUser, Status};

    fn sample_roster() -> RosterStore<BasicUser> {
        RosterStore::from_entities(vec![
            BasicUser::new("bob").with_status(Status::Online),
            BasicUser::new("carol").with_status(Status::Away),
            BasicUser::new("dave").with_status(Status::Online),
        ])
    }

    #[test]
    fn test_count_matching() {
        let roster = sample_roster();
        let tracker = ModifyTracker::new();
        let view = RosterView::new(&roster, &tracker);

        let online = CountMatching
            .process(&view, |user: &BasicUser| user.status == Status::Online)
            .unwrap();
        assert_eq!(online, 2);
        assert!(!tracker.is_modified());
    }

    #[test]
    fn test_collect_ids() {
        let roster = sample_roster();
        let tracker = ModifyTracker::new();
        let view = RosterView::new(&roster, &tracker);

        let ids = CollectIds
            .process(&view, |user: &BasicUser| user.status == Status::Online)
            .unwrap();
        assert_eq!(ids, vec!["bob".to_string(), "dave".to_string()]);
    }

    #[test]
    fn test_for_each_entry_marks_modified() {
        let roster = sample_roster();
        let tracker = ModifyTracker::new();
        let view = RosterView::new(&roster, &tracker);

        let changed = ForEachEntry
            .process(&view, |user: &mut BasicUser| {
                if user.status == Status::Away {
                    user.status = Status::Offline;
                    true
                } else {
                    false
                }
            })
            .unwrap();
        assert_eq!(changed, 1);
        assert!(tracker.is_modified());
        assert_eq!(roster.get("carol").unwrap().borrow().status, Status::Offline);
    }

    #[test]
    fn test_closure_operation_error_passthrough() {
        let roster = sample_roster();
        let tracker = ModifyTracker::new();
        let view = RosterView::new(&roster, &tracker);

        let mut op = operation_fn(|view: &RosterView<'_, BasicUser>, wanted: &str| {
            match view.get(wanted) {
                Some(handle) => {
                    let status = handle.borrow().status;
                    Ok(status)
                }
                None => Err(OperationError::msg(format!("missing {}", wanted))),
            }
        });

        assert_eq!(op.process(&view, "bob").unwrap(), Status::Online);
        let err = op.process(&view, "zoe").unwrap_err();
        assert_eq!(err.to_string(), "missing zoe");
    }
}
