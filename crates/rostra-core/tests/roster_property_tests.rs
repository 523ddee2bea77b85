//! Property-based tests for roster mutation and persistence invariants

mod test_utils;

use std::collections::BTreeSet;

use proptest::prelude::*;
use rostra_core::*;
use test_utils::manager;

/// Generate a plausible contact id
fn arb_contact_id() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9._-]{0,15}(@[a-z]{1,8}\\.org)?").unwrap()
}

/// Generate a set of distinct contact ids that never collides with the local user
fn arb_contact_ids() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set(arb_contact_id(), 0..24)
        .prop_map(|ids| ids.into_iter().filter(|id| id != "me").collect())
}

fn arb_status() -> impl Strategy<Value = Status> {
    prop_oneof![
        Just(Status::Online),
        Just(Status::Away),
        Just(Status::Busy),
        Just(Status::Invisible),
        Just(Status::Offline),
    ]
}

/// Generate a fully populated user
fn arb_user() -> impl Strategy<Value = BasicUser> {
    (
        arb_contact_id(),
        proptest::option::of("[A-Za-z ]{1,20}"),
        arb_status(),
        proptest::option::of(".{0,40}"),
        prop::collection::btree_map("[a-z]{1,8}", "[a-z0-9]{0,8}", 0..4),
    )
        .prop_map(|(id, nickname, status, status_text, attributes)| BasicUser {
            id,
            nickname,
            status,
            status_text,
            attributes,
        })
}

proptest! {
    /// Property: adding a new id grows the roster by one and marks the session modified
    #[test]
    fn add_grows_roster_by_one(ids in arb_contact_ids(), extra in arb_contact_id()) {
        prop_assume!(!ids.contains(&extra) && extra != "me");

        let gateway = MemoryGateway::<BasicUser>::new();
        let mut manager = manager(&gateway);
        manager.init("me").unwrap();
        for id in &ids {
            manager.add_user_info_roster(id).unwrap();
        }
        manager.set_modify(false);

        let before = manager.roster_len();
        let handle = manager.add_user_info_roster(&extra).unwrap();
        prop_assert_eq!(manager.roster_len(), before + 1);
        prop_assert!(manager.is_modified());
        let looked_up = manager.get_user_info_roster(&extra).unwrap();
        prop_assert!(std::rc::Rc::ptr_eq(&handle, &looked_up));
    }

    /// Property: removing a present id shrinks the roster by one
    #[test]
    fn remove_shrinks_roster_by_one(ids in arb_contact_ids()) {
        let gateway = MemoryGateway::<BasicUser>::new();
        let mut manager = manager(&gateway);
        manager.init("me").unwrap();
        for id in &ids {
            manager.add_user_info_roster(id).unwrap();
        }

        let mut remaining = ids.len();
        for id in &ids {
            manager.remove_user_info_roster(id).unwrap();
            remaining -= 1;
            prop_assert_eq!(manager.roster_len(), remaining);
            prop_assert!(manager.get_user_info_roster(id).is_none());
        }
    }

    /// Property: a saved roster reloads with the same ids and field-equivalent entities
    #[test]
    fn roster_survives_logout(users in prop::collection::vec(arb_user(), 0..16)) {
        let gateway = MemoryGateway::<BasicUser>::new();
        let mut manager = manager(&gateway);
        manager.init("me").unwrap();

        let mut expected = std::collections::BTreeMap::new();
        for user in users.into_iter().filter(|user| user.id != "me") {
            if expected.contains_key(&user.id) {
                continue;
            }
            let handle = manager.add_user_info_roster(&user.id).unwrap();
            *handle.borrow_mut() = user.clone();
            expected.insert(user.id.clone(), user);
        }
        manager.set_modify(true);
        manager.clean().unwrap();

        manager.init("me").unwrap();
        prop_assert_eq!(manager.roster_ids(), expected.keys().cloned().collect::<Vec<_>>());
        for (id, user) in &expected {
            let loaded = manager.get_user_info_roster(id).unwrap();
            prop_assert_eq!(&*loaded.borrow(), user);
        }
    }

    /// Property: the local user round-trips through the gateway unchanged
    #[test]
    fn locale_round_trip(user in arb_user()) {
        let mut gateway = MemoryGateway::<BasicUser>::new();
        gateway.save_locale(&user).unwrap();
        let loaded = gateway.load_locale(&user.id).unwrap();
        prop_assert_eq!(loaded, user);
    }

    /// Property: CountMatching agrees with a direct count for any roster
    #[test]
    fn count_matching_agrees(statuses in prop::collection::vec(arb_status(), 0..32)) {
        let gateway = MemoryGateway::<BasicUser>::new();
        let mut manager = manager(&gateway);
        manager.init("me").unwrap();
        for (index, status) in statuses.iter().enumerate() {
            manager
                .add_user_info_roster(&format!("contact{}", index))
                .unwrap()
                .borrow_mut()
                .status = *status;
        }

        let expected = statuses.iter().filter(|status| **status == Status::Online).count();
        let counted = manager
            .process_roster(CountMatching, |user: &BasicUser| user.status == Status::Online)
            .unwrap();
        prop_assert_eq!(counted, expected);
    }

    /// Property: failed mutations never change size or the modify flag
    #[test]
    fn failed_mutations_leave_state(ids in arb_contact_ids(), missing in arb_contact_id()) {
        prop_assume!(!ids.contains(&missing));

        let gateway = MemoryGateway::<BasicUser>::new();
        let mut manager = manager(&gateway);
        manager.init("me").unwrap();
        for id in &ids {
            manager.add_user_info_roster(id).unwrap();
        }
        manager.set_modify(false);
        let before = manager.roster_len();

        prop_assert!(manager.add_user_info_roster("").is_err());
        prop_assert!(manager.remove_user_info_roster(&missing).is_err());
        prop_assert_eq!(manager.roster_len(), before);
        prop_assert!(!manager.is_modified());
    }
}
