//! Shared helpers for session manager integration tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use rostra_core::{
    BasicUser, DefaultFactory, MemoryGateway, RosterEvent, SessionConfig, SessionManager,
};

/// Route `tracing` output through the test harness
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Manager over a shared memory gateway that never cleans implicitly
pub fn manager(gateway: &MemoryGateway<BasicUser>) -> SessionManager<BasicUser> {
    manager_with_config(gateway, SessionConfig::ephemeral())
}

pub fn manager_with_config(
    gateway: &MemoryGateway<BasicUser>,
    config: SessionConfig,
) -> SessionManager<BasicUser> {
    init_tracing();
    SessionManager::with_config(
        Box::new(DefaultFactory::<BasicUser>::new()),
        Box::new(gateway.clone()),
        config,
    )
}

/// Subscribe a recorder and return the shared list of received events
pub fn record_events(manager: &mut SessionManager<BasicUser>) -> Rc<RefCell<Vec<RosterEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    manager.subscribe(Box::new(move |event: &RosterEvent| {
        sink.borrow_mut().push(event.clone());
    }));
    events
}
