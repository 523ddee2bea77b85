//! Rostra XMPP
//!
//! XMPP protocol plug-in for `rostra-core`: the `XmppUser` entity, a factory
//! for empty users and a file-system storage gateway.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod config;
pub mod envelope;
pub mod factory;
pub mod gateway;
pub mod user;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use config::FileGatewayConfig;
pub use factory::XmppUserFactory;
pub use gateway::{session_dir_name, FileGateway};
pub use user::{bare_jid, jid_domain, jid_node, Presence, Subscription, XmppUser};

use rostra_core::{SessionConfig, SessionManager};

/// Session manager for XMPP accounts backed by the file gateway
pub type XmppSessionManager = SessionManager<XmppUser>;

/// Build an XMPP session manager storing under `gateway_config`
pub fn session_manager(gateway_config: FileGatewayConfig, session_config: SessionConfig) -> XmppSessionManager {
    SessionManager::with_config(
        Box::new(XmppUserFactory::new()),
        Box::new(FileGateway::<XmppUser>::new(gateway_config)),
        session_config,
    )
}
