//! XMPP user entity

use std::collections::BTreeSet;

use rostra_core::UserEntity;
use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// Presence and Subscription
// ----------------------------------------------------------------------------

/// Presence `show` state, plus `Unavailable` for an offline contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Presence {
    Available,
    Chat,
    Away,
    ExtendedAway,
    DoNotDisturb,
    Unavailable,
}

impl Default for Presence {
    fn default() -> Self {
        Self::Unavailable
    }
}

impl Presence {
    pub fn is_online(&self) -> bool {
        !matches!(self, Presence::Unavailable)
    }
}

/// Roster subscription state (RFC 6121 section 2.1.2.5)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subscription {
    None,
    To,
    From,
    Both,
}

impl Default for Subscription {
    fn default() -> Self {
        Self::None
    }
}

impl Subscription {
    /// We receive the contact's presence
    pub fn receives_presence(&self) -> bool {
        matches!(self, Subscription::To | Subscription::Both)
    }

    /// The contact receives our presence
    pub fn sends_presence(&self) -> bool {
        matches!(self, Subscription::From | Subscription::Both)
    }
}

// ----------------------------------------------------------------------------
// JID Helpers
// ----------------------------------------------------------------------------

/// Strip the resource part: `user@host/res` -> `user@host`
pub fn bare_jid(jid: &str) -> &str {
    jid.split_once('/').map_or(jid, |(bare, _)| bare)
}

/// Node (local) part of a JID, if any
pub fn jid_node(jid: &str) -> Option<&str> {
    bare_jid(jid).split_once('@').map(|(node, _)| node)
}

/// Domain part of a JID
pub fn jid_domain(jid: &str) -> &str {
    let bare = bare_jid(jid);
    bare.split_once('@').map_or(bare, |(_, domain)| domain)
}

// ----------------------------------------------------------------------------
// XMPP User
// ----------------------------------------------------------------------------

/// Profile and roster item of an XMPP account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XmppUser {
    /// Bare JID
    pub jid: String,
    /// Roster name or vCard nickname
    pub nickname: Option<String>,
    /// Last received presence
    pub presence: Presence,
    /// Presence status message
    pub status_text: Option<String>,
    /// Roster groups
    pub groups: BTreeSet<String>,
    pub subscription: Subscription,
    /// XEP-0153 avatar hash
    pub avatar_hash: Option<String>,
}

impl XmppUser {
    pub fn new<T: Into<String>>(jid: T) -> Self {
        Self {
            jid: jid.into(),
            ..Self::default()
        }
    }

    /// Add to a roster group; returns false if already a member
    pub fn add_group<T: Into<String>>(&mut self, group: T) -> bool {
        self.groups.insert(group.into())
    }

    /// Remove from a roster group; returns false if not a member
    pub fn remove_group(&mut self, group: &str) -> bool {
        self.groups.remove(group)
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.groups.contains(group)
    }

    pub fn is_online(&self) -> bool {
        self.presence.is_online()
    }

    pub fn domain(&self) -> &str {
        jid_domain(&self.jid)
    }
}

impl UserEntity for XmppUser {
    fn id(&self) -> &str {
        &self.jid
    }

    fn set_id(&mut self, id: String) {
        self.jid = id;
    }

    fn display_name(&self) -> &str {
        self.nickname
            .as_deref()
            .or_else(|| jid_node(&self.jid))
            .unwrap_or(&self.jid)
    }
}
