//! Factory for empty XMPP entities

use rostra_core::EntityFactory;

use crate::user::XmppUser;

/// Builds empty `XmppUser`s, optionally pre-filed into a default roster group
#[derive(Debug, Clone, Default)]
pub struct XmppUserFactory {
    default_group: Option<String>,
}

impl XmppUserFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// New contacts start out in `group`
    pub fn with_default_group<T: Into<String>>(group: T) -> Self {
        Self {
            default_group: Some(group.into()),
        }
    }
}

impl EntityFactory<XmppUser> for XmppUserFactory {
    fn new_user(&self) -> XmppUser {
        let mut user = XmppUser::default();
        if let Some(group) = &self.default_group {
            user.add_group(group.clone());
        }
        user
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::{Presence, Subscription};

    #[test]
    fn test_new_user_is_empty() {
        let user = XmppUserFactory::new().new_user_with_id("mercutio@verona.lit");
        assert_eq!(user.jid, "mercutio@verona.lit");
        assert_eq!(user.presence, Presence::Unavailable);
        assert_eq!(user.subscription, Subscription::None);
        assert!(user.groups.is_empty());
    }

    #[test]
    fn test_default_group() {
        let user = XmppUserFactory::with_default_group("Friends").new_user();
        assert!(user.in_group("Friends"));
    }
}
