//! Explicit per-session context handed to the writers.

use crate::types::{ParticipantId, Role};

/// Author label used by the privileged role instead of a display name.
pub const GM_LABEL: &str = "GM";

/// Identity, display name and role of the local participant.
///
/// Built when the host session becomes ready and dropped when it ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub identity: ParticipantId,
    pub display_name: String,
    pub role: Role,
}

impl SessionContext {
    pub fn new(identity: impl Into<ParticipantId>, display_name: &str, role: Role) -> Self {
        Self {
            identity: identity.into(),
            display_name: display_name.to_string(),
            role,
        }
    }

    pub fn is_privileged(&self) -> bool {
        self.role.is_privileged()
    }

    /// The `sender` written on ordinary messages from this participant.
    pub fn author_label(&self) -> String {
        if self.is_privileged() {
            GM_LABEL.to_string()
        } else {
            self.display_name.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_label_player() {
        let session = SessionContext::new("p1", "Alice", Role::Player);
        assert_eq!(session.author_label(), "Alice");
        assert!(!session.is_privileged());
    }

    #[test]
    fn test_author_label_gm() {
        let session = SessionContext::new("p2", "Bob", Role::Gm);
        assert_eq!(session.author_label(), GM_LABEL);
        assert!(session.is_privileged());
    }
}
