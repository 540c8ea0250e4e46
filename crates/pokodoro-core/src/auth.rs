//! Authentication gate.
//!
//! Credentials are owned by the identity provider. The engine only asks
//! whether someone is signed in before a session may be opened.

pub trait AuthGate {
    fn is_authenticated(&self) -> bool;

    /// Display name of the signed-in user, if any.
    fn user(&self) -> Option<&str>;
}

/// A resolved identity: a user name, or nobody.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    user: Option<String>,
}

impl Identity {
    pub fn signed_in(user: impl Into<String>) -> Self {
        Self::from_optional(Some(user.into()))
    }

    pub fn anonymous() -> Self {
        Self { user: None }
    }

    /// Blank names count as signed out.
    pub fn from_optional(user: Option<String>) -> Self {
        let user = user
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        Self { user }
    }
}

impl AuthGate for Identity {
    fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }
}
