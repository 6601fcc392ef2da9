/// Where the provider is in its lifecycle.
///
/// The role only exists alongside an identity, so an anonymous session can never
/// carry a stale role.
#[derive(Clone, PartialEq, Debug)]
pub enum SessionStatus<U> {
    /// Initial session check has not settled yet
    Loading,
    /// The identity service returned an identity
    Authenticated { identity: U, role: Option<String> },
    /// Session check failed or the user logged out
    Anonymous,
}

/// Session state as seen by consumers
#[derive(Clone, PartialEq, Debug)]
pub struct SessionState<U> {
    pub status: SessionStatus<U>,
}

impl<U> Default for SessionState<U> {
    fn default() -> Self {
        Self {
            status: SessionStatus::Loading,
        }
    }
}

impl<U> SessionState<U> {
    pub fn authenticated(identity: U, role: Option<String>) -> Self {
        Self {
            status: SessionStatus::Authenticated { identity, role },
        }
    }

    pub fn anonymous() -> Self {
        Self {
            status: SessionStatus::Anonymous,
        }
    }

    pub fn identity(&self) -> Option<&U> {
        match &self.status {
            SessionStatus::Authenticated { identity, .. } => Some(identity),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<&str> {
        match &self.status {
            SessionStatus::Authenticated { role, .. } => role.as_deref(),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.status, SessionStatus::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.status, SessionStatus::Authenticated { .. })
    }

    /// Check the cached role. Client-side only; the server must re-verify.
    pub fn has_role(&self, role: &str) -> bool {
        self.role() == Some(role)
    }
}
