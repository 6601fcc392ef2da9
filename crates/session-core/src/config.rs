//! Configuration for the session provider and the account API client.

use serde::{Deserialize, Serialize};

/// Cache key holding the role string written at login.
pub const DEFAULT_ROLE_KEY: &str = "userRole";
/// Cache key holding the user id written at login.
pub const DEFAULT_USER_ID_KEY: &str = "userId";
/// Route the application is sent to after logout.
pub const DEFAULT_LOGIN_ROUTE: &str = "/auth/login";

/// Provider configuration: which cache keys to use and where logout lands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Key for the cached role string (defaults to `userRole`).
    pub role_key: String,
    /// Key for the cached user id (defaults to `userId`).
    pub user_id_key: String,
    /// Redirect target after logout (defaults to `/auth/login`).
    pub login_route: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            role_key: DEFAULT_ROLE_KEY.to_string(),
            user_id_key: DEFAULT_USER_ID_KEY.to_string(),
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
        }
    }
}

impl SessionConfig {
    /// Parse from JSON; missing fields fall back to their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Connection settings for [`AccountClient`](crate::account::AccountClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    /// API root, e.g. `https://cloud.appwrite.io/v1`.
    pub endpoint: String,
    /// Project the account belongs to; sent as `X-Appwrite-Project`.
    pub project_id: String,
    /// Session secret for non-browser clients; sent as `X-Appwrite-Session`.
    #[serde(default)]
    pub session_secret: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl AccountConfig {
    pub fn new(endpoint: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            project_id: project_id.into(),
            session_secret: None,
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn with_session_secret(mut self, secret: impl Into<String>) -> Self {
        self.session_secret = Some(secret.into());
        self
    }
}
