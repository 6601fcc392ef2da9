//! HTTP identity service for Appwrite-style account APIs.
//!
//! `GET {endpoint}/account` returns the account bound to the current session and
//! `DELETE {endpoint}/account/sessions/current` ends it. A 401 from either call
//! means there is no session.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::{config::AccountConfig, error::IdentityError, identity::IdentityService};

const PROJECT_HEADER: &str = "X-Appwrite-Project";
const SESSION_HEADER: &str = "X-Appwrite-Session";

/// Account record returned for the current session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Stable user identifier.
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub email_verification: bool,
    /// Server-side labels; unlike the cached role these are authoritative.
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub prefs: serde_json::Map<String, serde_json::Value>,
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// [`IdentityService`] backed by the account REST API.
#[derive(Clone, Debug)]
pub struct AccountClient {
    http: Client,
    account_url: Url,
    current_session_url: Url,
    project_id: String,
    session_secret: Option<String>,
}

impl AccountClient {
    /// Build a client with its own cookie store and the configured request timeout.
    ///
    /// Fails with [`IdentityError::Transport`] if the endpoint is not an absolute URL.
    pub fn new(config: AccountConfig) -> Result<Self, IdentityError> {
        let http = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(IdentityError::transport)?;
        Self::with_client(http, config)
    }

    /// Use a preconfigured `reqwest` client (shared pool, custom TLS roots).
    pub fn with_client(http: Client, config: AccountConfig) -> Result<Self, IdentityError> {
        let mut base = Url::parse(&config.endpoint).map_err(IdentityError::transport)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let account_url = base.join("account").map_err(IdentityError::transport)?;
        let current_session_url = base.join("account/sessions/current").map_err(IdentityError::transport)?;

        Ok(Self {
            http,
            account_url,
            current_session_url,
            project_id: config.project_id,
            session_secret: config.session_secret,
        })
    }

    fn request(&self, method: reqwest::Method, url: &Url) -> reqwest::RequestBuilder {
        let builder = self
            .http
            .request(method, url.clone())
            .header(PROJECT_HEADER, &self.project_id);
        match &self.session_secret {
            Some(secret) => builder.header(SESSION_HEADER, secret),
            None => builder,
        }
    }
}

/// Map a non-success response onto the error taxonomy.
async fn error_from_response(response: Response) -> IdentityError {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return IdentityError::NoSession;
    }
    let message = match response.text().await {
        Ok(body) => serde_json::from_str::<ErrorBody>(&body).map(|b| b.message).unwrap_or(body),
        Err(e) => e.to_string(),
    };
    IdentityError::Unexpected {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl IdentityService for AccountClient {
    type Identity = Account;

    async fn current_session(&self) -> Result<Account, IdentityError> {
        let response = self
            .request(reqwest::Method::GET, &self.account_url)
            .send()
            .await
            .map_err(IdentityError::transport)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let account: Account = response.json().await.map_err(IdentityError::decode)?;
        debug!(user_id = %account.id, "session check returned account");
        Ok(account)
    }

    async fn delete_current_session(&self) -> Result<(), IdentityError> {
        let response = self
            .request(reqwest::Method::DELETE, &self.current_session_url)
            .send()
            .await
            .map_err(IdentityError::transport)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(response).await)
        }
    }
}
