//! Session provider: runs the session check on mount and owns the logout flow.
//!
//! State transitions:
//!
//! ```text
//! Loading ──check ok──▶ Authenticated(identity, role)
//!    │                        │
//!    ├──check failed──▶ Anonymous ◀──logout──┘
//!    └──────logout──────────┘
//! ```
//!
//! Consumers only ever get a [`SessionHandle`]; the provider itself is kept by
//! whatever owns the application tree and cancels the pending check when dropped.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::SessionConfig,
    error::{IdentityError, SessionError},
    identity::IdentityService,
    navigation::Navigator,
    state::{SessionState, SessionStatus},
    storage::{KeyValueStore, forget_login},
};

/// How the initial session check ended
#[derive(Debug, Clone, PartialEq)]
pub enum InitOutcome {
    /// Identity adopted, role restored from the cache if present
    Authenticated,
    /// No session; local state and cached role cleared
    Anonymous(SessionError),
    /// A logout finished first, so the late result was discarded
    Superseded,
    /// Provider was torn down while the check was pending; nothing was applied
    Cancelled,
    /// Another caller ran the check for this mount; returned once it settled
    AlreadyInitialized,
}

/// How the logout call ended. Local cleanup and the redirect happen either way.
#[derive(Debug, Clone, PartialEq)]
pub enum LogoutOutcome {
    /// The identity service invalidated the session
    SessionDeleted,
    /// The identity service refused or failed; treated as already logged out
    AlreadyLoggedOut(SessionError),
}

struct Inner<I: IdentityService, S, N> {
    identity: I,
    store: S,
    navigator: N,
    config: SessionConfig,
    state: watch::Sender<SessionState<I::Identity>>,
    started: AtomicBool,
    cancel: CancellationToken,
}

impl<I, S, N> Inner<I, S, N>
where
    I: IdentityService,
    S: KeyValueStore,
    N: Navigator,
{
    async fn initialize(&self) -> InitOutcome {
        if self.started.swap(true, Ordering::SeqCst) {
            return self.wait_for_first_check().await;
        }

        // Cancellation is polled first, so a result that arrives together with
        // teardown is never applied.
        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!("provider torn down before session check completed");
                return InitOutcome::Cancelled;
            }
            result = self.identity.current_session() => result,
        };

        match result {
            Ok(identity) => self.adopt(identity),
            Err(err) => self.clear_after_failed_check(err),
        }
    }

    /// Later callers return only once the check started by the first caller has settled.
    async fn wait_for_first_check(&self) -> InitOutcome {
        let mut rx = self.state.subscribe();
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => InitOutcome::Cancelled,
            _ = async {
                let _ = rx.wait_for(|state| !state.is_loading()).await;
            } => InitOutcome::AlreadyInitialized,
        }
    }

    fn adopt(&self, identity: I::Identity) -> InitOutcome {
        let role = self.store.get(&self.config.role_key);
        let has_role = role.is_some();
        let applied = self.state.send_if_modified(|state| {
            if !state.is_loading() {
                return false;
            }
            *state = SessionState::authenticated(identity, role);
            true
        });

        if applied {
            info!(has_role, "session restored");
            InitOutcome::Authenticated
        } else {
            debug!("logout completed during session check; ignoring identity");
            InitOutcome::Superseded
        }
    }

    fn clear_after_failed_check(&self, err: IdentityError) -> InitOutcome {
        let applied = self.state.send_if_modified(|state| {
            if !state.is_loading() {
                return false;
            }
            *state = SessionState::anonymous();
            true
        });
        if !applied {
            debug!(error = %err, "logout completed during session check; ignoring failure");
            return InitOutcome::Superseded;
        }

        warn!(error = %err, "no active session");
        if let Err(storage_err) = self.store.remove(&self.config.role_key) {
            let storage_err = SessionError::from(storage_err);
            warn!(error = %storage_err, "failed to clear stale cached role");
        }
        InitOutcome::Anonymous(SessionError::NoActiveSession(err))
    }

    async fn logout(&self) -> LogoutOutcome {
        let outcome = match self.identity.delete_current_session().await {
            Ok(()) => {
                info!("session deleted");
                LogoutOutcome::SessionDeleted
            }
            Err(err) => {
                warn!(error = %err, "logout failed (maybe already logged out)");
                LogoutOutcome::AlreadyLoggedOut(SessionError::LogoutFailure(err))
            }
        };

        self.state.send_if_modified(|state| {
            if matches!(state.status, SessionStatus::Anonymous) {
                return false;
            }
            *state = SessionState::anonymous();
            true
        });
        if let Err(err) = forget_login(&self.store, &self.config) {
            warn!(error = %err, "logout left cached login values behind");
        }
        self.navigator.redirect(&self.config.login_route);
        outcome
    }
}

/// Owns the session state for one application tree.
///
/// Dropping the provider (or calling [`SessionProvider::teardown`]) abandons a
/// pending session check; handles stay readable afterwards.
pub struct SessionProvider<I: IdentityService, S, N> {
    inner: Arc<Inner<I, S, N>>,
}

impl<I, S, N> SessionProvider<I, S, N>
where
    I: IdentityService,
    S: KeyValueStore,
    N: Navigator,
{
    /// Create a provider in the Loading state using the default cache keys and login route.
    pub fn new(identity: I, store: S, navigator: N) -> Self {
        Self::with_config(identity, store, navigator, SessionConfig::default())
    }

    /// Create a provider with custom cache keys or login route.
    pub fn with_config(identity: I, store: S, navigator: N, config: SessionConfig) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            inner: Arc::new(Inner {
                identity,
                store,
                navigator,
                config,
                state,
                started: AtomicBool::new(false),
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Read-only accessor for consuming UI
    pub fn handle(&self) -> SessionHandle<I, S, N> {
        SessionHandle {
            inner: self.inner.clone(),
        }
    }

    /// Run the session check once for this mount.
    ///
    /// Never fails: a missing session is reported as [`InitOutcome::Anonymous`].
    /// A call made while the check is still pending waits for it to settle.
    pub async fn initialize(&self) -> InitOutcome {
        self.inner.initialize().await
    }

    /// Invalidate the session, clear local state, and redirect to the login route.
    pub async fn logout(&self) -> LogoutOutcome {
        self.inner.logout().await
    }

    /// Signal that the owning tree is going away. Idempotent.
    pub fn teardown(&self) {
        self.inner.cancel.cancel();
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }
}

impl<I, S, N> SessionProvider<I, S, N>
where
    I: IdentityService + 'static,
    S: KeyValueStore + 'static,
    N: Navigator + 'static,
{
    /// Start the session check on the current tokio runtime.
    pub fn mount(&self) -> JoinHandle<InitOutcome> {
        let inner = self.inner.clone();
        tokio::spawn(async move { inner.initialize().await })
    }
}

impl<I: IdentityService, S, N> Drop for SessionProvider<I, S, N> {
    fn drop(&mut self) {
        self.inner.cancel.cancel();
    }
}

/// Cloneable read-only view of the session plus the logout action.
pub struct SessionHandle<I: IdentityService, S, N> {
    inner: Arc<Inner<I, S, N>>,
}

impl<I: IdentityService, S, N> Clone for SessionHandle<I, S, N> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<I, S, N> SessionHandle<I, S, N>
where
    I: IdentityService,
    S: KeyValueStore,
    N: Navigator,
{
    /// Snapshot of the current state
    pub fn state(&self) -> SessionState<I::Identity> {
        self.inner.state.borrow().clone()
    }

    /// Identity of the current session, if authenticated
    pub fn identity(&self) -> Option<I::Identity> {
        self.inner.state.borrow().identity().cloned()
    }

    /// Role cached at login. Client-side only; the server must re-verify it.
    pub fn role(&self) -> Option<String> {
        self.inner.state.borrow().role().map(str::to_string)
    }

    /// True until the initial session check settles
    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading()
    }

    /// True when the session check returned an identity and no logout has happened since
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    /// Check the cached role against `role`
    pub fn has_role(&self, role: &str) -> bool {
        self.inner.state.borrow().has_role(role)
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionState<I::Identity>> {
        self.inner.state.subscribe()
    }

    /// Same as [`SessionProvider::logout`]
    pub async fn logout(&self) -> LogoutOutcome {
        self.inner.logout().await
    }
}
