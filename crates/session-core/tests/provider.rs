//! Integration tests for the session provider lifecycle.
//!
//! Collaborators are mocked: identity services with scripted results, the in-memory
//! store, and a channel navigator whose receiver records redirects.

use std::{
    pin::pin,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use anyhow::Result;
use async_trait::async_trait;
use session_core::{
    ChannelNavigator, IdentityError, IdentityService, InitOutcome, KeyValueStore, LogoutOutcome, MemoryStore,
    SessionConfig, SessionError, SessionProvider, SessionState, StorageError, StorageResult, remember_login,
};
use tokio::sync::{Notify, mpsc::UnboundedReceiver};

#[derive(Clone, Debug, PartialEq)]
struct User {
    id: String,
}

fn user(id: &str) -> User {
    User { id: id.to_string() }
}

/// Identity service with fixed answers that counts its calls.
struct ScriptedIdentity {
    session: Result<User, IdentityError>,
    delete: Result<(), IdentityError>,
    session_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl ScriptedIdentity {
    fn new(session: Result<User, IdentityError>, delete: Result<(), IdentityError>) -> Arc<Self> {
        Arc::new(Self {
            session,
            delete,
            session_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl IdentityService for ScriptedIdentity {
    type Identity = User;

    async fn current_session(&self) -> Result<User, IdentityError> {
        self.session_calls.fetch_add(1, Ordering::SeqCst);
        self.session.clone()
    }

    async fn delete_current_session(&self) -> Result<(), IdentityError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.delete.clone()
    }
}

/// Identity service whose session check blocks until released.
struct GatedIdentity {
    release: Notify,
    user: User,
}

#[async_trait]
impl IdentityService for GatedIdentity {
    type Identity = User;

    async fn current_session(&self) -> Result<User, IdentityError> {
        self.release.notified().await;
        Ok(self.user.clone())
    }

    async fn delete_current_session(&self) -> Result<(), IdentityError> {
        Ok(())
    }
}

/// Store that reads fine but refuses every write.
struct ReadOnlyStore(MemoryStore);

impl KeyValueStore for ReadOnlyStore {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(key)
    }

    fn set(&self, key: &str, _value: &str) -> StorageResult<()> {
        Err(StorageError::operation(key, "read-only"))
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        Err(StorageError::operation(key, "read-only"))
    }
}

fn redirects(rx: &mut UnboundedReceiver<String>) -> Vec<String> {
    let mut routes = Vec::new();
    while let Ok(route) = rx.try_recv() {
        routes.push(route);
    }
    routes
}

#[tokio::test]
async fn session_restored_with_cached_role() -> Result<()> {
    let identity = ScriptedIdentity::new(Ok(user("u1")), Ok(()));
    let store = Arc::new(MemoryStore::with_entries([("userRole", "admin")]));
    let (navigator, mut rx) = ChannelNavigator::new();
    let provider = SessionProvider::new(identity.clone(), store.clone(), navigator);
    let handle = provider.handle();

    assert!(handle.is_loading());
    assert_eq!(provider.initialize().await, InitOutcome::Authenticated);

    assert!(!handle.is_loading());
    assert_eq!(handle.identity(), Some(user("u1")));
    assert_eq!(handle.role().as_deref(), Some("admin"));
    assert!(handle.has_role("admin"));
    assert_eq!(handle.state(), SessionState::authenticated(user("u1"), Some("admin".to_string())));
    assert_eq!(identity.session_calls.load(Ordering::SeqCst), 1);
    assert!(redirects(&mut rx).is_empty());
    Ok(())
}

#[tokio::test]
async fn session_restored_without_cached_role() -> Result<()> {
    let identity = ScriptedIdentity::new(Ok(user("u2")), Ok(()));
    let (navigator, _rx) = ChannelNavigator::new();
    let provider = SessionProvider::new(identity, MemoryStore::new(), navigator);

    provider.initialize().await;
    let handle = provider.handle();
    assert!(handle.is_authenticated());
    assert_eq!(handle.identity(), Some(user("u2")));
    assert!(handle.role().is_none());
    Ok(())
}

#[tokio::test]
async fn failed_check_clears_state_and_cached_role() -> Result<()> {
    let identity = ScriptedIdentity::new(Err(IdentityError::NoSession), Ok(()));
    let store = Arc::new(MemoryStore::with_entries([("userRole", "admin"), ("userId", "u1")]));
    let (navigator, mut rx) = ChannelNavigator::new();
    let provider = SessionProvider::new(identity, store.clone(), navigator);

    let outcome = provider.initialize().await;
    assert_eq!(outcome, InitOutcome::Anonymous(SessionError::NoActiveSession(IdentityError::NoSession)));

    let handle = provider.handle();
    assert!(!handle.is_loading());
    assert!(handle.identity().is_none());
    assert!(handle.role().is_none());
    assert!(!store.contains("userRole"));
    // Only the role is cleared by a failed check
    assert_eq!(store.get("userId").as_deref(), Some("u1"));
    assert!(redirects(&mut rx).is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_check_with_empty_cache() -> Result<()> {
    let identity = ScriptedIdentity::new(Err(IdentityError::Transport("connection refused".into())), Ok(()));
    let store = Arc::new(MemoryStore::new());
    let (navigator, _rx) = ChannelNavigator::new();
    let provider = SessionProvider::new(identity, store.clone(), navigator);

    assert!(matches!(provider.initialize().await, InitOutcome::Anonymous(_)));
    assert_eq!(provider.handle().state(), SessionState::anonymous());
    assert!(store.is_empty());
    Ok(())
}

#[tokio::test]
async fn logout_clears_everything_and_redirects() -> Result<()> {
    let identity = ScriptedIdentity::new(Ok(user("u1")), Ok(()));
    let store = Arc::new(MemoryStore::with_entries([("userRole", "admin"), ("userId", "u1"), ("theme", "dark")]));
    let (navigator, mut rx) = ChannelNavigator::new();
    let provider = SessionProvider::new(identity.clone(), store.clone(), navigator);
    provider.initialize().await;

    let handle = provider.handle();
    assert_eq!(handle.logout().await, LogoutOutcome::SessionDeleted);

    assert_eq!(handle.state(), SessionState::anonymous());
    assert!(!store.contains("userRole"));
    assert!(!store.contains("userId"));
    assert_eq!(store.get("theme").as_deref(), Some("dark"));
    assert_eq!(redirects(&mut rx), vec!["/auth/login".to_string()]);
    assert_eq!(identity.delete_calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn logout_completes_when_delete_fails() -> Result<()> {
    let identity = ScriptedIdentity::new(Ok(user("u1")), Err(IdentityError::NoSession));
    let store = Arc::new(MemoryStore::with_entries([("userRole", "admin"), ("userId", "u1")]));
    let (navigator, mut rx) = ChannelNavigator::new();
    let provider = SessionProvider::new(identity, store.clone(), navigator);
    provider.initialize().await;

    let outcome = provider.logout().await;
    assert_eq!(
        outcome,
        LogoutOutcome::AlreadyLoggedOut(SessionError::LogoutFailure(IdentityError::NoSession))
    );

    let handle = provider.handle();
    assert!(handle.identity().is_none());
    assert!(handle.role().is_none());
    assert!(store.is_empty());
    assert_eq!(redirects(&mut rx), vec!["/auth/login".to_string()]);
    Ok(())
}

#[tokio::test]
async fn repeated_logout_reaches_same_state() -> Result<()> {
    let identity = ScriptedIdentity::new(Ok(user("u1")), Ok(()));
    let store = Arc::new(MemoryStore::with_entries([("userRole", "admin"), ("userId", "u1")]));
    let (navigator, mut rx) = ChannelNavigator::new();
    let provider = SessionProvider::new(identity, store.clone(), navigator);
    provider.initialize().await;
    let handle = provider.handle();

    handle.logout().await;
    let after_first = handle.state();
    let mut subscriber = handle.subscribe();
    subscriber.borrow_and_update();

    handle.logout().await;
    assert_eq!(handle.state(), after_first);
    assert!(store.is_empty());
    // The second logout does not re-notify subscribers
    assert!(!subscriber.has_changed()?);
    assert_eq!(redirects(&mut rx), vec!["/auth/login".to_string(), "/auth/login".to_string()]);
    Ok(())
}

#[tokio::test]
async fn logout_uses_configured_keys_and_route() -> Result<()> {
    let config = SessionConfig::from_json(r#"{ "role_key": "role", "user_id_key": "uid", "login_route": "/signin" }"#)?;
    let store = Arc::new(MemoryStore::new());
    remember_login(&store, &config, "u9", Some("editor"))?;

    let identity = ScriptedIdentity::new(Ok(user("u9")), Ok(()));
    let (navigator, mut rx) = ChannelNavigator::new();
    let provider = SessionProvider::with_config(identity, store.clone(), navigator, config);

    provider.initialize().await;
    assert_eq!(provider.handle().role().as_deref(), Some("editor"));

    provider.logout().await;
    assert!(store.is_empty());
    assert_eq!(redirects(&mut rx), vec!["/signin".to_string()]);
    Ok(())
}

#[tokio::test]
async fn storage_failures_do_not_block_logout() -> Result<()> {
    let identity = ScriptedIdentity::new(Ok(user("u1")), Ok(()));
    let store = ReadOnlyStore(MemoryStore::with_entries([("userRole", "admin")]));
    let (navigator, mut rx) = ChannelNavigator::new();
    let provider = SessionProvider::new(identity, store, navigator);

    provider.initialize().await;
    assert_eq!(provider.handle().role().as_deref(), Some("admin"));

    provider.logout().await;
    assert_eq!(provider.handle().state(), SessionState::anonymous());
    assert_eq!(redirects(&mut rx), vec!["/auth/login".to_string()]);
    Ok(())
}

#[tokio::test]
async fn logout_during_pending_check_wins() -> Result<()> {
    let identity = Arc::new(GatedIdentity {
        release: Notify::new(),
        user: user("u1"),
    });
    let store = Arc::new(MemoryStore::with_entries([("userRole", "admin")]));
    let (navigator, mut rx) = ChannelNavigator::new();
    let provider = SessionProvider::new(identity.clone(), store.clone(), navigator);
    let handle = provider.handle();

    let check = provider.mount();
    handle.logout().await;
    assert_eq!(handle.state(), SessionState::anonymous());

    identity.release.notify_one();
    assert_eq!(check.await?, InitOutcome::Superseded);

    assert_eq!(handle.state(), SessionState::anonymous());
    assert!(!store.contains("userRole"));
    assert_eq!(redirects(&mut rx), vec!["/auth/login".to_string()]);
    Ok(())
}

#[tokio::test]
async fn dropping_provider_cancels_pending_check() -> Result<()> {
    let identity = Arc::new(GatedIdentity {
        release: Notify::new(),
        user: user("u1"),
    });
    let store = Arc::new(MemoryStore::with_entries([("userRole", "admin")]));
    let (navigator, _rx) = ChannelNavigator::new();
    let provider = SessionProvider::new(identity.clone(), store.clone(), navigator);
    let handle = provider.handle();

    let check = provider.mount();
    tokio::task::yield_now().await;
    drop(provider);

    assert_eq!(check.await?, InitOutcome::Cancelled);
    assert!(handle.is_loading());
    assert_eq!(store.get("userRole").as_deref(), Some("admin"));
    Ok(())
}

#[tokio::test]
async fn mounted_check_notifies_subscribers() -> Result<()> {
    let identity = ScriptedIdentity::new(Ok(user("u1")), Ok(()));
    let (navigator, _rx) = ChannelNavigator::new();
    let provider = SessionProvider::new(identity, MemoryStore::with_entries([("userRole", "viewer")]), navigator);
    let mut subscriber = provider.handle().subscribe();

    let check = provider.mount();
    subscriber.wait_for(|state| !state.is_loading()).await?;
    assert_eq!(check.await?, InitOutcome::Authenticated);
    assert!(subscriber.borrow().has_role("viewer"));
    Ok(())
}

#[tokio::test]
async fn initialize_during_pending_check_waits_for_it() -> Result<()> {
    let identity = Arc::new(GatedIdentity {
        release: Notify::new(),
        user: user("u1"),
    });
    let (navigator, _rx) = ChannelNavigator::new();
    let provider = SessionProvider::new(identity.clone(), MemoryStore::with_entries([("userRole", "admin")]), navigator);
    let handle = provider.handle();

    let check = provider.mount();
    tokio::task::yield_now().await;

    let mut second = pin!(provider.initialize());
    assert!(
        tokio::time::timeout(Duration::from_millis(50), &mut second).await.is_err(),
        "second initialize returned before the pending check settled"
    );
    assert!(handle.is_loading());

    identity.release.notify_one();
    assert_eq!(second.await, InitOutcome::AlreadyInitialized);
    assert!(!handle.is_loading());
    assert_eq!(handle.role().as_deref(), Some("admin"));
    assert_eq!(check.await?, InitOutcome::Authenticated);
    Ok(())
}

#[tokio::test]
async fn teardown_releases_waiting_initialize() -> Result<()> {
    let identity = Arc::new(GatedIdentity {
        release: Notify::new(),
        user: user("u1"),
    });
    let (navigator, _rx) = ChannelNavigator::new();
    let provider = SessionProvider::new(identity, MemoryStore::new(), navigator);

    let check = provider.mount();
    tokio::task::yield_now().await;

    let mut second = pin!(provider.initialize());
    assert!(tokio::time::timeout(Duration::from_millis(20), &mut second).await.is_err());

    provider.teardown();
    assert_eq!(second.await, InitOutcome::Cancelled);
    assert_eq!(check.await?, InitOutcome::Cancelled);
    Ok(())
}

#[tokio::test]
async fn cache_failure_on_failed_check_still_settles_anonymous() -> Result<()> {
    let identity = ScriptedIdentity::new(Err(IdentityError::NoSession), Ok(()));
    let store = ReadOnlyStore(MemoryStore::with_entries([("userRole", "admin")]));
    let (navigator, _rx) = ChannelNavigator::new();
    let provider = SessionProvider::new(identity, store, navigator);

    assert!(matches!(provider.initialize().await, InitOutcome::Anonymous(_)));
    assert_eq!(provider.handle().state(), SessionState::anonymous());
    Ok(())
}
