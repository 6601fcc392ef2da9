//! Client-side session state for web frontends.
//!
//! A [`SessionProvider`] asks an [`IdentityService`] whether a session exists when
//! the application mounts, restores the role cached at login from a
//! [`KeyValueStore`], and exposes a read-only [`SessionHandle`] with a logout
//! action. Every failure degrades to the anonymous state; nothing is propagated to
//! consumers as an error.
//!
//! Collaborators are injected, so native clients, browsers (`web` feature) and
//! tests plug in their own identity service, cache and navigator.

#[cfg(feature = "http")]
pub mod account;
pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod navigation;
pub mod provider;
pub mod state;
pub mod storage;

#[cfg(feature = "http")]
pub use account::{Account, AccountClient};
pub use config::{AccountConfig, SessionConfig};
pub use error::{IdentityError, SessionError, StorageError, StorageResult};
pub use identity::IdentityService;
pub use navigation::{BrowserNavigator, ChannelNavigator, Navigator};
pub use provider::{InitOutcome, LogoutOutcome, SessionHandle, SessionProvider};
pub use state::{SessionState, SessionStatus};
pub use storage::{BrowserStorage, KeyValueStore, MemoryStore, StorageType, forget_login, remember_login};
