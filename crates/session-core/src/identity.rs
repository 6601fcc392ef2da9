//! Identity service abstraction.
//!
//! The provider never talks to an authentication backend directly; it is handed an
//! implementation of [`IdentityService`] so tests and alternative backends can be
//! substituted.

use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;

use crate::error::IdentityError;

/// External authentication backend providing session lookup and invalidation.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Opaque identity record returned for the current session
    type Identity: Clone + Debug + PartialEq + Send + Sync + 'static;

    /// Look up the session attached to this client
    async fn current_session(&self) -> Result<Self::Identity, IdentityError>;

    /// Invalidate the session attached to this client
    async fn delete_current_session(&self) -> Result<(), IdentityError>;
}

#[async_trait]
impl<T> IdentityService for Arc<T>
where
    T: IdentityService + ?Sized,
{
    type Identity = T::Identity;

    async fn current_session(&self) -> Result<Self::Identity, IdentityError> {
        self.as_ref().current_session().await
    }

    async fn delete_current_session(&self) -> Result<(), IdentityError> {
        self.as_ref().delete_current_session().await
    }
}
