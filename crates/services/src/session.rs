use std::sync::{Arc, RwLock};

use cook_core::model::{ImageRef, User, UserId};

use crate::error::CookingError;

/// Snapshot of the signed-in user kept by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: UserId,
    pub display_name: String,
    pub email: String,
    pub photo_ref: Option<ImageRef>,
}

impl SessionUser {
    #[must_use]
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id().clone(),
            display_name: user.username().to_owned(),
            email: user.email().to_owned(),
            photo_ref: user.photo_ref().cloned(),
        }
    }
}

/// Shared handle to the current identity.
///
/// Cloning the context shares the same session. Services that act on behalf
/// of a user receive it (or a `UserId` taken from it) explicitly.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    inner: Arc<RwLock<Option<SessionUser>>>,
}

impl SessionContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn current(&self) -> Option<SessionUser> {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Id of the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `CookingError::Unauthenticated` when nobody is signed in.
    pub fn user_id(&self) -> Result<UserId, CookingError> {
        self.current()
            .map(|u| u.id)
            .ok_or(CookingError::Unauthenticated)
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.current().is_some()
    }

    pub(crate) fn begin(&self, user: SessionUser) {
        self.write(Some(user));
    }

    pub(crate) fn clear(&self) {
        self.write(None);
    }

    fn write(&self, value: Option<SessionUser>) {
        match self.inner.write() {
            Ok(mut guard) => *guard = value,
            Err(poisoned) => *poisoned.into_inner() = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SessionUser {
        SessionUser {
            id: UserId::new("u1").unwrap(),
            display_name: "Sari".into(),
            email: "sari@example.com".into(),
            photo_ref: None,
        }
    }

    #[test]
    fn empty_context_is_unauthenticated() {
        let ctx = SessionContext::new();
        assert!(!ctx.is_signed_in());
        assert!(matches!(ctx.user_id(), Err(CookingError::Unauthenticated)));
    }

    #[test]
    fn clones_share_the_session() {
        let ctx = SessionContext::new();
        let other = ctx.clone();
        ctx.begin(sample());
        assert_eq!(other.user_id().unwrap().as_str(), "u1");

        other.clear();
        assert!(ctx.current().is_none());
    }
}
