//! Shared error types for the services crate.
//!
//! Every service error can be turned into a [`Notice`]: failures are shown to
//! the user and never treated as fatal.

use thiserror::Error;

use cook_core::model::{RecipeId, UserId};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// What the user can do about a failure, beyond retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remediation {
    /// Open the OS settings page to grant a permission or enable a service.
    OpenSettings,
    /// Go back to the sign-in screen.
    SignIn,
}

/// A user-facing notification derived from an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub remediation: Option<Remediation>,
}

impl Notice {
    fn plain(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            remediation: None,
        }
    }

    fn with(message: impl Into<String>, remediation: Remediation) -> Self {
        Self {
            message: message.into(),
            remediation: Some(remediation),
        }
    }
}

/// A device capability that needs the user's consent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Location,
    PhotoLibrary,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Location => f.write_str("location"),
            Self::PhotoLibrary => f.write_str("photo library"),
        }
    }
}

/// Errors emitted by `CatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("recipe {0} not found")]
    RecipeNotFound(RecipeId),
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl CatalogError {
    #[must_use]
    pub fn notice(&self) -> Notice {
        match self {
            Self::RecipeNotFound(_) => Notice::plain("Recipe not found!"),
            Self::StoreUnavailable(_) => Notice::plain("Error fetching recipes"),
        }
    }
}

impl From<StorageError> for CatalogError {
    fn from(err: StorageError) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

/// Errors emitted by the cooking tracker and step walker.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CookingError {
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error("recipe {0} not found")]
    RecipeNotFound(RecipeId),
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("a cooking update for recipe {recipe} is already in progress")]
    Busy { user: UserId, recipe: RecipeId },
    #[error("no user is signed in")]
    Unauthenticated,
}

impl CookingError {
    /// Maps a storage failure for an operation on `user`'s record.
    pub(crate) fn from_user_storage(user: &UserId, err: StorageError) -> Self {
        match err {
            StorageError::NotFound => Self::UserNotFound(user.clone()),
            other => Self::StoreUnavailable(other.to_string()),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UserNotFound(_) | Self::RecipeNotFound(_))
    }

    /// Whether pressing the button again may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::Busy { .. })
    }

    #[must_use]
    pub fn notice(&self) -> Notice {
        match self {
            Self::UserNotFound(_) => Notice::plain("User not found"),
            Self::RecipeNotFound(_) => Notice::plain("Recipe not found!"),
            Self::StoreUnavailable(_) => Notice::plain("Cooking failed"),
            Self::InvalidInput(_) => Notice::plain("This recipe has no steps to cook"),
            Self::Busy { .. } => Notice::plain("Still saving, please wait"),
            Self::Unauthenticated => Notice::with("Unauthorized!", Remediation::SignIn),
        }
    }
}

impl From<CatalogError> for CookingError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::RecipeNotFound(id) => Self::RecipeNotFound(id),
            CatalogError::StoreUnavailable(msg) => Self::StoreUnavailable(msg),
        }
    }
}

/// Errors emitted by `AuthService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error("invalid email: {0}")]
    InvalidEmail(String),
    #[error("email already in use")]
    EmailInUse,
    #[error("invalid credentials")]
    InvalidCredential,
    #[error("password must be at least {min} characters")]
    WeakPassword { min: usize },
    #[error("username cannot be empty")]
    EmptyUsername,
    #[error("no user is signed in")]
    Unauthenticated,
    #[error("{0} permission denied")]
    PermissionDenied(Capability),
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl AuthError {
    #[must_use]
    pub fn notice(&self) -> Notice {
        match self {
            Self::InvalidEmail(_) => Notice::plain("Invalid email!"),
            Self::EmailInUse => Notice::plain("Email already in use!"),
            Self::InvalidCredential => Notice::plain("Invalid credentials!"),
            Self::WeakPassword { .. } => Notice::plain(self.to_string()),
            Self::EmptyUsername => Notice::plain("Username is required"),
            Self::Unauthenticated => Notice::with("Unauthorized!", Remediation::SignIn),
            Self::PermissionDenied(_) => Notice::with(
                "Permission to access the photo library was denied!",
                Remediation::OpenSettings,
            ),
            Self::StoreUnavailable(_) => Notice::plain("Failed to save user data."),
        }
    }
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict => Self::EmailInUse,
            other => Self::StoreUnavailable(other.to_string()),
        }
    }
}

/// Errors emitted by `MapService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MapError {
    #[error("{0} permission denied")]
    PermissionDenied(Capability),
    #[error("location services are turned off")]
    LocationDisabled,
    #[error("could not determine position: {0}")]
    Position(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl MapError {
    #[must_use]
    pub fn notice(&self) -> Notice {
        match self {
            Self::PermissionDenied(_) => Notice::with(
                "Permission to access location was denied!",
                Remediation::OpenSettings,
            ),
            Self::LocationDisabled => Notice::with(
                "Please turn on your location service!",
                Remediation::OpenSettings,
            ),
            Self::Position(_) => Notice::plain("Error fetching location"),
            Self::Catalog(_) => Notice::plain("Error fetching supermarket"),
        }
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_user_maps_to_user_not_found() {
        let user = UserId::new("u1").unwrap();
        let err = CookingError::from_user_storage(&user, StorageError::NotFound);
        assert!(matches!(err, CookingError::UserNotFound(ref id) if *id == user));
        assert!(err.is_not_found());
        assert!(!err.is_retryable());
    }

    #[test]
    fn transport_failure_is_retryable() {
        let user = UserId::new("u1").unwrap();
        let err =
            CookingError::from_user_storage(&user, StorageError::Connection("timeout".into()));
        assert!(matches!(err, CookingError::StoreUnavailable(_)));
        assert!(err.is_retryable());
        assert_eq!(err.notice().message, "Cooking failed");
    }

    #[test]
    fn permission_notices_offer_settings() {
        let notice = MapError::PermissionDenied(Capability::Location).notice();
        assert_eq!(notice.remediation, Some(Remediation::OpenSettings));
        assert_eq!(
            MapError::LocationDisabled.notice().remediation,
            Some(Remediation::OpenSettings)
        );
    }

    #[test]
    fn duplicate_account_is_email_in_use() {
        assert!(matches!(
            AuthError::from(StorageError::Conflict),
            AuthError::EmailInUse
        ));
    }
}
