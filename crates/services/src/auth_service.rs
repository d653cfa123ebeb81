use std::sync::Arc;

use tracing::{error, info, warn};

use cook_core::model::{User, UserError, normalize_email};
use storage::credentials::MIN_PASSWORD_LEN;
use storage::repository::{
    Account, IdentityProvider, ProfileUpdate, StorageError, UserRepository,
};

use crate::Clock;
use crate::device::ImagePicker;
use crate::error::{AuthError, Capability};
use crate::session::{SessionContext, SessionUser};

/// Sign-up, sign-in and profile edits on top of the identity provider.
#[derive(Clone)]
pub struct AuthService {
    clock: Clock,
    identity: Arc<dyn IdentityProvider>,
    users: Arc<dyn UserRepository>,
    session: SessionContext,
}

impl AuthService {
    #[must_use]
    pub fn new(
        clock: Clock,
        identity: Arc<dyn IdentityProvider>,
        users: Arc<dyn UserRepository>,
        session: SessionContext,
    ) -> Self {
        Self {
            clock,
            identity,
            users,
            session,
        }
    }

    #[must_use]
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Register a new account and its user record, then sign in.
    ///
    /// The user record starts with an empty cooking set.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`, `EmptyUsername` or `WeakPassword`
    /// for bad input, `EmailInUse` for a taken address, and
    /// `StoreUnavailable` if either write fails. If the user record cannot be
    /// written the new account is removed again, so the address stays free.
    pub async fn sign_up(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<SessionUser, AuthError> {
        let email = normalize_email(email.to_owned()).map_err(map_user_error)?;
        if username.trim().is_empty() {
            return Err(AuthError::EmptyUsername);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword {
                min: MIN_PASSWORD_LEN,
            });
        }

        let account = self.identity.create_account(&email, password).await?;
        let user = match self.create_user_record(&account, username).await {
            Ok(user) => user,
            Err(err) => {
                self.rollback_account(&account).await;
                return Err(err);
            }
        };

        let snapshot = SessionUser::from_user(&user);
        self.session.begin(snapshot.clone());
        info!(user = %user.id(), "signed up");
        Ok(snapshot)
    }

    async fn create_user_record(
        &self,
        account: &Account,
        username: &str,
    ) -> Result<User, AuthError> {
        let user = User::new(
            account.user_id.clone(),
            username,
            &account.email,
            self.clock.now(),
        )
        .map_err(map_user_error)?;
        self.users.create_user(&user).await?;
        Ok(user)
    }

    async fn rollback_account(&self, account: &Account) {
        match self.identity.delete_account(account).await {
            Ok(()) => warn!(user = %account.user_id, "sign-up rolled back"),
            Err(err) => {
                error!(user = %account.user_id, error = %err, "failed to roll back sign-up");
            }
        }
    }

    /// Verify credentials and start a session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredential` on a mismatch and
    /// `StoreUnavailable` if the provider cannot be reached.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, AuthError> {
        let email = normalize_email(email.to_owned()).map_err(map_user_error)?;
        let account = self
            .identity
            .verify(&email, password)
            .await?
            .ok_or(AuthError::InvalidCredential)?;

        let snapshot = match self.users.get_user(&account.user_id).await? {
            Some(user) => SessionUser::from_user(&user),
            None => {
                warn!(user = %account.user_id, "signed in without a user record");
                SessionUser {
                    id: account.user_id,
                    display_name: account.email.clone(),
                    email: account.email,
                    photo_ref: None,
                }
            }
        };

        self.session.begin(snapshot.clone());
        info!(user = %snapshot.id, "signed in");
        Ok(snapshot)
    }

    pub fn sign_out(&self) {
        if let Some(user) = self.session.current() {
            info!(user = %user.id, "signed out");
        }
        self.session.clear();
    }

    #[must_use]
    pub fn current_user(&self) -> Option<SessionUser> {
        self.session.current()
    }

    /// Change the display name and/or photo of the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthenticated` without a session,
    /// `EmptyUsername` for a blank name, and `StoreUnavailable` on write failure.
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<SessionUser, AuthError> {
        let current = self.session.current().ok_or(AuthError::Unauthenticated)?;
        if update
            .username
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            return Err(AuthError::EmptyUsername);
        }

        let user = self
            .users
            .update_profile(&current.id, &update)
            .await
            .map_err(|err| match err {
                StorageError::NotFound => AuthError::Unauthenticated,
                other => AuthError::from(other),
            })?;

        let snapshot = SessionUser::from_user(&user);
        self.session.begin(snapshot.clone());
        info!(user = %snapshot.id, "profile updated");
        Ok(snapshot)
    }

    /// Let the user pick a new profile photo.
    ///
    /// Returns `Ok(None)` if the picker was cancelled.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PermissionDenied` when photo access is refused,
    /// plus any error from [`AuthService::update_profile`].
    pub async fn change_photo(
        &self,
        picker: &dyn ImagePicker,
    ) -> Result<Option<SessionUser>, AuthError> {
        if self.session.current().is_none() {
            return Err(AuthError::Unauthenticated);
        }
        if !picker.request_permission().await.is_granted() {
            return Err(AuthError::PermissionDenied(Capability::PhotoLibrary));
        }
        let Some(photo) = picker.pick_image().await else {
            return Ok(None);
        };
        self.update_profile(ProfileUpdate {
            username: None,
            photo_ref: Some(photo),
        })
        .await
        .map(Some)
    }
}

fn map_user_error(err: UserError) -> AuthError {
    match err {
        UserError::EmptyUsername => AuthError::EmptyUsername,
        UserError::InvalidEmail(raw) => AuthError::InvalidEmail(raw),
        other => AuthError::InvalidEmail(other.to_string()),
    }
}
