use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::model::ids::{RecipeId, UserId};
use crate::model::media::ImageRef;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("username cannot be empty")]
    EmptyUsername,

    #[error("email is not valid: {0}")]
    InvalidEmail(String),
}

//
// ─── COOKING SET ───────────────────────────────────────────────────────────────
//

/// Recipes a user is currently cooking.
///
/// Set semantics: inserting a present id and removing an absent id are both
/// no-ops, so a recipe id is stored at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CookingSet(BTreeSet<RecipeId>);

impl CookingSet {
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Adds a recipe. Returns `true` if it was not already present.
    pub fn insert(&mut self, recipe: RecipeId) -> bool {
        self.0.insert(recipe)
    }

    /// Removes a recipe. Returns `true` if it was present.
    pub fn remove(&mut self, recipe: &RecipeId) -> bool {
        self.0.remove(recipe)
    }

    #[must_use]
    pub fn contains(&self, recipe: &RecipeId) -> bool {
        self.0.contains(recipe)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecipeId> {
        self.0.iter()
    }
}

impl FromIterator<RecipeId> for CookingSet {
    fn from_iter<T: IntoIterator<Item = RecipeId>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

//
// ─── USER ──────────────────────────────────────────────────────────────────────
//

/// A user record as kept in the `users` collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    username: String,
    email: String,
    photo_ref: Option<ImageRef>,
    created_at: DateTime<Utc>,
    cooking: CookingSet,
}

impl User {
    /// Creates the record written at sign-up, with nothing being cooked yet.
    ///
    /// # Errors
    ///
    /// Returns `UserError` if the username is blank or the email is malformed.
    pub fn new(
        id: UserId,
        username: impl Into<String>,
        email: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        Self::from_persisted(id, username, email, None, created_at, CookingSet::new())
    }

    /// Rehydrates a user from storage.
    ///
    /// # Errors
    ///
    /// Returns `UserError` if the username is blank or the email is malformed.
    pub fn from_persisted(
        id: UserId,
        username: impl Into<String>,
        email: impl Into<String>,
        photo_ref: Option<ImageRef>,
        created_at: DateTime<Utc>,
        cooking: CookingSet,
    ) -> Result<Self, UserError> {
        let username = normalize_username(username.into())?;
        let email = normalize_email(email.into())?;
        Ok(Self {
            id,
            username,
            email,
            photo_ref,
            created_at,
            cooking,
        })
    }

    #[must_use]
    pub fn id(&self) -> &UserId {
        &self.id
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn photo_ref(&self) -> Option<&ImageRef> {
        self.photo_ref.as_ref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn cooking(&self) -> &CookingSet {
        &self.cooking
    }

    /// Cooking status for one recipe.
    #[must_use]
    pub fn is_cooking(&self, recipe: &RecipeId) -> bool {
        self.cooking.contains(recipe)
    }

    /// # Errors
    ///
    /// Returns `UserError::EmptyUsername` for a blank name.
    pub fn rename(&mut self, username: impl Into<String>) -> Result<(), UserError> {
        self.username = normalize_username(username.into())?;
        Ok(())
    }

    pub fn set_photo(&mut self, photo: Option<ImageRef>) {
        self.photo_ref = photo;
    }

    /// Applies a store-level set update to the cooking field.
    ///
    /// Returns `true` if the set changed.
    pub fn apply(&mut self, update: &CookingUpdate) -> bool {
        match update {
            CookingUpdate::Add(recipe) => self.cooking.insert(recipe.clone()),
            CookingUpdate::Remove(recipe) => self.cooking.remove(recipe),
        }
    }
}

/// Atomic set-add / set-remove on a user's `cooking` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookingUpdate {
    Add(RecipeId),
    Remove(RecipeId),
}

impl CookingUpdate {
    #[must_use]
    pub fn recipe(&self) -> &RecipeId {
        match self {
            Self::Add(r) | Self::Remove(r) => r,
        }
    }
}

fn normalize_username(raw: String) -> Result<String, UserError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UserError::EmptyUsername);
    }
    Ok(trimmed.to_owned())
}

/// Lowercases and checks the minimal `local@domain.tld` shape.
///
/// # Errors
///
/// Returns `UserError::InvalidEmail` if the address has no local part or no dotted domain.
pub fn normalize_email(raw: String) -> Result<String, UserError> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if valid {
        Ok(email)
    } else {
        Err(UserError::InvalidEmail(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn recipe(id: &str) -> RecipeId {
        RecipeId::new(id).unwrap()
    }

    fn build_user() -> User {
        User::new(
            UserId::new("u1").unwrap(),
            "Sari",
            "Sari@Example.com",
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn new_user_is_not_cooking_anything() {
        let user = build_user();
        assert!(user.cooking().is_empty());
        assert_eq!(user.email(), "sari@example.com");
    }

    #[test]
    fn set_add_is_idempotent() {
        let mut user = build_user();
        assert!(user.apply(&CookingUpdate::Add(recipe("abc123"))));
        assert!(!user.apply(&CookingUpdate::Add(recipe("abc123"))));
        assert_eq!(user.cooking().len(), 1);
        assert!(user.is_cooking(&recipe("abc123")));
    }

    #[test]
    fn set_remove_is_idempotent() {
        let mut user = build_user();
        assert!(!user.apply(&CookingUpdate::Remove(recipe("missing"))));
        user.apply(&CookingUpdate::Add(recipe("abc123")));
        assert!(user.apply(&CookingUpdate::Remove(recipe("abc123"))));
        assert!(!user.is_cooking(&recipe("abc123")));
    }

    #[test]
    fn rejects_blank_username_and_bad_email() {
        let id = UserId::new("u2").unwrap();
        assert_eq!(
            User::new(id.clone(), "  ", "a@b.co", fixed_now()).unwrap_err(),
            UserError::EmptyUsername
        );
        assert!(matches!(
            User::new(id, "Budi", "budi.example.com", fixed_now()),
            Err(UserError::InvalidEmail(_))
        ));
    }

    #[test]
    fn email_shapes() {
        assert!(normalize_email("a@b.c".into()).is_ok());
        assert!(normalize_email("@b.c".into()).is_err());
        assert!(normalize_email("a@b".into()).is_err());
        assert!(normalize_email("a@.b".into()).is_err());
        assert!(normalize_email("a@b@c.d".into()).is_err());
    }
}
