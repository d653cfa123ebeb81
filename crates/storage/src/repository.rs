use async_trait::async_trait;
use cook_core::model::{
    CookingUpdate, ImageRef, Recipe, RecipeId, Supermarket, SupermarketId, User, UserId,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::credentials::PasswordHash;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Fields a user may change on their own profile. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub photo_ref: Option<ImageRef>,
}

/// An identity known to the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub user_id: UserId,
    pub email: String,
}

/// Repository contract for the `users` collection.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Write a fresh user record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if a record with that id already exists.
    async fn create_user(&self, user: &User) -> Result<(), StorageError>;

    /// Fetch a user record by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn get_user(&self, id: &UserId) -> Result<Option<User>, StorageError>;

    /// Apply an atomic set-add or set-remove to the user's `cooking` field.
    ///
    /// Both directions are idempotent. Implementations must never rewrite the
    /// whole set from a previously read copy.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user record does not exist.
    async fn update_cooking(
        &self,
        id: &UserId,
        update: &CookingUpdate,
    ) -> Result<(), StorageError>;

    /// Update profile fields and return the stored record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user record does not exist, or
    /// `StorageError::Serialization` if the new values are invalid.
    async fn update_profile(
        &self,
        id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<User, StorageError>;
}

/// Repository contract for the `recipes` collection.
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the recipe cannot be stored.
    async fn upsert_recipe(&self, recipe: &Recipe) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn get_recipe(&self, id: &RecipeId) -> Result<Option<Recipe>, StorageError>;

    /// Full-collection read.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn list_recipes(&self) -> Result<Vec<Recipe>, StorageError>;
}

/// Repository contract for the `supermarkets` collection.
#[async_trait]
pub trait SupermarketRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the supermarket cannot be stored.
    async fn upsert_supermarket(&self, supermarket: &Supermarket) -> Result<(), StorageError>;

    /// Full-collection read.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn list_supermarkets(&self) -> Result<Vec<Supermarket>, StorageError>;
}

/// Email/password identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register a new account under a freshly allocated user id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the email is already registered.
    async fn create_account(&self, email: &str, password: &str) -> Result<Account, StorageError>;

    /// Check credentials. `Ok(None)` means unknown email or wrong password.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the provider cannot be reached.
    async fn verify(&self, email: &str, password: &str) -> Result<Option<Account>, StorageError>;

    /// Remove an account. Deleting an unknown account is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the provider cannot be reached.
    async fn delete_account(&self, account: &Account) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Every operation takes a single lock, so set updates are atomic. The store
/// can be switched offline to exercise transport failures.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    users: Arc<Mutex<HashMap<UserId, User>>>,
    recipes: Arc<Mutex<HashMap<RecipeId, Recipe>>>,
    supermarkets: Arc<Mutex<HashMap<SupermarketId, Supermarket>>>,
    accounts: Arc<Mutex<HashMap<String, (UserId, PasswordHash)>>>,
    offline: Arc<AtomicBool>,
    cooking_writes: Arc<AtomicUsize>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing (or regaining) the connection to the store.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of `update_cooking` calls that reached the store.
    #[must_use]
    pub fn cooking_writes(&self) -> usize {
        self.cooking_writes.load(Ordering::SeqCst)
    }

    fn ensure_online(&self) -> Result<(), StorageError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StorageError::Connection("store is offline".into()))
        } else {
            Ok(())
        }
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn create_user(&self, user: &User) -> Result<(), StorageError> {
        self.ensure_online()?;
        let mut guard = self.users.lock().map_err(poisoned)?;
        if guard.contains_key(user.id()) {
            return Err(StorageError::Conflict);
        }
        guard.insert(user.id().clone(), user.clone());
        Ok(())
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, StorageError> {
        self.ensure_online()?;
        let guard = self.users.lock().map_err(poisoned)?;
        Ok(guard.get(id).cloned())
    }

    async fn update_cooking(
        &self,
        id: &UserId,
        update: &CookingUpdate,
    ) -> Result<(), StorageError> {
        self.ensure_online()?;
        let mut guard = self.users.lock().map_err(poisoned)?;
        let user = guard.get_mut(id).ok_or(StorageError::NotFound)?;
        self.cooking_writes.fetch_add(1, Ordering::SeqCst);
        user.apply(update);
        Ok(())
    }

    async fn update_profile(
        &self,
        id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<User, StorageError> {
        self.ensure_online()?;
        let mut guard = self.users.lock().map_err(poisoned)?;
        let user = guard.get_mut(id).ok_or(StorageError::NotFound)?;
        let mut updated = user.clone();
        if let Some(name) = &update.username {
            updated
                .rename(name.as_str())
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
        }
        if let Some(photo) = &update.photo_ref {
            updated.set_photo(Some(photo.clone()));
        }
        *user = updated.clone();
        Ok(updated)
    }
}

#[async_trait]
impl RecipeRepository for InMemoryRepository {
    async fn upsert_recipe(&self, recipe: &Recipe) -> Result<(), StorageError> {
        self.ensure_online()?;
        let mut guard = self.recipes.lock().map_err(poisoned)?;
        guard.insert(recipe.id().clone(), recipe.clone());
        Ok(())
    }

    async fn get_recipe(&self, id: &RecipeId) -> Result<Option<Recipe>, StorageError> {
        self.ensure_online()?;
        let guard = self.recipes.lock().map_err(poisoned)?;
        Ok(guard.get(id).cloned())
    }

    async fn list_recipes(&self) -> Result<Vec<Recipe>, StorageError> {
        self.ensure_online()?;
        let guard = self.recipes.lock().map_err(poisoned)?;
        Ok(guard.values().cloned().collect())
    }
}

#[async_trait]
impl SupermarketRepository for InMemoryRepository {
    async fn upsert_supermarket(&self, supermarket: &Supermarket) -> Result<(), StorageError> {
        self.ensure_online()?;
        let mut guard = self.supermarkets.lock().map_err(poisoned)?;
        guard.insert(supermarket.id.clone(), supermarket.clone());
        Ok(())
    }

    async fn list_supermarkets(&self) -> Result<Vec<Supermarket>, StorageError> {
        self.ensure_online()?;
        let guard = self.supermarkets.lock().map_err(poisoned)?;
        Ok(guard.values().cloned().collect())
    }
}

#[async_trait]
impl IdentityProvider for InMemoryRepository {
    async fn create_account(&self, email: &str, password: &str) -> Result<Account, StorageError> {
        self.ensure_online()?;
        let mut guard = self.accounts.lock().map_err(poisoned)?;
        if guard.contains_key(email) {
            return Err(StorageError::Conflict);
        }
        let user_id = UserId::generate();
        guard.insert(
            email.to_owned(),
            (user_id.clone(), PasswordHash::create(password)?),
        );
        Ok(Account {
            user_id,
            email: email.to_owned(),
        })
    }

    async fn verify(&self, email: &str, password: &str) -> Result<Option<Account>, StorageError> {
        self.ensure_online()?;
        let guard = self.accounts.lock().map_err(poisoned)?;
        Ok(guard
            .get(email)
            .filter(|(_, hash)| hash.verify(password))
            .map(|(user_id, _)| Account {
                user_id: user_id.clone(),
                email: email.to_owned(),
            }))
    }

    async fn delete_account(&self, account: &Account) -> Result<(), StorageError> {
        self.ensure_online()?;
        let mut guard = self.accounts.lock().map_err(poisoned)?;
        if guard
            .get(&account.email)
            .is_some_and(|(user_id, _)| *user_id == account.user_id)
        {
            guard.remove(&account.email);
        }
        Ok(())
    }
}

/// Aggregates the collections behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserRepository>,
    pub recipes: Arc<dyn RecipeRepository>,
    pub supermarkets: Arc<dyn SupermarketRepository>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_in_memory(InMemoryRepository::new())
    }

    /// Wrap an existing in-memory repository, keeping a handle for test control.
    #[must_use]
    pub fn from_in_memory(repo: InMemoryRepository) -> Self {
        let users: Arc<dyn UserRepository> = Arc::new(repo.clone());
        let recipes: Arc<dyn RecipeRepository> = Arc::new(repo.clone());
        let supermarkets: Arc<dyn SupermarketRepository> = Arc::new(repo.clone());
        let identity: Arc<dyn IdentityProvider> = Arc::new(repo);
        Self {
            users,
            recipes,
            supermarkets,
            identity,
        }
    }
}
