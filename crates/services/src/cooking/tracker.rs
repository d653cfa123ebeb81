use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use cook_core::model::{CookingUpdate, RecipeId, User, UserId};
use storage::repository::UserRepository;

use super::in_flight::{InFlight, InFlightGuard};
use crate::error::CookingError;

type Key = (UserId, RecipeId);
type Watchers = HashMap<Key, watch::Sender<Option<bool>>>;

/// Tracks which recipes a user is currently cooking.
///
/// Writes go through the store's set-add / set-remove primitives only. Every
/// status the tracker observes is published to the watchers of that pair.
#[derive(Clone)]
pub struct CookingTracker {
    users: Arc<dyn UserRepository>,
    in_flight: InFlight,
    watchers: Arc<Mutex<Watchers>>,
}

impl CookingTracker {
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self {
            users,
            in_flight: InFlight::new(),
            watchers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Whether `recipe` is in `user`'s cooking set. Read-only.
    ///
    /// # Errors
    ///
    /// Returns `CookingError::UserNotFound` if the user record is missing and
    /// `StoreUnavailable` if the store cannot be read.
    pub async fn query_status(
        &self,
        user: &UserId,
        recipe: &RecipeId,
    ) -> Result<bool, CookingError> {
        let record = self.load_user(user).await?;
        let cooking = record.is_cooking(recipe);
        debug!(%user, %recipe, cooking, "queried cooking status");
        self.publish(user, recipe, cooking);
        Ok(cooking)
    }

    /// Same as [`CookingTracker::query_status`], also published to watchers.
    ///
    /// # Errors
    ///
    /// See [`CookingTracker::query_status`].
    pub async fn refresh(&self, user: &UserId, recipe: &RecipeId) -> Result<bool, CookingError> {
        self.query_status(user, recipe).await
    }

    /// Statuses for several recipes from a single read of the user record.
    ///
    /// # Errors
    ///
    /// See [`CookingTracker::query_status`].
    pub async fn statuses(
        &self,
        user: &UserId,
        recipes: &[RecipeId],
    ) -> Result<HashMap<RecipeId, bool>, CookingError> {
        let record = self.load_user(user).await?;
        let out: HashMap<RecipeId, bool> = recipes
            .iter()
            .map(|recipe| (recipe.clone(), record.is_cooking(recipe)))
            .collect();
        for (recipe, cooking) in &out {
            self.publish(user, recipe, *cooking);
        }
        Ok(out)
    }

    /// Marks `recipe` as being cooked and returns the re-read status.
    ///
    /// No write is issued when the recipe is already in the set.
    ///
    /// # Errors
    ///
    /// Returns `CookingError::Busy` while another update for the same pair is
    /// running, `UserNotFound` if the user record is missing (nothing is
    /// written), and `StoreUnavailable` on transport failure.
    pub async fn start(&self, user: &UserId, recipe: &RecipeId) -> Result<bool, CookingError> {
        let _guard = self.acquire(user, recipe)?;

        let record = self.load_user(user).await?;
        if record.is_cooking(recipe) {
            debug!(%user, %recipe, "already cooking");
        } else {
            self.users
                .update_cooking(user, &CookingUpdate::Add(recipe.clone()))
                .await
                .map_err(|err| CookingError::from_user_storage(user, err))?;
            info!(%user, %recipe, "started cooking");
        }

        self.query_status(user, recipe).await
    }

    /// Removes `recipe` from the cooking set and returns the re-read status.
    ///
    /// The removal is unconditional; finishing a recipe that is not being
    /// cooked still succeeds.
    ///
    /// # Errors
    ///
    /// Returns `CookingError::Busy` while another update for the same pair is
    /// running, `UserNotFound` if the user record is missing, and
    /// `StoreUnavailable` on transport failure.
    pub async fn finish(&self, user: &UserId, recipe: &RecipeId) -> Result<bool, CookingError> {
        let _guard = self.acquire(user, recipe)?;

        self.users
            .update_cooking(user, &CookingUpdate::Remove(recipe.clone()))
            .await
            .map_err(|err| CookingError::from_user_storage(user, err))?;
        info!(%user, %recipe, "finished cooking");

        self.query_status(user, recipe).await
    }

    /// Subscribe to status changes for one pair.
    ///
    /// The watch starts with the last status seen for the pair, if any.
    #[must_use]
    pub fn watch(&self, user: &UserId, recipe: &RecipeId) -> StatusWatch {
        let mut watchers = self.lock_watchers();
        let rx = watchers
            .entry((user.clone(), recipe.clone()))
            .or_insert_with(|| watch::channel(None).0)
            .subscribe();
        StatusWatch { rx }
    }

    fn acquire(&self, user: &UserId, recipe: &RecipeId) -> Result<InFlightGuard, CookingError> {
        self.in_flight.try_acquire(user, recipe).ok_or_else(|| {
            debug!(%user, %recipe, "cooking update already in flight");
            CookingError::Busy {
                user: user.clone(),
                recipe: recipe.clone(),
            }
        })
    }

    async fn load_user(&self, user: &UserId) -> Result<User, CookingError> {
        match self.users.get_user(user).await {
            Ok(Some(record)) => Ok(record),
            Ok(None) => {
                warn!(%user, "user not found");
                Err(CookingError::UserNotFound(user.clone()))
            }
            Err(err) => {
                warn!(%user, error = %err, "failed to read user");
                Err(CookingError::from_user_storage(user, err))
            }
        }
    }

    fn publish(&self, user: &UserId, recipe: &RecipeId, cooking: bool) {
        let key = (user.clone(), recipe.clone());
        let mut watchers = self.lock_watchers();
        let Some(tx) = watchers.get(&key) else {
            return;
        };
        if tx.receiver_count() == 0 {
            watchers.remove(&key);
        } else {
            tx.send_replace(Some(cooking));
        }
    }

    fn lock_watchers(&self) -> MutexGuard<'_, Watchers> {
        self.watchers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Receiving end of [`CookingTracker::watch`].
#[derive(Debug, Clone)]
pub struct StatusWatch {
    rx: watch::Receiver<Option<bool>>,
}

impl StatusWatch {
    /// Last published status, `None` before the first observation.
    #[must_use]
    pub fn current(&self) -> Option<bool> {
        *self.rx.borrow()
    }

    /// Waits for the next published status.
    ///
    /// Returns `None` once the tracker has gone away.
    pub async fn next(&mut self) -> Option<bool> {
        loop {
            self.rx.changed().await.ok()?;
            if let Some(cooking) = *self.rx.borrow_and_update() {
                return Some(cooking);
            }
        }
    }
}
