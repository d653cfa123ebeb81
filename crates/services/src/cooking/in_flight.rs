use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use cook_core::model::{RecipeId, UserId};

type Key = (UserId, RecipeId);

/// Set of (user, recipe) pairs with a cooking update outstanding.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    pending: Arc<Mutex<HashSet<Key>>>,
}

impl InFlight {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the pair, or returns `None` if an update for it is already running.
    ///
    /// The claim is released when the returned guard is dropped.
    #[must_use]
    pub fn try_acquire(&self, user: &UserId, recipe: &RecipeId) -> Option<InFlightGuard> {
        let key = (user.clone(), recipe.clone());
        if !self.lock().insert(key.clone()) {
            return None;
        }
        Some(InFlightGuard {
            pending: Arc::clone(&self.pending),
            key,
        })
    }

    #[must_use]
    pub fn is_pending(&self, user: &UserId, recipe: &RecipeId) -> bool {
        self.lock().contains(&(user.clone(), recipe.clone()))
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<Key>> {
        self.pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Releases its pair on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    pending: Arc<Mutex<HashSet<Key>>>,
    key: Key,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut pending = self
            .pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        pending.remove(&self.key);
    }
}
