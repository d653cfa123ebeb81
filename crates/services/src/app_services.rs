use std::sync::Arc;

use cook_core::model::RecipeId;
use storage::repository::Storage;

use crate::Clock;
use crate::auth_service::AuthService;
use crate::catalog_service::CatalogService;
use crate::cooking::{CookingError, CookingTracker, StepWalker, WalkerSettings};
use crate::device::LocationProvider;
use crate::error::AppServicesError;
use crate::map_service::MapService;
use crate::session::SessionContext;

/// Assembles app-facing services around one storage backend and one session.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    settings: WalkerSettings,
    session: SessionContext,
    auth: Arc<AuthService>,
    catalog: Arc<CatalogService>,
    tracker: Arc<CookingTracker>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: WalkerSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, settings))
    }

    /// Build services backed by a fresh in-memory store.
    #[must_use]
    pub fn in_memory(clock: Clock, settings: WalkerSettings) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, settings)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, settings: WalkerSettings) -> Self {
        let session = SessionContext::new();
        let auth = Arc::new(AuthService::new(
            clock,
            Arc::clone(&storage.identity),
            Arc::clone(&storage.users),
            session.clone(),
        ));
        let catalog = Arc::new(CatalogService::new(
            Arc::clone(&storage.recipes),
            Arc::clone(&storage.supermarkets),
        ));
        let tracker = Arc::new(CookingTracker::new(Arc::clone(&storage.users)));

        Self {
            clock,
            settings,
            session,
            auth,
            catalog,
            tracker,
        }
    }

    #[must_use]
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    #[must_use]
    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth)
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn tracker(&self) -> Arc<CookingTracker> {
        Arc::clone(&self.tracker)
    }

    #[must_use]
    pub fn settings(&self) -> WalkerSettings {
        self.settings
    }

    #[must_use]
    pub fn map(&self, location: Arc<dyn LocationProvider>) -> MapService {
        MapService::new(self.catalog.as_ref().clone(), location)
    }

    /// Open the step walker for `recipe` on behalf of the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `CookingError::Unauthenticated` without a session,
    /// `RecipeNotFound` for an unknown recipe, and `InvalidInput` for a
    /// recipe without steps.
    pub async fn open_walker(&self, recipe: &RecipeId) -> Result<StepWalker, CookingError> {
        let user = self.session.user_id()?;
        let recipe = self.catalog.get_recipe(recipe).await?;
        StepWalker::new(
            self.tracker.as_ref().clone(),
            self.clock,
            user,
            &recipe,
            self.settings,
        )
    }
}
