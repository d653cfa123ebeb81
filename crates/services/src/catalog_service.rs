use std::sync::Arc;

use tracing::debug;

use cook_core::model::{Category, Recipe, RecipeId, Supermarket};
use storage::repository::{RecipeRepository, SupermarketRepository};

use crate::error::CatalogError;

/// Read-only access to recipes and supermarkets.
#[derive(Clone)]
pub struct CatalogService {
    recipes: Arc<dyn RecipeRepository>,
    supermarkets: Arc<dyn SupermarketRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(
        recipes: Arc<dyn RecipeRepository>,
        supermarkets: Arc<dyn SupermarketRepository>,
    ) -> Self {
        Self {
            recipes,
            supermarkets,
        }
    }

    /// Every recipe, in store order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::StoreUnavailable` if the store cannot be read.
    pub async fn list_recipes(&self) -> Result<Vec<Recipe>, CatalogError> {
        let recipes = self.recipes.list_recipes().await?;
        debug!(count = recipes.len(), "listed recipes");
        Ok(recipes)
    }

    /// Every supermarket, in store order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::StoreUnavailable` if the store cannot be read.
    pub async fn list_supermarkets(&self) -> Result<Vec<Supermarket>, CatalogError> {
        let markets = self.supermarkets.list_supermarkets().await?;
        debug!(count = markets.len(), "listed supermarkets");
        Ok(markets)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::RecipeNotFound` for an unknown id and
    /// `StoreUnavailable` if the store cannot be read.
    pub async fn get_recipe(&self, id: &RecipeId) -> Result<Recipe, CatalogError> {
        self.recipes
            .get_recipe(id)
            .await?
            .ok_or_else(|| CatalogError::RecipeNotFound(id.clone()))
    }
}

/// Recipes matching a category chip. `Category::All` keeps everything.
#[must_use]
pub fn filter_by_category<'a>(recipes: &'a [Recipe], filter: &Category) -> Vec<&'a Recipe> {
    recipes
        .iter()
        .filter(|r| r.category().matches(filter))
        .collect()
}
