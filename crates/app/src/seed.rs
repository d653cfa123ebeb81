//! Catalog import from a JSON file.
//!
//! The file holds the two reference collections:
//!
//! ```json
//! {
//!   "recipes": [{ "id": "abc123", "name": "Soto Ayam", "category": "Soups", "steps": ["..."] }],
//!   "supermarkets": [{ "id": "s1", "name": "Superindo", "location": "Jl. Dago",
//!                      "geopoint": { "latitude": -6.89, "longitude": 107.61 } }]
//! }
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use cook_core::model::{Recipe, RecipeDraft, Supermarket};
use serde::Deserialize;
use storage::repository::Storage;
use tracing::{info, warn};

#[derive(Debug, Default, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub recipes: Vec<RecipeDraft>,
    #[serde(default)]
    pub supermarkets: Vec<Supermarket>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub recipes: usize,
    pub supermarkets: usize,
}

pub fn read_catalog(path: &Path) -> Result<CatalogFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse catalog file {}", path.display()))
}

/// Upsert every entry; re-seeding the same file is a no-op.
pub async fn seed_catalog(storage: &Storage, catalog: CatalogFile) -> Result<SeedReport> {
    let mut report = SeedReport {
        recipes: 0,
        supermarkets: 0,
    };

    for draft in catalog.recipes {
        let id = draft.id.clone();
        let recipe = validate_recipe(draft).with_context(|| format!("invalid recipe {id}"))?;
        if !recipe.is_cookable() {
            warn!("Recipe {} has no steps; it cannot be cooked", id);
        }
        storage.recipes.upsert_recipe(&recipe).await?;
        report.recipes += 1;
    }

    for market in catalog.supermarkets {
        let id = market.id.clone();
        let market =
            validate_supermarket(market).with_context(|| format!("invalid supermarket {id}"))?;
        storage.supermarkets.upsert_supermarket(&market).await?;
        report.supermarkets += 1;
    }

    info!(
        "Seeded {} recipes and {} supermarkets",
        report.recipes, report.supermarkets
    );
    Ok(report)
}

fn validate_recipe(draft: RecipeDraft) -> Result<Recipe, cook_core::Error> {
    Ok(draft.validate()?)
}

// Deserialization skips the constructor, so the name check runs here.
fn validate_supermarket(market: Supermarket) -> Result<Supermarket, cook_core::Error> {
    Ok(Supermarket::new(
        market.id,
        market.name,
        market.location,
        market.geopoint,
    )?)
}
