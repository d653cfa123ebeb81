use cook_core::model::{Recipe, RecipeId};

use super::SqliteRepository;
use super::mapping::{conn, image_to_column, map_recipe_row, strings_to_json};
use crate::repository::{RecipeRepository, StorageError};

#[async_trait::async_trait]
impl RecipeRepository for SqliteRepository {
    async fn upsert_recipe(&self, recipe: &Recipe) -> Result<(), StorageError> {
        let materials = strings_to_json(recipe.materials())?;
        let steps = strings_to_json(recipe.steps())?;

        sqlx::query(
            r"
            INSERT INTO recipes
                (id, name, category, duration, description, image, image_detail, materials, steps)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                category = excluded.category,
                duration = excluded.duration,
                description = excluded.description,
                image = excluded.image,
                image_detail = excluded.image_detail,
                materials = excluded.materials,
                steps = excluded.steps
            ",
        )
        .bind(recipe.id().as_str())
        .bind(recipe.name())
        .bind(recipe.category().label())
        .bind(recipe.duration())
        .bind(recipe.description())
        .bind(image_to_column(recipe.image()))
        .bind(image_to_column(recipe.image_detail()))
        .bind(materials)
        .bind(steps)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn get_recipe(&self, id: &RecipeId) -> Result<Option<Recipe>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, name, category, duration, description, image, image_detail, materials, steps
            FROM recipes WHERE id = ?1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_recipe_row).transpose()
    }

    async fn list_recipes(&self) -> Result<Vec<Recipe>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, name, category, duration, description, image, image_detail, materials, steps
            FROM recipes
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut recipes = Vec::with_capacity(rows.len());
        for row in &rows {
            recipes.push(map_recipe_row(row)?);
        }
        Ok(recipes)
    }
}
