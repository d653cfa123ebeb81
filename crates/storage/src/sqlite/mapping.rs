use cook_core::model::{
    CookingSet, GeoPoint, ImageRef, Recipe, RecipeDraft, RecipeId, Supermarket, SupermarketId,
    User, UserId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn image_from_column(raw: Option<String>) -> Result<Option<ImageRef>, StorageError> {
    raw.filter(|s| !s.trim().is_empty())
        .map(ImageRef::parse)
        .transpose()
        .map_err(ser)
}

pub(crate) fn image_to_column(image: Option<&ImageRef>) -> Option<String> {
    image.map(ToString::to_string)
}

pub(crate) fn strings_to_json(items: &[String]) -> Result<String, StorageError> {
    serde_json::to_string(items).map_err(ser)
}

fn strings_from_json(field: &'static str, raw: &str) -> Result<Vec<String>, StorageError> {
    serde_json::from_str(raw)
        .map_err(|e| StorageError::Serialization(format!("invalid {field} column: {e}")))
}

/// Builds a `User` from a `users` row plus its `user_cooking` rows.
pub(crate) fn map_user_row(row: &SqliteRow, cooking: Vec<String>) -> Result<User, StorageError> {
    let cooking = cooking
        .into_iter()
        .map(RecipeId::new)
        .collect::<Result<CookingSet, _>>()
        .map_err(ser)?;

    User::from_persisted(
        UserId::new(row.try_get::<String, _>("id").map_err(ser)?).map_err(ser)?,
        row.try_get::<String, _>("username").map_err(ser)?,
        row.try_get::<String, _>("email").map_err(ser)?,
        image_from_column(row.try_get("photo_ref").map_err(ser)?)?,
        row.try_get("created_at").map_err(ser)?,
        cooking,
    )
    .map_err(ser)
}

pub(crate) fn map_recipe_row(row: &SqliteRow) -> Result<Recipe, StorageError> {
    let materials: String = row.try_get("materials").map_err(ser)?;
    let steps: String = row.try_get("steps").map_err(ser)?;

    RecipeDraft {
        id: RecipeId::new(row.try_get::<String, _>("id").map_err(ser)?).map_err(ser)?,
        name: row.try_get("name").map_err(ser)?,
        category: row.try_get::<String, _>("category").map_err(ser)?.into(),
        duration: row.try_get("duration").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        image: image_from_column(row.try_get("image").map_err(ser)?)?,
        image_detail: image_from_column(row.try_get("image_detail").map_err(ser)?)?,
        materials: strings_from_json("materials", &materials)?,
        steps: strings_from_json("steps", &steps)?,
    }
    .validate()
    .map_err(ser)
}

pub(crate) fn map_supermarket_row(row: &SqliteRow) -> Result<Supermarket, StorageError> {
    let geopoint = GeoPoint::new(
        row.try_get("latitude").map_err(ser)?,
        row.try_get("longitude").map_err(ser)?,
    )
    .map_err(ser)?;

    Supermarket::new(
        SupermarketId::new(row.try_get::<String, _>("id").map_err(ser)?).map_err(ser)?,
        row.try_get::<String, _>("name").map_err(ser)?,
        row.try_get::<String, _>("location").map_err(ser)?,
        geopoint,
    )
    .map_err(ser)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_lists_round_trip() {
        let steps = vec!["Boil water".to_string(), "Add \"salt\"".to_string()];
        let raw = strings_to_json(&steps).unwrap();
        assert_eq!(strings_from_json("steps", &raw).unwrap(), steps);
    }

    #[test]
    fn malformed_json_names_the_column() {
        let err = strings_from_json("materials", "{not json").unwrap_err();
        assert!(err.to_string().contains("materials"));
    }

    #[test]
    fn blank_image_column_reads_as_none() {
        assert_eq!(image_from_column(Some("  ".into())).unwrap(), None);
        assert_eq!(image_from_column(None).unwrap(), None);
        assert!(image_from_column(Some("https://x.test/a.png".into()))
            .unwrap()
            .is_some());
    }
}
