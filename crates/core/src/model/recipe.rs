use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::RecipeId;
use crate::model::media::ImageRef;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RecipeError {
    #[error("recipe name cannot be empty")]
    EmptyName,

    #[error("recipe step {index} is blank")]
    BlankStep { index: usize },
}

//
// ─── CATEGORY ──────────────────────────────────────────────────────────────────
//

/// Recipe category shown as filter chips on the home list.
///
/// `All` is the filter pseudo-category. Only [`Category::filter`] produces it;
/// a stored `"All"` reads back as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Category {
    All,
    Main,
    Salads,
    Soups,
    Snacks,
    Desserts,
    Drinks,
    Other(String),
}

impl Category {
    /// Chips in display order.
    pub const CHIPS: [Category; 7] = [
        Category::All,
        Category::Main,
        Category::Salads,
        Category::Soups,
        Category::Snacks,
        Category::Desserts,
        Category::Drinks,
    ];

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::All => "All",
            Self::Main => "Main",
            Self::Salads => "Salads",
            Self::Soups => "Soups",
            Self::Snacks => "Snacks",
            Self::Desserts => "Desserts",
            Self::Drinks => "Drinks",
            Self::Other(raw) => raw,
        }
    }

    /// Parse a filter chip name, where `"all"` selects every recipe.
    #[must_use]
    pub fn filter(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::from(raw.to_owned())
        }
    }

    /// Whether a recipe in `self` passes the `filter` chip.
    #[must_use]
    pub fn matches(&self, filter: &Category) -> bool {
        matches!(filter, Category::All) || self == filter
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for Category {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "main" | "main course" => Self::Main,
            "salad" | "salads" | "vegetables" => Self::Salads,
            "soup" | "soups" => Self::Soups,
            "snack" | "snacks" => Self::Snacks,
            "dessert" | "desserts" => Self::Desserts,
            "drink" | "drinks" => Self::Drinks,
            _ => Self::Other(raw.trim().to_owned()),
        }
    }
}

impl FromStr for Category {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_owned()))
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.label().to_owned()
    }
}

//
// ─── RECIPE ────────────────────────────────────────────────────────────────────
//

/// Read-only reference data from the `recipes` collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    id: RecipeId,
    name: String,
    category: Category,
    duration: String,
    description: String,
    image: Option<ImageRef>,
    image_detail: Option<ImageRef>,
    materials: Vec<String>,
    steps: Vec<String>,
}

/// Unvalidated recipe fields, as read from a document or a seed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeDraft {
    pub id: RecipeId,
    pub name: String,
    #[serde(default = "default_category")]
    pub category: Category,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<ImageRef>,
    #[serde(default, rename = "imageDetail", alias = "image_detail")]
    pub image_detail: Option<ImageRef>,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub steps: Vec<String>,
}

fn default_category() -> Category {
    Category::Other(String::new())
}

impl RecipeDraft {
    /// # Errors
    ///
    /// Returns `RecipeError` for an empty name or a whitespace-only step.
    pub fn validate(self) -> Result<Recipe, RecipeError> {
        let name = self.name.trim().to_owned();
        if name.is_empty() {
            return Err(RecipeError::EmptyName);
        }
        if let Some(index) = self.steps.iter().position(|s| s.trim().is_empty()) {
            return Err(RecipeError::BlankStep { index });
        }
        Ok(Recipe {
            id: self.id,
            name,
            category: self.category,
            duration: self.duration.trim().to_owned(),
            description: self.description,
            image: self.image,
            image_detail: self.image_detail,
            materials: self.materials,
            steps: self.steps,
        })
    }
}

impl Recipe {
    #[must_use]
    pub fn id(&self) -> &RecipeId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn category(&self) -> &Category {
        &self.category
    }

    /// Free-form duration label, e.g. "45 min".
    #[must_use]
    pub fn duration(&self) -> &str {
        &self.duration
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn image(&self) -> Option<&ImageRef> {
        self.image.as_ref()
    }

    #[must_use]
    pub fn image_detail(&self) -> Option<&ImageRef> {
        self.image_detail.as_ref()
    }

    #[must_use]
    pub fn materials(&self) -> &[String] {
        &self.materials
    }

    #[must_use]
    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    /// Recipes without steps offer no cooking flow.
    #[must_use]
    pub fn is_cookable(&self) -> bool {
        !self.steps.is_empty()
    }

    #[must_use]
    pub fn into_draft(self) -> RecipeDraft {
        RecipeDraft {
            id: self.id,
            name: self.name,
            category: self.category,
            duration: self.duration,
            description: self.description,
            image: self.image,
            image_detail: self.image_detail,
            materials: self.materials,
            steps: self.steps,
        }
    }
}
