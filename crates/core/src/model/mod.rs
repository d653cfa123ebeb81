mod ids;
mod media;
mod recipe;
mod steps;
mod supermarket;
mod user;

pub use ids::{MAX_ID_LEN, ParseIdError, RecipeId, SupermarketId, UserId};
pub use media::{ImageRef, ImageRefError};
pub use recipe::{Category, Recipe, RecipeDraft, RecipeError};
pub use steps::{ProgressTween, StepError, StepProgress};
pub use supermarket::{GeoError, GeoPoint, Supermarket};
pub use user::{CookingSet, CookingUpdate, User, UserError, normalize_email};
