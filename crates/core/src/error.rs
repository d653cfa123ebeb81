use thiserror::Error;

use crate::model::{GeoError, ImageRefError, ParseIdError, RecipeError, StepError, UserError};

/// Any domain validation failure.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Id(#[from] ParseIdError),
    #[error(transparent)]
    Image(#[from] ImageRefError),
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Recipe(#[from] RecipeError),
    #[error(transparent)]
    Geo(#[from] GeoError),
    #[error(transparent)]
    Steps(#[from] StepError),
}
