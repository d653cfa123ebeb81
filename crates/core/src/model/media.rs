use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImageRefError {
    #[error("image reference cannot be empty")]
    Empty,

    #[error("image reference is not a valid URL or path: {0}")]
    Invalid(String),
}

/// Reference to an image: a remote URL for catalog pictures, or a local file
/// picked from the device library for profile photos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ImageRef {
    Url(Url),
    FilePath(PathBuf),
}

impl ImageRef {
    /// Parses a stored image reference.
    ///
    /// Absolute URLs (including `file://`) are kept as URLs; anything starting
    /// with `/` is treated as a local path.
    ///
    /// # Errors
    ///
    /// Returns `ImageRefError` for empty or unparseable references.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, ImageRefError> {
        let s = raw.as_ref().trim();
        if s.is_empty() {
            return Err(ImageRefError::Empty);
        }
        if s.starts_with('/') {
            return Ok(Self::FilePath(PathBuf::from(s)));
        }
        Url::parse(s)
            .map(Self::Url)
            .map_err(|_| ImageRefError::Invalid(s.to_owned()))
    }

    #[must_use]
    pub fn as_url(&self) -> Option<&Url> {
        match self {
            Self::Url(u) => Some(u),
            Self::FilePath(_) => None,
        }
    }

    #[must_use]
    pub fn is_local(&self) -> bool {
        match self {
            Self::FilePath(_) => true,
            Self::Url(u) => u.scheme() == "file",
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(u) => f.write_str(u.as_str()),
            Self::FilePath(p) => write!(f, "{}", p.display()),
        }
    }
}

impl TryFrom<String> for ImageRef {
    type Error = ImageRefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ImageRef> for String {
    fn from(value: ImageRef) -> Self {
        value.to_string()
    }
}
