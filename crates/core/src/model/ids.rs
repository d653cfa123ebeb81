use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Longest document id accepted by the store.
pub const MAX_ID_LEN: usize = 128;

/// Error type for parsing an ID from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
    reason: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {}", self.kind, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

fn validate_id(kind: &'static str, raw: &str) -> Result<String, ParseIdError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseIdError {
            kind,
            reason: "id cannot be empty",
        });
    }
    if trimmed.len() > MAX_ID_LEN {
        return Err(ParseIdError {
            kind,
            reason: "id is too long",
        });
    }
    if trimmed.contains('/') {
        return Err(ParseIdError {
            kind,
            reason: "id cannot contain '/'",
        });
    }
    Ok(trimmed.to_owned())
}

/// Document id of a user record.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Creates a `UserId` from a raw document id.
    ///
    /// # Errors
    ///
    /// Returns `ParseIdError` if the id is empty, too long, or contains a path separator.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ParseIdError> {
        validate_id("UserId", raw.as_ref()).map(Self)
    }

    /// Allocates a fresh random id, as the identity provider does at sign-up.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Document id of a recipe.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecipeId(String);

impl RecipeId {
    /// Creates a `RecipeId` from a raw document id.
    ///
    /// # Errors
    ///
    /// Returns `ParseIdError` if the id is empty, too long, or contains a path separator.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ParseIdError> {
        validate_id("RecipeId", raw.as_ref()).map(Self)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Document id of a supermarket.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SupermarketId(String);

impl SupermarketId {
    /// Creates a `SupermarketId` from a raw document id.
    ///
    /// # Errors
    ///
    /// Returns `ParseIdError` if the id is empty, too long, or contains a path separator.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ParseIdError> {
        validate_id("SupermarketId", raw.as_ref()).map(Self)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ─── Debug / Display ───────────────────────────────────────────────────────────

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Debug for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecipeId({})", self.0)
    }
}

impl fmt::Debug for SupermarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SupermarketId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for SupermarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── Conversions ───────────────────────────────────────────────────────────────

impl FromStr for UserId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl FromStr for RecipeId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl FromStr for SupermarketId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for UserId {
    type Error = ParseIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for RecipeId {
    type Error = ParseIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for SupermarketId {
    type Error = ParseIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl From<RecipeId> for String {
    fn from(value: RecipeId) -> Self {
        value.0
    }
}

impl From<SupermarketId> for String {
    fn from(value: SupermarketId) -> Self {
        value.0
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
