//! Spending categories.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;

/// Glyph used when a category is created without one.
pub const FALLBACK_GLYPH: &str = "📁";

/// Categories materialised for a user who has none.
pub const DEFAULT_CATEGORIES: [(&str, &str); 8] = [
    ("Groceries", "🛒"),
    ("Transport", "🚌"),
    ("Food", "🍔"),
    ("Entertainment", "🎬"),
    ("Bills", "🧾"),
    ("Shopping", "🛍️"),
    ("Healthcare", "🏥"),
    ("Education", "📚"),
];

/// Validation errors for category input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CategoryValidationError {
    /// The name was blank once trimmed.
    #[error("category name must not be empty")]
    EmptyName,
}

/// Document identifier of a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(Uuid);

impl CategoryId {
    /// Allocate a fresh identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Trimmed, non-empty category name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CategoryName(String);

impl CategoryName {
    /// Validate and construct a [`CategoryName`].
    pub fn new(name: impl AsRef<str>) -> Result<Self, CategoryValidationError> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CategoryValidationError::EmptyName);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Case-insensitive comparison used for uniqueness and lookup.
    ///
    /// # Examples
    /// ```
    /// use tally::domain::CategoryName;
    ///
    /// let food = CategoryName::new("Food").expect("name");
    /// assert!(food.matches("FOOD"));
    /// assert!(!food.matches("Foods"));
    /// ```
    pub fn matches(&self, other: &str) -> bool {
        self.0.to_lowercase() == other.trim().to_lowercase()
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for CategoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<CategoryName> for String {
    fn from(value: CategoryName) -> Self {
        value.0
    }
}

impl TryFrom<String> for CategoryName {
    type Error = CategoryValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Normalise an optional glyph, falling back to [`FALLBACK_GLYPH`].
pub fn glyph_or_default(glyph: Option<&str>) -> String {
    glyph
        .map(str::trim)
        .filter(|glyph| !glyph.is_empty())
        .unwrap_or(FALLBACK_GLYPH)
        .to_owned()
}

/// A stored category document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Document identifier.
    pub id: CategoryId,
    /// Display name, unique per user ignoring case.
    pub name: CategoryName,
    /// Emoji shown next to the name.
    pub glyph: String,
    /// Whether the category was seeded automatically.
    pub is_default: bool,
    /// Owning user.
    pub user_id: UserId,
}

/// Insert payload for a category document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    /// Owning user.
    pub user_id: UserId,
    /// Display name.
    pub name: CategoryName,
    /// Emoji shown next to the name.
    pub glyph: String,
    /// Whether the category is one of [`DEFAULT_CATEGORIES`].
    pub is_default: bool,
}

impl NewCategory {
    /// Payloads for every default category of `user_id`.
    pub fn defaults_for(user_id: &UserId) -> Vec<Self> {
        DEFAULT_CATEGORIES
            .iter()
            .filter_map(|(name, glyph)| {
                CategoryName::new(name).ok().map(|name| Self {
                    user_id: user_id.clone(),
                    name,
                    glyph: (*glyph).to_owned(),
                    is_default: true,
                })
            })
            .collect()
    }
}
