//! Income and expense records.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Amount, Category, UserId};

/// Validation errors for transaction input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransactionValidationError {
    /// The note was blank once trimmed.
    #[error("note must not be empty")]
    EmptyNote,
    /// The direction was neither `spent` nor `received`.
    #[error("direction must be `spent` or `received`, got {0:?}")]
    UnknownDirection(String),
}

/// Document identifier of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Allocate a fresh identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID, e.g. from a path segment.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Whether money left or arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Expense.
    Spent,
    /// Income.
    Received,
}

impl FromStr for Direction {
    type Err = TransactionValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "spent" => Ok(Self::Spent),
            "received" => Ok(Self::Received),
            other => Err(TransactionValidationError::UnknownDirection(other.to_owned())),
        }
    }
}

/// Trimmed, non-empty free-text note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Note(String);

impl Note {
    /// Validate and construct a [`Note`].
    pub fn new(note: impl AsRef<str>) -> Result<Self, TransactionValidationError> {
        let trimmed = note.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TransactionValidationError::EmptyNote);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Note {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<Note> for String {
    fn from(value: Note) -> Self {
        value.0
    }
}

impl TryFrom<String> for Note {
    type Error = TransactionValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Category name and glyph copied onto a transaction when it is recorded.
///
/// Later category changes never rewrite existing transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySnapshot {
    /// Category name at creation time.
    pub name: String,
    /// Category glyph at creation time.
    pub glyph: String,
}

impl From<&Category> for CategorySnapshot {
    fn from(category: &Category) -> Self {
        Self {
            name: category.name.to_string(),
            glyph: category.glyph.clone(),
        }
    }
}

/// A stored transaction document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Document identifier.
    pub id: TransactionId,
    /// Non-negative amount.
    pub amount: Amount,
    /// Expense or income.
    pub direction: Direction,
    /// Free-text note.
    pub note: Note,
    /// Calendar day the transaction belongs to.
    pub date: NaiveDate,
    /// Denormalised category.
    pub category: CategorySnapshot,
    /// Owning user.
    pub user_id: UserId,
}

/// Insert payload for a transaction document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    /// Owning user.
    pub user_id: UserId,
    /// Non-negative amount.
    pub amount: Amount,
    /// Expense or income.
    pub direction: Direction,
    /// Free-text note.
    pub note: Note,
    /// Calendar day.
    pub date: NaiveDate,
    /// Denormalised category.
    pub category: CategorySnapshot,
}
