//! User identity and profile model.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use super::{CurrencyCode, Principal};

/// Validation errors for user-facing identity values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// The identifier was empty.
    #[error("user id must not be empty")]
    EmptyId,
    /// The identifier carried leading or trailing whitespace.
    #[error("user id must not contain surrounding whitespace")]
    PaddedId,
    /// The display name was blank once trimmed.
    #[error("display name must not be empty")]
    EmptyDisplayName,
}

/// Opaque identifier issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a [`UserId`].
    pub fn new(id: impl Into<String>) -> Result<Self, UserValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::PaddedId);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Name chosen during profile completion, stored trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate and construct a [`DisplayName`].
    pub fn new(name: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyDisplayName);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Profile document stored per user.
///
/// `name` may be empty for a provisional record when the provider supplied
/// no display name; profile completion always sets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Provider-issued identifier; also the document key.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email claim from the provider.
    pub email: String,
    /// Preferred currency for amounts.
    pub currency: CurrencyCode,
    /// Avatar image, when the provider has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<Url>,
}

impl UserProfile {
    /// Build the record used until the profile document is known.
    ///
    /// # Examples
    /// ```
    /// use tally::domain::{Principal, UserId, UserProfile};
    ///
    /// let principal = Principal::new(UserId::new("uid-1").expect("id"));
    /// let profile = UserProfile::provisional(&principal);
    /// assert_eq!(profile.currency.as_ref(), "USD");
    /// ```
    pub fn provisional(principal: &Principal) -> Self {
        Self {
            id: principal.uid.clone(),
            name: principal.display_name.clone().unwrap_or_default(),
            email: principal.email.clone().unwrap_or_default(),
            currency: CurrencyCode::usd(),
            avatar_url: principal.photo_url.clone(),
        }
    }

    /// Apply the values chosen during profile completion.
    pub fn completed(self, name: DisplayName, currency: CurrencyCode) -> Self {
        Self {
            name: name.into(),
            currency,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("", UserValidationError::EmptyId)]
    #[case(" uid", UserValidationError::PaddedId)]
    #[case("uid\n", UserValidationError::PaddedId)]
    fn user_id_rejects_invalid_input(#[case] raw: &str, #[case] expected: UserValidationError) {
        assert_eq!(UserId::new(raw), Err(expected));
    }

    #[rstest]
    #[case("  Alex ", "Alex")]
    #[case("Ada Lovelace", "Ada Lovelace")]
    fn display_name_is_trimmed(#[case] raw: &str, #[case] expected: &str) {
        let name = DisplayName::new(raw).expect("valid name");
        assert_eq!(name.as_ref(), expected);
    }

    #[test]
    fn display_name_rejects_blank() {
        assert_eq!(
            DisplayName::new("   "),
            Err(UserValidationError::EmptyDisplayName)
        );
    }

    #[test]
    fn provisional_profile_copies_claims() {
        let mut principal = Principal::new(UserId::new("uid-7").expect("id"));
        principal.display_name = Some("Sam".into());
        principal.email = Some("sam@example.com".into());

        let profile = UserProfile::provisional(&principal);

        assert_eq!(profile.id.as_ref(), "uid-7");
        assert_eq!(profile.name, "Sam");
        assert_eq!(profile.email, "sam@example.com");
        assert_eq!(profile.currency, CurrencyCode::usd());
        assert!(profile.avatar_url.is_none());
    }

    #[test]
    fn completed_profile_replaces_name_and_currency() {
        let principal = Principal::new(UserId::new("uid-7").expect("id"));
        let profile = UserProfile::provisional(&principal).completed(
            DisplayName::new("Alex").expect("name"),
            CurrencyCode::new("EUR").expect("code"),
        );

        let value = serde_json::to_value(&profile).expect("serialises");
        assert_eq!(
            value,
            json!({ "id": "uid-7", "name": "Alex", "email": "", "currency": "EUR" })
        );
    }
}
