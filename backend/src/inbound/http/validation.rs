//! Shared validation helpers for inbound HTTP adapters.
//!
//! Failures are `invalid_request` errors whose `details` name the offending
//! field, the rejected value and a stable code.

use chrono::NaiveDate;
use serde_json::json;
use uuid::Uuid;

use crate::domain::{
    Amount, CategoryName, CurrencyCode, Direction, DisplayName, Error, Note,
};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    BlankText,
    InvalidAmount,
    InvalidDirection,
    InvalidDate,
    InvalidCurrency,
    InvalidUuid,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::BlankText => "blank_text",
            ErrorCode::InvalidAmount => "invalid_amount",
            ErrorCode::InvalidDirection => "invalid_direction",
            ErrorCode::InvalidDate => "invalid_date",
            ErrorCode::InvalidCurrency => "invalid_currency",
            ErrorCode::InvalidUuid => "invalid_uuid",
        }
    }
}

/// Newtype wrapper for HTTP field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(self) -> &'static str {
        self.0
    }
}

fn rejected(field: FieldName, code: ErrorCode, message: String, value: &str) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "value": value,
        "code": code.as_str(),
    }))
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let name = field.as_str();
    Error::invalid_request(format!("missing required field: {name}")).with_details(json!({
        "field": name,
        "code": ErrorCode::MissingField.as_str(),
    }))
}

pub(crate) fn require<T>(value: Option<T>, field: FieldName) -> Result<T, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

pub(crate) fn parse_amount(value: &str, field: FieldName) -> Result<Amount, Error> {
    value.parse::<Amount>().map_err(|err| {
        rejected(
            field,
            ErrorCode::InvalidAmount,
            err.to_string(),
            value,
        )
    })
}

pub(crate) fn parse_direction(value: &str, field: FieldName) -> Result<Direction, Error> {
    value.parse::<Direction>().map_err(|_| {
        rejected(
            field,
            ErrorCode::InvalidDirection,
            format!("{} must be spent or received", field.as_str()),
            value,
        )
    })
}

pub(crate) fn parse_date(value: &str, field: FieldName) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        rejected(
            field,
            ErrorCode::InvalidDate,
            format!("{} must be a YYYY-MM-DD date", field.as_str()),
            value,
        )
    })
}

pub(crate) fn parse_optional_date(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<NaiveDate>, Error> {
    value.map(|raw| parse_date(raw, field)).transpose()
}

pub(crate) fn parse_currency(value: &str, field: FieldName) -> Result<CurrencyCode, Error> {
    CurrencyCode::new(value).map_err(|_| {
        rejected(
            field,
            ErrorCode::InvalidCurrency,
            format!("{} must be a three-letter ISO 4217 code", field.as_str()),
            value,
        )
    })
}

pub(crate) fn parse_uuid(value: &str, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(value).map_err(|_| {
        rejected(
            field,
            ErrorCode::InvalidUuid,
            format!("{} must be a valid UUID", field.as_str()),
            value,
        )
    })
}

fn blank(field: FieldName, value: &str) -> Error {
    rejected(
        field,
        ErrorCode::BlankText,
        format!("{} must not be blank", field.as_str()),
        value,
    )
}

pub(crate) fn parse_display_name(value: &str, field: FieldName) -> Result<DisplayName, Error> {
    DisplayName::new(value).map_err(|_| blank(field, value))
}

pub(crate) fn parse_note(value: &str, field: FieldName) -> Result<Note, Error> {
    Note::new(value).map_err(|_| blank(field, value))
}

pub(crate) fn parse_category_name(value: &str, field: FieldName) -> Result<CategoryName, Error> {
    CategoryName::new(value).map_err(|_| blank(field, value))
}
