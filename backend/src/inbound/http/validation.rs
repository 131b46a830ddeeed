//! Shared validation helpers for inbound HTTP adapters.
//!
//! Request bodies are deserialised leniently (every field optional) and then
//! validated field by field, so a single response reports every problem as
//! `details: { "<field>": ["<message>", ...] }`.

use std::collections::BTreeMap;
use std::fmt::Display;

use actix_web::HttpRequest;
use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use serde_json::json;

use crate::domain::{Error, Role, UserValidationError};

/// Top-level message of every validation failure.
pub const VALIDATION_FAILED: &str = "Validation failed";
/// Message recorded for a missing required field.
pub const REQUIRED: &str = "Required";

/// Accumulator of per-field validation messages.
#[derive(Debug, Default)]
pub(crate) struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    pub(crate) fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    /// Record a missing value and pass present ones through.
    pub(crate) fn require<T>(&mut self, field: &'static str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.push(field, REQUIRED);
        }
        value
    }

    /// Record a failed conversion and pass successful ones through.
    pub(crate) fn check<T, E: Display>(&mut self, field: &'static str, result: Result<T, E>) -> Option<T> {
        result.map_err(|err| self.push(field, err.to_string())).ok()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Convert the collected messages into a validation error.
    pub(crate) fn into_error(self) -> Error {
        self.into_error_with(VALIDATION_FAILED)
    }

    /// Convert the collected messages under a request-specific summary.
    pub(crate) fn into_error_with(self, message: &str) -> Error {
        Error::validation(message).with_details(json!(self.0))
    }

    pub(crate) fn finish(self) -> Result<(), Error> {
        self.finish_with(VALIDATION_FAILED)
    }

    /// Like [`FieldErrors::finish`] with a request-specific summary.
    pub(crate) fn finish_with(self, message: &str) -> Result<(), Error> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self.into_error_with(message))
        }
    }
}

/// Parse an assignable role name (`user` or `admin`).
pub(crate) fn parse_assignable_role(raw: &str) -> Result<Role, UserValidationError> {
    raw.trim()
        .parse::<Role>()
        .ok()
        .filter(|role| role.is_assignable())
        .ok_or(UserValidationError::InvalidRole)
}

fn single_field_error(field: &'static str, message: impl Into<String>) -> Error {
    let mut errors = FieldErrors::default();
    errors.push(field, message);
    errors.into_error()
}

/// `JsonConfig` error handler producing validation errors.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let message = match &err {
        JsonPayloadError::ContentType => "Content type must be application/json".to_owned(),
        JsonPayloadError::Deserialize(inner) => inner.to_string(),
        other => other.to_string(),
    };
    single_field_error("body", message).into()
}

/// `PathConfig` error handler producing validation errors.
pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    single_field_error("path", err.to_string()).into()
}

/// `QueryConfig` error handler producing validation errors.
pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    single_field_error("query", err.to_string()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorCode, UserName};
    use rstest::rstest;

    #[rstest]
    fn collects_messages_per_field() {
        let mut errors = FieldErrors::default();
        let _ = errors.require::<String>("email", None);
        let name = errors.check("name", UserName::new("A"));
        errors.push("name", "second problem");

        assert!(name.is_none());
        let err = errors.finish().expect_err("errors were recorded");
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert_eq!(err.message(), VALIDATION_FAILED);
        assert_eq!(
            err.details(),
            Some(&json!({
                "email": ["Required"],
                "name": ["Name must be at least 2 characters", "second problem"],
            }))
        );
    }

    #[rstest]
    fn empty_accumulator_finishes_cleanly() {
        assert!(FieldErrors::default().finish().is_ok());
    }

    #[rstest]
    #[case("user", Some(Role::User))]
    #[case(" admin ", Some(Role::Admin))]
    #[case("guest", None)]
    #[case("root", None)]
    fn assignable_roles(#[case] raw: &str, #[case] expected: Option<Role>) {
        assert_eq!(parse_assignable_role(raw).ok(), expected);
    }
}
