//! User data model.
//!
//! Value objects normalise their input (trimming, lower-casing) before
//! validating it, so a constructed value is always in canonical form.

use std::fmt;
use std::num::NonZeroI64;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use zeroize::Zeroizing;

use super::Role;

/// Minimum length of a user name.
pub const NAME_MIN: usize = 2;
/// Maximum length of a user name or email address.
pub const TEXT_MAX: usize = 255;
/// Minimum length of a new password.
pub const PASSWORD_MIN: usize = 6;
/// Maximum length of a new password.
pub const PASSWORD_MAX: usize = 120;

/// Validation errors returned by the user value objects.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("ID must be a valid number")]
    InvalidId,
    #[error("Name must be at least {min} characters")]
    NameTooShort { min: usize },
    #[error("Name must be at most {max} characters")]
    NameTooLong { max: usize },
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Email must be at most {max} characters")]
    EmailTooLong { max: usize },
    #[error("Password is required")]
    EmptyPassword,
    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    #[error("Password must be at most {max} characters")]
    PasswordTooLong { max: usize },
    #[error("Role must be one of: user, admin")]
    InvalidRole,
}

impl UserValidationError {
    /// Name of the input field the error refers to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::InvalidId => "id",
            Self::NameTooShort { .. } | Self::NameTooLong { .. } => "name",
            Self::InvalidEmail | Self::EmailTooLong { .. } => "email",
            Self::EmptyPassword | Self::PasswordTooShort { .. } | Self::PasswordTooLong { .. } => {
                "password"
            }
            Self::InvalidRole => "role",
        }
    }
}

/// Positive numeric account identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct UserId(NonZeroI64);

impl UserId {
    /// Validate a raw identifier.
    pub fn new(raw: i64) -> Result<Self, UserValidationError> {
        if raw <= 0 {
            return Err(UserValidationError::InvalidId);
        }
        NonZeroI64::new(raw)
            .map(Self)
            .ok_or(UserValidationError::InvalidId)
    }

    /// Parse a path segment consisting only of ASCII digits.
    ///
    /// # Examples
    /// ```
    /// use warden::domain::UserId;
    ///
    /// assert_eq!(UserId::parse("42").map(|id| id.get()), Ok(42));
    /// assert!(UserId::parse("-1").is_err());
    /// assert!(UserId::parse("4a").is_err());
    /// ```
    pub fn parse(segment: &str) -> Result<Self, UserValidationError> {
        if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
            return Err(UserValidationError::InvalidId);
        }
        let raw = segment
            .parse::<i64>()
            .map_err(|_| UserValidationError::InvalidId)?;
        Self::new(raw)
    }

    /// Raw integer value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0.get()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<UserId> for i64 {
    fn from(value: UserId) -> Self {
        value.get()
    }
}

impl TryFrom<i64> for UserId {
    type Error = UserValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Display name of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserName(String);

impl UserName {
    /// Trim and validate a name.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = raw.as_ref().trim();
        let length = trimmed.chars().count();
        if length < NAME_MIN {
            return Err(UserValidationError::NameTooShort { min: NAME_MIN });
        }
        if length > TEXT_MAX {
            return Err(UserValidationError::NameTooLong { max: TEXT_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<UserName> for String {
    fn from(value: UserName) -> Self {
        value.0
    }
}

impl TryFrom<String> for UserName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        let pattern = r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$";
        Regex::new(pattern).unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Lower-cased email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Normalise and validate an address.
    ///
    /// # Examples
    /// ```
    /// use warden::domain::EmailAddress;
    ///
    /// let email = EmailAddress::new("  Ann@X.com ").expect("valid email");
    /// assert_eq!(email.as_ref(), "ann@x.com");
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalised = raw.as_ref().trim().to_lowercase();
        if normalised.chars().count() > TEXT_MAX {
            return Err(UserValidationError::EmailTooLong { max: TEXT_MAX });
        }
        if !email_regex().is_match(&normalised) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(normalised))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Plain-text password held only for the duration of a request.
///
/// The buffer is wiped on drop and never printed.
#[derive(Clone)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Validate a password chosen for a new or updated account.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = raw.as_ref().trim();
        let length = trimmed.chars().count();
        if length < PASSWORD_MIN {
            return Err(UserValidationError::PasswordTooShort { min: PASSWORD_MIN });
        }
        if length > PASSWORD_MAX {
            return Err(UserValidationError::PasswordTooLong { max: PASSWORD_MAX });
        }
        Ok(Self(Zeroizing::new(trimmed.to_owned())))
    }

    /// Accept any non-empty password presented at sign-in.
    pub fn presented(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyPassword);
        }
        Ok(Self(Zeroizing::new(trimmed.to_owned())))
    }

    /// Expose the secret bytes to a hashing adapter.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Encoded one-way password digest.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Wrap an encoded digest produced by a hashing adapter.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }
}

impl AsRef<str> for PasswordDigest {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordDigest(<redacted>)")
    }
}

/// Public view of an account.
///
/// ## Invariants
/// - `role` is never [`Role::Guest`].
/// - No password material is reachable from this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[schema(value_type = i64, example = 1)]
    id: UserId,
    #[schema(value_type = String, example = "Ann")]
    name: UserName,
    #[schema(value_type = String, example = "ann@x.com")]
    email: EmailAddress,
    role: Role,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Assemble a user from validated parts.
    pub fn new(
        id: UserId,
        name: UserName,
        email: EmailAddress,
        role: Role,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            email,
            role,
            created_at,
            updated_at,
        }
    }

    /// Account identifier.
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &UserName {
        &self.name
    }

    /// Login email.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Granted role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Creation instant.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last modification instant.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Account together with its password digest, as kept by the store.
#[derive(Debug, Clone)]
pub struct StoredUser {
    pub user: User,
    pub password_digest: PasswordDigest,
}

/// Fields of an account about to be inserted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: UserName,
    pub email: EmailAddress,
    pub role: Role,
    pub password_digest: PasswordDigest,
}

/// Partial update applied to an existing account.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<UserName>,
    pub email: Option<EmailAddress>,
    pub role: Option<Role>,
    pub password_digest: Option<PasswordDigest>,
}

impl UserChanges {
    /// Whether no field would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.role.is_none()
            && self.password_digest.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0")]
    #[case("")]
    #[case("12a")]
    #[case("+5")]
    #[case("99999999999999999999")]
    fn user_id_rejects_non_positive_or_non_numeric(#[case] raw: &str) {
        assert_eq!(UserId::parse(raw), Err(UserValidationError::InvalidId));
    }

    #[rstest]
    fn user_name_is_trimmed() {
        let name = UserName::new("  Ann  ").expect("valid name");
        assert_eq!(name.as_ref(), "Ann");
    }

    #[rstest]
    #[case("A", UserValidationError::NameTooShort { min: NAME_MIN })]
    #[case("   A   ", UserValidationError::NameTooShort { min: NAME_MIN })]
    fn user_name_enforces_minimum(#[case] raw: &str, #[case] expected: UserValidationError) {
        assert_eq!(UserName::new(raw), Err(expected));
    }

    #[rstest]
    fn user_name_enforces_maximum() {
        let raw = "a".repeat(TEXT_MAX + 1);
        assert_eq!(
            UserName::new(raw),
            Err(UserValidationError::NameTooLong { max: TEXT_MAX })
        );
    }

    #[rstest]
    #[case("ann")]
    #[case("ann@")]
    #[case("@x.com")]
    #[case("ann@x")]
    #[case("ann smith@x.com")]
    fn email_rejects_malformed_addresses(#[case] raw: &str) {
        assert_eq!(EmailAddress::new(raw), Err(UserValidationError::InvalidEmail));
    }

    #[rstest]
    fn email_is_lower_cased() {
        let email = EmailAddress::new("ANN@X.COM").expect("valid email");
        assert_eq!(email.as_ref(), "ann@x.com");
    }

    #[rstest]
    #[case("12345", Err(UserValidationError::PasswordTooShort { min: PASSWORD_MIN }))]
    #[case("secret1", Ok(()))]
    fn password_length_is_enforced(
        #[case] raw: &str,
        #[case] expected: Result<(), UserValidationError>,
    ) {
        assert_eq!(Password::new(raw).map(|_| ()), expected);
    }

    #[rstest]
    fn presented_password_only_requires_content() {
        assert!(Password::presented("x").is_ok());
        assert_eq!(
            Password::presented("  ").map(|_| ()),
            Err(UserValidationError::EmptyPassword)
        );
    }

    #[rstest]
    fn secrets_are_redacted_in_debug_output() {
        let password = Password::new("secret1").expect("valid password");
        let digest = PasswordDigest::new("$argon2id$v=19$...");
        assert!(!format!("{password:?}").contains("secret1"));
        assert!(!format!("{digest:?}").contains("argon2id"));
    }

    #[rstest]
    fn validation_errors_name_their_field() {
        assert_eq!(UserValidationError::InvalidEmail.field(), "email");
        assert_eq!(
            UserValidationError::PasswordTooLong { max: PASSWORD_MAX }.field(),
            "password"
        );
    }
}
