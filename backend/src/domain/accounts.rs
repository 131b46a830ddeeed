//! Sign-up and sign-in use-cases.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use super::ports::{AccountService, PasswordHashError, PasswordHasher, UserPersistenceError, UserRepository};
use super::{EmailAddress, Error, NewUser, Password, Role, User, UserName};

/// Message for a sign-up or update that reuses a taken email.
pub const EMAIL_ALREADY_EXISTS: &str = "Email already in use";
/// Message for any failed sign-in, regardless of cause.
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Validated input for creating an account.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: UserName,
    pub email: EmailAddress,
    pub password: Password,
    pub role: Role,
}

/// Validated sign-in input.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: EmailAddress,
    pub password: Password,
}

/// Validated partial update of an account.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub name: Option<UserName>,
    pub email: Option<EmailAddress>,
    pub password: Option<Password>,
    pub role: Option<Role>,
}

impl AccountUpdate {
    /// Whether no field was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password.is_none() && self.role.is_none()
    }
}

pub(crate) fn persistence_error(operation: &'static str, err: UserPersistenceError) -> Error {
    match err {
        UserPersistenceError::Duplicate { .. } => Error::duplicate(EMAIL_ALREADY_EXISTS),
        UserPersistenceError::Connection { message } => {
            error!(operation, %message, "user store unavailable");
            Error::database(format!("Failed to {operation}"))
        }
        UserPersistenceError::Query { message } => {
            error!(operation, %message, "user store query failed");
            Error::database(format!("Failed to {operation}")).non_operational()
        }
    }
}

pub(crate) fn hashing_error(err: PasswordHashError) -> Error {
    error!(error = %err, "password hashing failed");
    Error::internal("password hashing failed")
}

/// Hash the password and insert the account, rejecting taken emails.
pub(crate) async fn register(
    users: &dyn UserRepository,
    hasher: &dyn PasswordHasher,
    registration: Registration,
) -> Result<User, Error> {
    let Registration {
        name,
        email,
        password,
        role,
    } = registration;

    let existing = users
        .find_by_email(&email)
        .await
        .map_err(|err| persistence_error("create user", err))?;
    if existing.is_some() {
        warn!(email = %email, "registration rejected: email already in use");
        return Err(Error::duplicate(EMAIL_ALREADY_EXISTS));
    }

    let password_digest = hasher.hash(&password).await.map_err(hashing_error)?;
    let user = users
        .insert(&NewUser {
            name,
            email,
            role,
            password_digest,
        })
        .await
        .map_err(|err| persistence_error("create user", err))?;
    info!(user_id = %user.id(), role = %user.role(), "account created");
    Ok(user)
}

/// Account service backed by a user repository and a password hasher.
#[derive(Clone)]
pub struct PasswordAccountService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
}

impl PasswordAccountService {
    /// Wire the service to its driven ports.
    pub fn new(users: Arc<dyn UserRepository>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { users, hasher }
    }
}

#[async_trait]
impl AccountService for PasswordAccountService {
    async fn sign_up(&self, registration: Registration) -> Result<User, Error> {
        register(self.users.as_ref(), self.hasher.as_ref(), registration).await
    }

    async fn sign_in(&self, credentials: Credentials) -> Result<User, Error> {
        let Credentials { email, password } = credentials;
        let Some(stored) = self
            .users
            .find_by_email(&email)
            .await
            .map_err(|err| persistence_error("sign in", err))?
        else {
            warn!(email = %email, "sign-in rejected: unknown email");
            return Err(Error::authentication(INVALID_CREDENTIALS));
        };

        let matches = self
            .hasher
            .verify(&password, &stored.password_digest)
            .await
            .map_err(hashing_error)?;
        if !matches {
            warn!(user_id = %stored.user.id(), "sign-in rejected: wrong password");
            return Err(Error::authentication(INVALID_CREDENTIALS));
        }

        info!(user_id = %stored.user.id(), "user signed in");
        Ok(stored.user)
    }
}
