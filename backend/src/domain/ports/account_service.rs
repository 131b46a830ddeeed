//! Driving port for sign-up and sign-in use-cases.
//!
//! Inbound adapters call it to register or authenticate accounts without
//! knowing the persistence or hashing infrastructure, so handler tests can
//! substitute a double.

use async_trait::async_trait;

use crate::domain::{Credentials, Error, Registration, User};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Register a new account.
    ///
    /// Fails with a duplicate-resource error when the email is taken.
    async fn sign_up(&self, registration: Registration) -> Result<User, Error>;

    /// Authenticate credentials and return the matching account.
    ///
    /// Unknown emails and wrong passwords fail identically.
    async fn sign_in(&self, credentials: Credentials) -> Result<User, Error>;
}
