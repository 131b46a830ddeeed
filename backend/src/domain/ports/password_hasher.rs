//! Port for one-way password hashing.
use async_trait::async_trait;

use crate::domain::{Password, PasswordDigest};

use super::define_port_error;

define_port_error! {
    /// Failures raised by password hashing adapters.
    pub enum PasswordHashError {
        /// Hashing or verification could not be carried out.
        Backend { message: String } => "password hashing failed: {message}",
        /// A stored digest could not be parsed.
        InvalidDigest { message: String } => "stored password digest invalid: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    /// Produce a salted digest of `password`.
    async fn hash(&self, password: &Password) -> Result<PasswordDigest, PasswordHashError>;

    /// Check `password` against `digest`.
    async fn verify(
        &self,
        password: &Password,
        digest: &PasswordDigest,
    ) -> Result<bool, PasswordHashError>;
}
