//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{
    EmailAddress, NewUser, StoredUser, User, UserChanges, UserId, UserListQuery, UserPage,
};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// A uniqueness constraint rejected the write.
        Duplicate { field: String } => "user with this {field} already exists",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account and return it with its assigned identifier.
    async fn insert(&self, user: &NewUser) -> Result<User, UserPersistenceError>;

    /// Fetch an account by identifier.
    async fn find_by_id(&self, id: UserId) -> Result<Option<StoredUser>, UserPersistenceError>;

    /// Fetch an account by its (normalised) email.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<StoredUser>, UserPersistenceError>;

    /// List matching accounts, newest first.
    async fn list(&self, query: &UserListQuery) -> Result<UserPage, UserPersistenceError>;

    /// Apply `changes`; `None` when the account does not exist.
    async fn update(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Remove an account; `false` when it did not exist.
    async fn delete(&self, id: UserId) -> Result<bool, UserPersistenceError>;
}
