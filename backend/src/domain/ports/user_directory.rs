//! Driving port for account management use-cases.
use async_trait::async_trait;

use crate::domain::{AccountUpdate, Error, Identity, Registration, User, UserId, UserListQuery, UserPage};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Page through accounts.
    async fn list(&self, query: UserListQuery) -> Result<UserPage, Error>;

    /// Fetch one account; non-admin callers may only read their own.
    async fn get(&self, caller: &Identity, id: UserId) -> Result<User, Error>;

    /// Create an account on behalf of the caller.
    ///
    /// Only admins may choose the role; other callers always create a
    /// `user` account.
    async fn create(&self, caller: &Identity, registration: Registration) -> Result<User, Error>;

    /// Update an account; non-admin callers may only update their own and
    /// cannot change roles.
    async fn update(&self, caller: &Identity, id: UserId, update: AccountUpdate)
    -> Result<User, Error>;

    /// Delete an account; callers cannot delete themselves.
    async fn delete(&self, caller: &Identity, id: UserId) -> Result<(), Error>;
}
