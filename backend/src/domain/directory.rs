//! Account management use-cases with ownership rules.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::accounts::{EMAIL_ALREADY_EXISTS, hashing_error, persistence_error, register};
use super::ports::{PasswordHasher, UserDirectory, UserRepository};
use super::{
    AccountUpdate, Error, Identity, RecordAccess, Registration, Role, User, UserChanges, UserId,
    UserListQuery, UserPage, ensure_self_or_admin,
};

/// Message for operations on an id that does not exist.
pub const USER_NOT_FOUND: &str = "User not found";
/// Message for an admin attempting to delete their own account.
pub const CANNOT_DELETE_SELF: &str = "Cannot delete your own account";

/// [`UserDirectory`] backed by a user repository.
#[derive(Clone)]
pub struct UserDirectoryService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
}

impl UserDirectoryService {
    /// Wire the service to its driven ports.
    pub fn new(users: Arc<dyn UserRepository>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { users, hasher }
    }
}

#[async_trait]
impl UserDirectory for UserDirectoryService {
    async fn list(&self, query: UserListQuery) -> Result<UserPage, Error> {
        let page = self
            .users
            .list(&query)
            .await
            .map_err(|err| persistence_error("fetch users", err))?;
        debug!(
            page = query.page(),
            limit = query.limit(),
            total = page.total,
            "listed users"
        );
        Ok(page)
    }

    async fn get(&self, caller: &Identity, id: UserId) -> Result<User, Error> {
        ensure_self_or_admin(caller, id, RecordAccess::View)?;
        self.users
            .find_by_id(id)
            .await
            .map_err(|err| persistence_error("fetch user", err))?
            .map(|stored| stored.user)
            .ok_or_else(|| Error::not_found(USER_NOT_FOUND))
    }

    async fn create(&self, caller: &Identity, mut registration: Registration) -> Result<User, Error> {
        if !caller.is_admin() && registration.role != Role::User {
            warn!(caller = %caller.id(), requested = %registration.role, "role choice ignored for non-admin");
            registration.role = Role::User;
        }
        register(self.users.as_ref(), self.hasher.as_ref(), registration).await
    }

    async fn update(&self, caller: &Identity, id: UserId, update: AccountUpdate) -> Result<User, Error> {
        ensure_self_or_admin(caller, id, RecordAccess::Update)?;

        let existing = self
            .users
            .find_by_id(id)
            .await
            .map_err(|err| persistence_error("update user", err))?
            .ok_or_else(|| Error::not_found(USER_NOT_FOUND))?;

        let AccountUpdate {
            name,
            email,
            password,
            role,
        } = update;

        let role = match role {
            Some(requested) if !caller.is_admin() => {
                warn!(caller = %caller.id(), %requested, "role change ignored for non-admin");
                None
            }
            other => other,
        };

        let email = email.filter(|candidate| candidate != existing.user.email());
        if let Some(candidate) = email.as_ref() {
            let taken = self
                .users
                .find_by_email(candidate)
                .await
                .map_err(|err| persistence_error("update user", err))?;
            if taken.is_some() {
                return Err(Error::duplicate(EMAIL_ALREADY_EXISTS));
            }
        }

        let password_digest = match password {
            Some(password) => Some(self.hasher.hash(&password).await.map_err(hashing_error)?),
            None => None,
        };

        let changes = UserChanges {
            name,
            email,
            role,
            password_digest,
        };
        if changes.is_empty() {
            return Ok(existing.user);
        }

        let updated = self
            .users
            .update(id, &changes)
            .await
            .map_err(|err| persistence_error("update user", err))?
            .ok_or_else(|| Error::not_found(USER_NOT_FOUND))?;
        info!(user_id = %id, caller = %caller.id(), "account updated");
        Ok(updated)
    }

    async fn delete(&self, caller: &Identity, id: UserId) -> Result<(), Error> {
        if caller.id() == id {
            return Err(Error::authorization(CANNOT_DELETE_SELF));
        }
        let removed = self
            .users
            .delete(id)
            .await
            .map_err(|err| persistence_error("delete user", err))?;
        if !removed {
            return Err(Error::not_found(USER_NOT_FOUND));
        }
        info!(user_id = %id, caller = %caller.id(), "account deleted");
        Ok(())
    }
}
