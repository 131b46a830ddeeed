//! In-memory `UserRepository` for tests and database-less development.
//!
//! Identifiers are assigned sequentially from 1 and never reused. Email
//! uniqueness is enforced the same way the database constraint does.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use mockable::Clock;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{
    EmailAddress, NewUser, StoredUser, User, UserChanges, UserId, UserListQuery, UserPage,
};

#[derive(Default)]
struct Store {
    last_id: i64,
    rows: BTreeMap<i64, StoredUser>,
}

impl Store {
    fn email_taken(&self, email: &EmailAddress, except: Option<UserId>) -> bool {
        self.rows
            .values()
            .any(|row| row.user.email() == email && Some(row.user.id()) != except)
    }
}

/// Process-local user store guarded by a mutex.
pub struct InMemoryUserRepository {
    store: Mutex<Store>,
    clock: Arc<dyn Clock>,
}

impl InMemoryUserRepository {
    /// Create an empty store stamping records with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Mutex::new(Store::default()),
            clock,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Store>, UserPersistenceError> {
        self.store
            .lock()
            .map_err(|_| UserPersistenceError::connection("user store lock poisoned"))
    }
}

fn duplicate_email() -> UserPersistenceError {
    UserPersistenceError::duplicate("email")
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: &NewUser) -> Result<User, UserPersistenceError> {
        let now = self.clock.utc();
        let mut store = self.lock()?;
        if store.email_taken(&user.email, None) {
            return Err(duplicate_email());
        }
        let raw_id = store.last_id + 1;
        let id = UserId::new(raw_id).map_err(|err| UserPersistenceError::query(err.to_string()))?;
        let created = User::new(id, user.name.clone(), user.email.clone(), user.role, now, now);
        store.last_id = raw_id;
        store.rows.insert(
            raw_id,
            StoredUser {
                user: created.clone(),
                password_digest: user.password_digest.clone(),
            },
        );
        Ok(created)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<StoredUser>, UserPersistenceError> {
        Ok(self.lock()?.rows.get(&id.get()).cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<StoredUser>, UserPersistenceError> {
        Ok(self
            .lock()?
            .rows
            .values()
            .find(|row| row.user.email() == email)
            .cloned())
    }

    async fn list(&self, query: &UserListQuery) -> Result<UserPage, UserPersistenceError> {
        let store = self.lock()?;
        let matching: Vec<&User> = store
            .rows
            .values()
            .rev()
            .map(|row| &row.user)
            .filter(|user| query.matches(user))
            .collect();
        let total = matching.len() as u64;
        let skip = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(query.limit()).unwrap_or(usize::MAX);
        let users = matching.into_iter().skip(skip).take(take).cloned().collect();
        Ok(UserPage { users, total })
    }

    async fn update(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<Option<User>, UserPersistenceError> {
        let now = self.clock.utc();
        let mut store = self.lock()?;
        if let Some(email) = &changes.email {
            if store.email_taken(email, Some(id)) {
                return Err(duplicate_email());
            }
        }
        let Some(row) = store.rows.get_mut(&id.get()) else {
            return Ok(None);
        };
        let current = &row.user;
        let updated = User::new(
            current.id(),
            changes.name.clone().unwrap_or_else(|| current.name().clone()),
            changes.email.clone().unwrap_or_else(|| current.email().clone()),
            changes.role.unwrap_or(current.role()),
            current.created_at(),
            now,
        );
        row.user = updated.clone();
        if let Some(digest) = &changes.password_digest {
            row.password_digest = digest.clone();
        }
        Ok(Some(updated))
    }

    async fn delete(&self, id: UserId) -> Result<bool, UserPersistenceError> {
        Ok(self.lock()?.rows.remove(&id.get()).is_some())
    }
}
