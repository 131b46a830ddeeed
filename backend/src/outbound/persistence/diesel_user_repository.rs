//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{
    EmailAddress, NewUser, PasswordDigest, Role, StoredUser, User, UserChanges, UserId,
    UserListQuery, UserName, UserPage,
};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewUserRow, UserChangeset, UserRow};
use super::pool::DbPool;
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn corrupt_row(id: i64, what: impl std::fmt::Display) -> UserPersistenceError {
    UserPersistenceError::query(format!("user row {id} is invalid: {what}"))
}

fn row_to_user(row: UserRow) -> Result<StoredUser, UserPersistenceError> {
    let id = UserId::new(row.id).map_err(|err| corrupt_row(row.id, err))?;
    let name = UserName::new(&row.name).map_err(|err| corrupt_row(row.id, err))?;
    let email = EmailAddress::new(&row.email).map_err(|err| corrupt_row(row.id, err))?;
    let role = row
        .role
        .parse::<Role>()
        .ok()
        .filter(|role| role.is_assignable())
        .ok_or_else(|| corrupt_row(row.id, format!("role {}", row.role)))?;
    Ok(StoredUser {
        user: User::new(id, name, email, role, row.created_at, row.updated_at),
        password_digest: PasswordDigest::new(row.password),
    })
}

/// Escape `LIKE` metacharacters so the term matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn filtered(query: &UserListQuery) -> users::BoxedQuery<'static, Pg> {
    let mut boxed = users::table.into_boxed();
    if let Some(role) = query.role() {
        boxed = boxed.filter(users::role.eq(role.as_str()));
    }
    if let Some(term) = query.search() {
        let pattern = like_pattern(term);
        boxed = boxed.filter(
            users::name
                .ilike(pattern.clone())
                .or(users::email.ilike(pattern)),
        );
    }
    boxed
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(&self, user: &NewUser) -> Result<User, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewUserRow {
            name: user.name.as_ref(),
            email: user.email.as_ref(),
            password: user.password_digest.as_ref(),
            role: user.role.as_str(),
        };
        let inserted: UserRow = diesel::insert_into(users::table)
            .values(&row)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        row_to_user(inserted).map(|stored| stored.user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<StoredUser>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        users::table
            .filter(users::id.eq(id.get()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_user)
            .transpose()
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<StoredUser>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_user)
            .transpose()
    }

    async fn list(&self, query: &UserListQuery) -> Result<UserPage, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = filtered(query)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let offset = i64::try_from(query.offset()).unwrap_or(i64::MAX);
        let rows: Vec<UserRow> = filtered(query)
            .order((users::created_at.desc(), users::id.desc()))
            .limit(i64::from(query.limit()))
            .offset(offset)
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let users = rows
            .into_iter()
            .map(|row| row_to_user(row).map(|stored| stored.user))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(UserPage {
            users,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn update(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changeset = UserChangeset {
            name: changes.name.as_ref().map(AsRef::as_ref),
            email: changes.email.as_ref().map(AsRef::as_ref),
            password: changes.password_digest.as_ref().map(AsRef::as_ref),
            role: changes.role.map(Role::as_str),
            updated_at: Utc::now(),
        };
        diesel::update(users::table.filter(users::id.eq(id.get())))
            .set(&changeset)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(|row| row_to_user(row).map(|stored| stored.user))
            .transpose()
    }

    async fn delete(&self, id: UserId) -> Result<bool, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(users::table.filter(users::id.eq(id.get())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;

    fn row(role: &str, email: &str) -> UserRow {
        UserRow {
            id: 7,
            name: "Ann".to_owned(),
            email: email.to_owned(),
            password: "$argon2id$stub".to_owned(),
            role: role.to_owned(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[rstest]
    fn valid_row_converts() {
        let stored = row_to_user(row("admin", "ann@x.com")).expect("valid row");
        assert_eq!(stored.user.id().get(), 7);
        assert_eq!(stored.user.role(), Role::Admin);
        assert_eq!(stored.password_digest.as_ref(), "$argon2id$stub");
    }

    #[rstest]
    #[case("guest", "ann@x.com")]
    #[case("root", "ann@x.com")]
    #[case("user", "not-an-email")]
    fn invalid_rows_are_query_errors(#[case] role: &str, #[case] email: &str) {
        let err = row_to_user(row(role, email)).expect_err("row is invalid");
        assert!(matches!(err, UserPersistenceError::Query { .. }));
    }

    #[rstest]
    #[case("ann", "%ann%")]
    #[case("50%_off", "%50\\%\\_off%")]
    fn like_patterns_escape_wildcards(#[case] term: &str, #[case] expected: &str) {
        assert_eq!(like_pattern(term), expected);
    }
}
