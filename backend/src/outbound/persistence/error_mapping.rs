//! Mapping from pool and Diesel failures to `UserPersistenceError`.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ports::UserPersistenceError;

use super::pool::PoolError;

/// Unique constraint guarding account emails.
const EMAIL_CONSTRAINT: &str = "users_email_key";

pub(super) fn map_pool_error(error: PoolError) -> UserPersistenceError {
    debug!(%error, "user store checkout failed");
    UserPersistenceError::connection(error.to_string())
}

pub(super) fn map_diesel_error(error: DieselError) -> UserPersistenceError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            let field = match info.constraint_name() {
                Some(EMAIL_CONSTRAINT) | None => "email",
                Some(other) => other,
            };
            UserPersistenceError::duplicate(field)
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            UserPersistenceError::connection("database connection error")
        }
        DieselError::NotFound => UserPersistenceError::query("record not found"),
        DieselError::QueryBuilderError(_) => UserPersistenceError::query("database query error"),
        _ => UserPersistenceError::query("database error"),
    }
}
