//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered accounts.
    users (id) {
        /// Sequential primary key.
        id -> Int8,
        /// Display name, 2 to 255 characters.
        name -> Varchar,
        /// Lower-cased login email; unique.
        email -> Varchar,
        /// Argon2id PHC string.
        password -> Varchar,
        /// `user` or `admin`.
        role -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}
