//! Argon2id adapter for the `PasswordHasher` port.
//!
//! Hashing is CPU bound, so both operations run on the blocking pool.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    Error as HashError, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use argon2::Argon2;
use async_trait::async_trait;
use tokio::task;

use crate::domain::ports::{PasswordHashError, PasswordHasher};
use crate::domain::{Password, PasswordDigest};

/// Argon2id with the crate's default parameters and a random salt per hash.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2PasswordHasher;

fn join_error(err: task::JoinError) -> PasswordHashError {
    PasswordHashError::backend(format!("hashing task failed: {err}"))
}

#[async_trait]
impl PasswordHasher for Argon2PasswordHasher {
    async fn hash(&self, password: &Password) -> Result<PasswordDigest, PasswordHashError> {
        let password = password.clone();
        task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(password.expose().as_bytes(), &salt)
                .map(|hash| PasswordDigest::new(hash.to_string()))
                .map_err(|err| PasswordHashError::backend(err.to_string()))
        })
        .await
        .map_err(join_error)?
    }

    async fn verify(
        &self,
        password: &Password,
        digest: &PasswordDigest,
    ) -> Result<bool, PasswordHashError> {
        let password = password.clone();
        let encoded = digest.as_ref().to_owned();
        task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&encoded)
                .map_err(|err| PasswordHashError::invalid_digest(err.to_string()))?;
            match Argon2::default().verify_password(password.expose().as_bytes(), &parsed) {
                Ok(()) => Ok(true),
                Err(HashError::Password) => Ok(false),
                Err(err) => Err(PasswordHashError::backend(err.to_string())),
            }
        })
        .await
        .map_err(join_error)?
    }
}
