//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **credentials**: HS256 JSON Web Tokens (`CredentialCodec`)
//! - **password**: Argon2id hashing (`PasswordHasher`)
//! - **protection**: in-process sliding-window limiter (`RequestProtector`)
//! - **persistence**: PostgreSQL via Diesel (`UserRepository`)
//! - **memory**: process-local `UserRepository` for tests and development
//!
//! Adapters only translate between domain types and infrastructure
//! representations; policy stays in the domain.

pub mod credentials;
pub mod memory;
pub mod password;
pub mod persistence;
pub mod protection;
