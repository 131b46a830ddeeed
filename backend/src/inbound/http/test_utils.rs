//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use chrono::TimeDelta;
use mockable::DefaultClock;
use zeroize::Zeroizing;

use crate::domain::ports::{
    AccountService, CredentialCodec, MockAccountService, MockUserDirectory, UserDirectory,
};
use crate::domain::{EmailAddress, Identity, Role, UserId};
use crate::outbound::credentials::JwtCredentialCodec;

use super::cookies::CookiePolicy;
use super::state::HttpState;

const TEST_SECRET: &[u8] = b"inbound-http-test-secret-0123456789";

/// Codec signing with a fixed secret and a one hour lifetime.
pub fn test_codec() -> Arc<dyn CredentialCodec> {
    Arc::new(JwtCredentialCodec::new(
        &Zeroizing::new(TEST_SECRET.to_vec()),
        TimeDelta::hours(1),
        Arc::new(DefaultClock),
    ))
}

/// Handler state over the given services, with non-secure cookies.
pub fn test_state(
    accounts: Arc<dyn AccountService>,
    users: Arc<dyn UserDirectory>,
    credentials: Arc<dyn CredentialCodec>,
) -> HttpState {
    HttpState::new(accounts, users, credentials, CookiePolicy::new(false, 3600))
}

/// State whose services panic if called; for middleware tests.
pub fn test_state_with_codec(credentials: Arc<dyn CredentialCodec>) -> HttpState {
    test_state(
        Arc::new(MockAccountService::new()),
        Arc::new(MockUserDirectory::new()),
        credentials,
    )
}

fn identity(id: i64, email: &str, role: Role) -> Identity {
    Identity::new(
        UserId::new(id).expect("valid id"),
        EmailAddress::new(email).expect("valid email"),
        role,
    )
}

/// Administrator with id 1.
pub fn admin_identity() -> Identity {
    identity(1, "admin@x.com", Role::Admin)
}

/// Regular member with id 2.
pub fn member_identity() -> Identity {
    identity(2, "ann@x.com", Role::User)
}
