//! Shared helper utilities for backend integration tests.
//!
//! Integration tests compile as separate crates under `backend/tests/`; this
//! module assembles the full application over in-memory adapters so each
//! suite can drive it through `actix_web::test`.

use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::web;
use chrono::TimeDelta;
use mockable::{Clock, DefaultClock};
use zeroize::Zeroizing;

use warden::domain::ports::{CredentialCodec, PasswordHasher, UserRepository};
use warden::domain::{
    AdaptiveRateLimiter, DeploymentRegime, PasswordAccountService, RateLimitTable,
    UserDirectoryService,
};
use warden::inbound::http::app::AppDependencies;
use warden::inbound::http::cookies::{CookiePolicy, TOKEN_COOKIE};
use warden::inbound::http::health::{HealthState, ProtectionStatus};
use warden::inbound::http::state::HttpState;
use warden::outbound::credentials::JwtCredentialCodec;
use warden::outbound::memory::InMemoryUserRepository;
use warden::outbound::password::Argon2PasswordHasher;
use warden::outbound::protection::SlidingWindowProtector;

const SECRET: &[u8] = b"integration-suite-secret-0123456789abcdef";

/// Application dependencies over an empty in-memory store.
pub fn dependencies(regime: DeploymentRegime, table: RateLimitTable) -> AppDependencies {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let users: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepository::new(Arc::clone(&clock)));
    let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2PasswordHasher);
    let credentials: Arc<dyn CredentialCodec> = Arc::new(JwtCredentialCodec::new(
        &Zeroizing::new(SECRET.to_vec()),
        TimeDelta::hours(1),
        Arc::clone(&clock),
    ));
    let http = HttpState::new(
        Arc::new(PasswordAccountService::new(Arc::clone(&users), Arc::clone(&hasher))),
        Arc::new(UserDirectoryService::new(users, hasher)),
        credentials,
        CookiePolicy::new(regime.is_enforcing(), 3600),
    );
    let health = HealthState::new(regime, ProtectionStatus::Missing);
    health.mark_ready();

    AppDependencies {
        health: web::Data::new(health),
        http: web::Data::new(http),
        limiter: AdaptiveRateLimiter::with_table(
            Arc::new(SlidingWindowProtector::new(clock)),
            regime,
            table,
        ),
    }
}

/// Credential cookie set by `res`, if any.
pub fn token_cookie<B>(res: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == TOKEN_COOKIE)
        .map(Cookie::into_owned)
}
