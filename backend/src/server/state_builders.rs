//! Builders wiring adapters into the ports the HTTP layer depends on.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tracing::{info, warn};

use warden::config::AppConfig;
use warden::domain::ports::{CredentialCodec, PasswordHasher, UserRepository};
use warden::domain::{AdaptiveRateLimiter, PasswordAccountService, UserDirectoryService};
use warden::inbound::http::app::AppDependencies;
use warden::inbound::http::cookies::CookiePolicy;
use warden::inbound::http::health::{HealthState, ProtectionStatus};
use warden::inbound::http::state::HttpState;
use warden::outbound::credentials::JwtCredentialCodec;
use warden::outbound::memory::InMemoryUserRepository;
use warden::outbound::password::Argon2PasswordHasher;
use warden::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
use warden::outbound::protection::SlidingWindowProtector;

/// Select the user store: PostgreSQL when `DATABASE_URL` is set, memory otherwise.
pub(crate) async fn build_user_repository(
    config: &AppConfig,
    clock: Arc<dyn Clock>,
) -> std::io::Result<Arc<dyn UserRepository>> {
    match &config.database_url {
        Some(url) => {
            let pool = DbPool::new(PoolConfig::new(url.as_str()))
                .await
                .map_err(|err| std::io::Error::other(format!("database pool: {err}")))?;
            info!("using PostgreSQL user store");
            Ok(Arc::new(DieselUserRepository::new(pool)))
        }
        None => {
            warn!("DATABASE_URL not set; accounts are kept in memory and lost on restart");
            Ok(Arc::new(InMemoryUserRepository::new(clock)))
        }
    }
}

/// Assemble handler state, limiter and health state.
pub(crate) fn build_dependencies(
    config: &AppConfig,
    users: Arc<dyn UserRepository>,
) -> AppDependencies {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2PasswordHasher);
    let credentials: Arc<dyn CredentialCodec> = Arc::new(JwtCredentialCodec::new(
        &config.jwt_secret,
        config.token_ttl,
        Arc::clone(&clock),
    ));
    let cookies = CookiePolicy::new(config.cookie_secure, config.token_ttl.num_seconds());

    let http = HttpState::new(
        Arc::new(PasswordAccountService::new(
            Arc::clone(&users),
            Arc::clone(&hasher),
        )),
        Arc::new(UserDirectoryService::new(users, hasher)),
        credentials,
        cookies,
    );
    let limiter = AdaptiveRateLimiter::new(
        Arc::new(SlidingWindowProtector::new(clock)),
        config.regime,
    );
    let protection = ProtectionStatus::from_key(
        config.protection_key.as_deref().map(String::as_str),
    );

    AppDependencies {
        health: web::Data::new(HealthState::new(config.regime, protection)),
        http: web::Data::new(http),
        limiter,
    }
}
