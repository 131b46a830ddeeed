//! Environment-driven application settings.
//!
//! Parsing goes through [`mockable::Env`] so every rule here can be tested
//! without touching the process environment.

use std::fmt;

use chrono::TimeDelta;
use mockable::Env;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::warn;
use zeroize::Zeroizing;

use crate::domain::DeploymentRegime;

const APP_ENV: &str = "APP_ENV";
const JWT_SECRET_ENV: &str = "JWT_SECRET";
const JWT_EXPIRES_IN_ENV: &str = "JWT_EXPIRES_IN";
const COOKIE_SECURE_ENV: &str = "COOKIE_SECURE";
const RATE_LIMIT_SERVICE_KEY_ENV: &str = "RATE_LIMIT_SERVICE_KEY";
const DATABASE_URL_ENV: &str = "DATABASE_URL";
const BOOL_EXPECTED: &str = "1|0|true|false|yes|no";
const SECONDS_EXPECTED: &str = "a positive number of seconds";

/// Shortest signing secret accepted in the strict regime.
pub const JWT_SECRET_MIN_LEN: usize = 32;
/// Credential lifetime when `JWT_EXPIRES_IN` is unset.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 86_400;

/// Errors raised while reading configuration.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is missing.
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    /// A variable is present but malformed.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    /// The signing secret is too short for the strict regime.
    #[error("JWT_SECRET too short: need >= {min_len} bytes, got {length}")]
    SecretTooShort { length: usize, min_len: usize },
}

/// Validated application settings.
pub struct AppConfig {
    pub regime: DeploymentRegime,
    pub jwt_secret: Zeroizing<Vec<u8>>,
    pub token_ttl: TimeDelta,
    pub cookie_secure: bool,
    pub protection_key: Option<Zeroizing<String>>,
    pub database_url: Option<String>,
}

impl AppConfig {
    /// Truncated SHA-256 of the signing secret, safe to log.
    pub fn secret_fingerprint(&self) -> String {
        secret_fingerprint(&self.jwt_secret)
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("regime", &self.regime)
            .field("jwt_secret", &self.secret_fingerprint())
            .field("token_ttl", &self.token_ttl)
            .field("cookie_secure", &self.cookie_secure)
            .field("protection_key", &self.protection_key.as_ref().map(|_| "<set>"))
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .finish()
    }
}

/// Fingerprint identifying a secret in logs without revealing it.
///
/// # Examples
/// ```
/// use warden::config::secret_fingerprint;
///
/// let fp = secret_fingerprint(b"0123456789abcdef0123456789abcdef");
/// assert_eq!(fp.len(), 16);
/// assert_ne!(fp, secret_fingerprint(b"another secret"));
/// ```
pub fn secret_fingerprint(secret: &[u8]) -> String {
    let digest = Sha256::digest(secret);
    hex::encode(&digest[..8])
}

/// Build settings from `env`.
///
/// # Errors
/// Returns [`ConfigError`] for malformed values and, in the strict regime,
/// for a missing or short signing secret.
pub fn app_config_from_env<E: Env>(env: &E) -> Result<AppConfig, ConfigError> {
    let regime = regime_from_env(env);
    let jwt_secret = secret_from_env(env, regime)?;
    let token_ttl = token_ttl_from_env(env)?;
    let cookie_secure = cookie_secure_from_env(env, regime)?;
    let protection_key = non_empty(env, RATE_LIMIT_SERVICE_KEY_ENV).map(Zeroizing::new);
    let database_url = non_empty(env, DATABASE_URL_ENV);

    Ok(AppConfig {
        regime,
        jwt_secret,
        token_ttl,
        cookie_secure,
        protection_key,
        database_url,
    })
}

fn non_empty<E: Env>(env: &E, name: &str) -> Option<String> {
    env.string(name).filter(|value| !value.trim().is_empty())
}

fn regime_from_env<E: Env>(env: &E) -> DeploymentRegime {
    match env.string(APP_ENV) {
        Some(label) => DeploymentRegime::from_label(&label).unwrap_or_else(|| {
            warn!(value = %label, "unrecognised APP_ENV; enforcing strict regime");
            DeploymentRegime::Strict
        }),
        None => {
            warn!("APP_ENV not set; enforcing strict regime");
            DeploymentRegime::Strict
        }
    }
}

fn secret_from_env<E: Env>(
    env: &E,
    regime: DeploymentRegime,
) -> Result<Zeroizing<Vec<u8>>, ConfigError> {
    match env.string(JWT_SECRET_ENV).filter(|value| !value.is_empty()) {
        Some(value) => {
            let secret = Zeroizing::new(value.into_bytes());
            let length = secret.len();
            if length < JWT_SECRET_MIN_LEN {
                if regime.is_enforcing() {
                    return Err(ConfigError::SecretTooShort {
                        length,
                        min_len: JWT_SECRET_MIN_LEN,
                    });
                }
                warn!(length, min_len = JWT_SECRET_MIN_LEN, "JWT_SECRET is short");
            }
            Ok(secret)
        }
        None if regime.is_enforcing() => Err(ConfigError::MissingEnv {
            name: JWT_SECRET_ENV,
        }),
        None => {
            let mut bytes = Zeroizing::new(vec![0_u8; JWT_SECRET_MIN_LEN * 2]);
            rand::thread_rng().fill_bytes(&mut bytes);
            warn!(
                fingerprint = %secret_fingerprint(&bytes),
                "JWT_SECRET not set; using an ephemeral secret (tokens will not survive restarts)"
            );
            Ok(bytes)
        }
    }
}

fn token_ttl_from_env<E: Env>(env: &E) -> Result<TimeDelta, ConfigError> {
    let Some(value) = env.string(JWT_EXPIRES_IN_ENV) else {
        return Ok(TimeDelta::seconds(DEFAULT_TOKEN_TTL_SECS));
    };
    value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|secs| *secs > 0)
        .and_then(TimeDelta::try_seconds)
        .ok_or(ConfigError::InvalidEnv {
            name: JWT_EXPIRES_IN_ENV,
            value,
            expected: SECONDS_EXPECTED,
        })
}

fn cookie_secure_from_env<E: Env>(env: &E, regime: DeploymentRegime) -> Result<bool, ConfigError> {
    match env.string(COOKIE_SECURE_ENV) {
        Some(value) => parse_bool(&value).ok_or(ConfigError::InvalidEnv {
            name: COOKIE_SECURE_ENV,
            value,
            expected: BOOL_EXPECTED,
        }),
        None => Ok(regime.is_enforcing()),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
