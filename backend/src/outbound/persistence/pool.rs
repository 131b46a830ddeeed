//! bb8 pool of `diesel-async` PostgreSQL connections for the user store.

use std::fmt;
use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection, RunError};

const DEFAULT_MAX_SIZE: u32 = 10;
const DEFAULT_MIN_IDLE: u32 = 2;
const DEFAULT_CHECKOUT_TIMEOUT: Duration = Duration::from_secs(30);

/// Failures opening the pool or checking out a connection.
///
/// Messages name the database by its redacted URL only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// The pool could not be built against `target`.
    #[error("cannot open user store at {target}: {message}")]
    Unreachable { target: String, message: String },
    /// No connection freed up before the checkout timeout.
    #[error("no user store connection within {waited_ms}ms")]
    Exhausted { waited_ms: u128 },
    /// A pooled connection failed while being handed out.
    #[error("user store connection failed: {message}")]
    Broken { message: String },
}

/// Pool sizing for one database.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use warden::outbound::persistence::PoolConfig;
///
/// let config = PoolConfig::new("postgres://warden:hunter2@db/warden")
///     .with_max_size(4)
///     .with_checkout_timeout(Duration::from_secs(5));
/// assert_eq!(config.redacted_url(), "postgres://warden:***@db/warden");
/// ```
#[derive(Clone)]
pub struct PoolConfig {
    database_url: String,
    max_size: u32,
    min_idle: u32,
    checkout_timeout: Duration,
}

impl PoolConfig {
    /// Settings for `database_url` with the default sizing.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_size: DEFAULT_MAX_SIZE,
            min_idle: DEFAULT_MIN_IDLE,
            checkout_timeout: DEFAULT_CHECKOUT_TIMEOUT,
        }
    }

    /// Cap the number of open connections; `min_idle` never exceeds it.
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size.max(1);
        self.min_idle = self.min_idle.min(self.max_size);
        self
    }

    pub fn with_checkout_timeout(mut self, timeout: Duration) -> Self {
        self.checkout_timeout = timeout;
        self
    }

    /// The URL with any password replaced by `***`.
    pub fn redacted_url(&self) -> String {
        redact_password(&self.database_url)
    }
}

impl fmt::Debug for PoolConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolConfig")
            .field("database_url", &self.redacted_url())
            .field("max_size", &self.max_size)
            .field("min_idle", &self.min_idle)
            .field("checkout_timeout", &self.checkout_timeout)
            .finish()
    }
}

fn redact_password(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_owned();
    };
    let authority_end = rest.find('/').unwrap_or(rest.len());
    let (authority, path) = rest.split_at(authority_end);
    match authority.rsplit_once('@') {
        Some((userinfo, host)) => match userinfo.split_once(':') {
            Some((user, _)) => format!("{scheme}://{user}:***@{host}{path}"),
            None => url.to_owned(),
        },
        None => url.to_owned(),
    }
}

/// Shared connection pool handed to the repository.
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
    checkout_timeout: Duration,
}

impl DbPool {
    /// Build the pool, opening the idle connections eagerly.
    ///
    /// # Errors
    ///
    /// [`PoolError::Unreachable`] when the URL is invalid or the database
    /// refuses connections.
    pub async fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.database_url);
        let inner = Pool::builder()
            .max_size(config.max_size)
            .min_idle(Some(config.min_idle))
            .connection_timeout(config.checkout_timeout)
            .build(manager)
            .await
            .map_err(|err| PoolError::Unreachable {
                target: config.redacted_url(),
                message: err.to_string(),
            })?;

        Ok(Self {
            inner,
            checkout_timeout: config.checkout_timeout,
        })
    }

    /// Check out a connection.
    ///
    /// # Errors
    ///
    /// [`PoolError::Exhausted`] on timeout, [`PoolError::Broken`] when the
    /// connection manager fails.
    pub async fn get(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, PoolError> {
        self.inner.get().await.map_err(|err| match err {
            RunError::TimedOut => PoolError::Exhausted {
                waited_ms: self.checkout_timeout.as_millis(),
            },
            RunError::User(inner) => PoolError::Broken {
                message: inner.to_string(),
            },
        })
    }
}
