//! Adaptive per-role rate limiting.
//!
//! Each request is counted against a rule derived from the caller's role and
//! the deployment regime. In the permissive regime denials are logged and the
//! request proceeds; in the strict regime they block the request.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, warn};

use super::ports::RequestProtector;
use super::{DeploymentRegime, Error, Role};

/// Length of the sliding window every rule counts over.
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);
/// User agent assumed for requests that do not send one.
pub const DEFAULT_USER_AGENT: &str = "Internal-Request/1.0";
/// Message returned for bot and shield denials.
pub const ACCESS_FORBIDDEN: &str = "Access forbidden";
/// Message returned when the protector itself fails in the strict regime.
pub const PROTECTION_FAILURE: &str = "Internal server error";

/// Request budget of one role in each regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleLimits {
    pub permissive: u32,
    pub strict: u32,
}

impl RoleLimits {
    /// Budget applicable under `regime`.
    #[must_use]
    pub const fn for_regime(self, regime: DeploymentRegime) -> u32 {
        match regime {
            DeploymentRegime::Permissive => self.permissive,
            DeploymentRegime::Strict => self.strict,
        }
    }
}

/// Static (role, regime) → requests-per-window table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitTable {
    admin: RoleLimits,
    user: RoleLimits,
    guest: RoleLimits,
}

impl Default for RateLimitTable {
    fn default() -> Self {
        Self::new(
            RoleLimits {
                permissive: 100,
                strict: 20,
            },
            RoleLimits {
                permissive: 50,
                strict: 10,
            },
            RoleLimits {
                permissive: 30,
                strict: 8,
            },
        )
    }
}

impl RateLimitTable {
    /// Build a table from explicit per-role budgets.
    #[must_use]
    pub const fn new(admin: RoleLimits, user: RoleLimits, guest: RoleLimits) -> Self {
        Self { admin, user, guest }
    }

    /// Requests per window allowed for `role` under `regime`.
    ///
    /// # Examples
    /// ```
    /// use warden::domain::{DeploymentRegime, RateLimitTable, Role};
    ///
    /// let table = RateLimitTable::default();
    /// assert_eq!(table.limit(Role::User, DeploymentRegime::Strict), 10);
    /// assert_eq!(table.limit(Role::Guest, DeploymentRegime::Permissive), 30);
    /// ```
    #[must_use]
    pub const fn limit(&self, role: Role, regime: DeploymentRegime) -> u32 {
        let limits = match role {
            Role::Admin => self.admin,
            Role::User => self.user,
            Role::Guest => self.guest,
        };
        limits.for_regime(regime)
    }
}

/// Whether a rule only observes or also enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleMode {
    DryRun,
    Live,
}

impl From<DeploymentRegime> for RuleMode {
    fn from(regime: DeploymentRegime) -> Self {
        match regime {
            DeploymentRegime::Permissive => Self::DryRun,
            DeploymentRegime::Strict => Self::Live,
        }
    }
}

/// Sliding-window rule handed to the protector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitRule {
    key: String,
    window: Duration,
    max: u32,
    mode: RuleMode,
}

impl RateLimitRule {
    /// Rule for `role` under `regime`, keyed `"{role}-rate-limit"`.
    #[must_use]
    pub fn for_role(role: Role, regime: DeploymentRegime, table: &RateLimitTable) -> Self {
        Self {
            key: format!("{role}-rate-limit"),
            window: RATE_LIMIT_WINDOW,
            max: table.limit(role, regime),
            mode: regime.into(),
        }
    }

    /// Counter key shared by every caller of the same role.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Window the counter slides over.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Maximum admissions per window.
    pub fn max(&self) -> u32 {
        self.max
    }

    /// Observe-only or enforcing.
    pub fn mode(&self) -> RuleMode {
        self.mode
    }
}

/// Classification of a denied request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    Bot,
    Shield,
    RateLimit,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bot => "bot",
            Self::Shield => "shield",
            Self::RateLimit => "rate-limit",
        })
    }
}

/// Verdict of the protector for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    allowed: bool,
    reason: Option<DenialReason>,
}

impl RateLimitDecision {
    /// The request may proceed.
    #[must_use]
    pub const fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    /// The request was denied for `reason`.
    #[must_use]
    pub const fn deny(reason: DenialReason) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }

    /// The request was denied without a classification.
    #[must_use]
    pub const fn deny_unclassified() -> Self {
        Self {
            allowed: false,
            reason: None,
        }
    }

    /// Whether the protector admitted the request.
    pub const fn is_allowed(&self) -> bool {
        self.allowed
    }

    /// Why the request was denied, if it was and the reason is known.
    pub const fn reason(&self) -> Option<DenialReason> {
        self.reason
    }
}

/// Request attributes the protector classifies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFingerprint {
    client_ip: String,
    user_agent: String,
    method: String,
    path: String,
}

impl RequestFingerprint {
    /// Capture a request, substituting [`DEFAULT_USER_AGENT`] when the
    /// caller sent none.
    pub fn new(
        client_ip: impl Into<String>,
        user_agent: Option<&str>,
        method: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        let user_agent = user_agent
            .map(str::trim)
            .filter(|ua| !ua.is_empty())
            .unwrap_or(DEFAULT_USER_AGENT);
        Self {
            client_ip: client_ip.into(),
            user_agent: user_agent.to_owned(),
            method: method.into(),
            path: path.into(),
        }
    }

    /// Caller address.
    pub fn client_ip(&self) -> &str {
        &self.client_ip
    }

    /// User agent, never empty.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// HTTP method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Path including the query string.
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Reason a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Bot,
    Shield,
    RateLimited(Role),
    ProtectionFailure,
}

impl Rejection {
    /// Client-facing error for the rejection.
    pub fn to_error(self) -> Error {
        match self {
            Self::Bot | Self::Shield => Error::authorization(ACCESS_FORBIDDEN),
            Self::RateLimited(role) => Error::rate_limited(format!(
                "{} rate limit exceeded. Try again later.",
                role.label()
            )),
            Self::ProtectionFailure => Error::internal(PROTECTION_FAILURE),
        }
    }
}

/// Outcome of [`AdaptiveRateLimiter::admit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Proceed,
    Reject(Rejection),
}

/// Role-aware limiter with regime-sensitive enforcement.
#[derive(Clone)]
pub struct AdaptiveRateLimiter {
    protector: Arc<dyn RequestProtector>,
    regime: DeploymentRegime,
    table: RateLimitTable,
}

impl AdaptiveRateLimiter {
    /// Create a limiter using the default calibration table.
    pub fn new(protector: Arc<dyn RequestProtector>, regime: DeploymentRegime) -> Self {
        Self::with_table(protector, regime, RateLimitTable::default())
    }

    /// Create a limiter with an explicit table.
    pub fn with_table(
        protector: Arc<dyn RequestProtector>,
        regime: DeploymentRegime,
        table: RateLimitTable,
    ) -> Self {
        Self {
            protector,
            regime,
            table,
        }
    }

    /// Regime the limiter enforces.
    pub fn regime(&self) -> DeploymentRegime {
        self.regime
    }

    /// Decide whether a request from `role` may proceed.
    pub async fn admit(&self, role: Role, request: &RequestFingerprint) -> Admission {
        let rule = RateLimitRule::for_role(role, self.regime, &self.table);
        let decision = match self.protector.protect(&rule, request).await {
            Ok(decision) => decision,
            Err(err) => return self.on_protector_failure(&err, request),
        };
        if decision.is_allowed() {
            return Admission::Proceed;
        }

        let Some(reason) = decision.reason() else {
            warn!(
                rule = rule.key(),
                ip = request.client_ip(),
                path = request.path(),
                "request denied without classification; allowing"
            );
            return Admission::Proceed;
        };

        if !self.regime.is_enforcing() {
            warn!(
                %reason,
                rule = rule.key(),
                limit = rule.max(),
                ip = request.client_ip(),
                user_agent = request.user_agent(),
                path = request.path(),
                "would block request (dry run)"
            );
            return Admission::Proceed;
        }

        warn!(
            %reason,
            rule = rule.key(),
            limit = rule.max(),
            ip = request.client_ip(),
            user_agent = request.user_agent(),
            path = request.path(),
            "request blocked"
        );
        Admission::Reject(match reason {
            DenialReason::Bot => Rejection::Bot,
            DenialReason::Shield => Rejection::Shield,
            DenialReason::RateLimit => Rejection::RateLimited(role),
        })
    }

    fn on_protector_failure(
        &self,
        err: &super::ports::ProtectionError,
        request: &RequestFingerprint,
    ) -> Admission {
        error!(
            error = %err,
            regime = %self.regime,
            ip = request.client_ip(),
            path = request.path(),
            "request protection failed"
        );
        if self.regime.is_enforcing() {
            Admission::Reject(Rejection::ProtectionFailure)
        } else {
            Admission::Proceed
        }
    }
}
