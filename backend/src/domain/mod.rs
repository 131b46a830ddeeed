//! Domain primitives, policies and use-cases.
//!
//! Purpose: define strongly typed accounts, identities and roles, the access
//! and rate-limit policies applied to them, and the services driving inbound
//! adapters. Nothing here depends on HTTP.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure taxonomy.
//! - User and its value objects: the persisted account model.
//! - Identity / Role / RolePolicy: who the caller is and what they may do.
//! - AdaptiveRateLimiter: per-role sliding-window admission.
//! - TraceId: request correlation captured by errors.
//! - PasswordAccountService / UserDirectoryService: use-case implementations.

pub mod access;
pub mod accounts;
pub mod directory;
pub mod error;
pub mod identity;
pub mod ports;
pub mod rate_limit;
pub mod regime;
pub mod role;
pub mod trace_id;
pub mod user;
pub mod user_query;

pub use self::access::{RecordAccess, RolePolicy, ensure_self_or_admin};
pub use self::accounts::{AccountUpdate, Credentials, PasswordAccountService, Registration};
pub use self::directory::UserDirectoryService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::identity::Identity;
pub use self::rate_limit::{
    AdaptiveRateLimiter, Admission, DenialReason, RateLimitDecision, RateLimitRule,
    RateLimitTable, Rejection, RequestFingerprint, RoleLimits, RuleMode,
};
pub use self::regime::DeploymentRegime;
pub use self::role::{Role, UnknownRole};
pub use self::trace_id::TraceId;
pub use self::user::{
    EmailAddress, NewUser, Password, PasswordDigest, StoredUser, User, UserChanges, UserId,
    UserName, UserValidationError,
};
pub use self::user_query::{Pagination, UserListQuery, UserListQueryError, UserPage};
