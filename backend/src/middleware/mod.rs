//! Request middleware.
//!
//! Purpose: define the request pipeline. Applications wrap them so that they
//! run in this order: [`Trace`] (outermost), [`RateLimit`],
//! [`RequireIdentity`] on protected scopes, then [`RequireRoles`] on
//! individual routes.

pub mod identity;
pub mod rate_limit;
pub mod roles;
pub mod trace;

pub use identity::RequireIdentity;
pub use rate_limit::RateLimit;
pub use roles::RequireRoles;
pub use trace::Trace;
