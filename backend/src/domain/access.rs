//! Role policy gate and ownership rules.

use super::{Error, Identity, Role, UserId};

/// Message returned when no identity is attached to a guarded request.
pub const AUTHENTICATION_REQUIRED: &str = "Authentication required";
/// Message returned when the caller's role is outside the allowed set.
pub const INSUFFICIENT_PERMISSIONS: &str = "Insufficient permissions";

/// Allowed role set for a guarded operation.
///
/// # Examples
/// ```
/// use warden::domain::{EmailAddress, Identity, Role, RolePolicy, UserId};
///
/// let policy = RolePolicy::admin_only();
/// let admin = Identity::new(
///     UserId::new(1).expect("valid id"),
///     EmailAddress::new("root@x.com").expect("valid email"),
///     Role::Admin,
/// );
/// assert!(policy.authorize(Some(&admin)).is_ok());
/// assert!(policy.authorize(None).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePolicy {
    allowed: Vec<Role>,
}

impl RolePolicy {
    /// Policy admitting any of `allowed`.
    pub fn new(allowed: impl IntoIterator<Item = Role>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }

    /// Policy admitting administrators only.
    pub fn admin_only() -> Self {
        Self::new([Role::Admin])
    }

    /// Roles admitted by the policy.
    pub fn allowed(&self) -> &[Role] {
        &self.allowed
    }

    /// Check the caller against the policy.
    ///
    /// An absent identity fails with an authentication error, a role outside
    /// the set with an authorization error.
    pub fn authorize(&self, identity: Option<&Identity>) -> Result<(), Error> {
        let identity = identity.ok_or_else(|| Error::authentication(AUTHENTICATION_REQUIRED))?;
        if self.allowed.contains(&identity.role()) {
            Ok(())
        } else {
            Err(Error::authorization(INSUFFICIENT_PERMISSIONS))
        }
    }
}

/// Kind of operation a caller attempts on an account record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordAccess {
    View,
    Update,
}

impl RecordAccess {
    const fn denial(self) -> &'static str {
        match self {
            Self::View => "You can only view your own profile",
            Self::Update => "You can only update your own account",
        }
    }
}

/// Admit admins, or the owner of `target`.
pub fn ensure_self_or_admin(
    identity: &Identity,
    target: UserId,
    access: RecordAccess,
) -> Result<(), Error> {
    if identity.is_admin() || identity.id() == target {
        Ok(())
    } else {
        Err(Error::authorization(access.denial()))
    }
}
