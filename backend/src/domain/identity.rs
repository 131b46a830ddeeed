//! Verified caller identity.

use serde::Serialize;
use utoipa::ToSchema;

use super::{EmailAddress, Role, User, UserId};

/// Identity of the caller, recovered from a verified credential.
///
/// Built once per request by the identity middleware and read-only after
/// that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Identity {
    #[schema(value_type = i64, example = 1)]
    id: UserId,
    #[schema(value_type = String, example = "ann@x.com")]
    email: EmailAddress,
    role: Role,
}

impl Identity {
    /// Assemble an identity.
    pub fn new(id: UserId, email: EmailAddress, role: Role) -> Self {
        Self { id, email, role }
    }

    /// Subject identifier.
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Subject email.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Granted role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Whether the caller holds the admin role.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self::new(user.id(), user.email().clone(), user.role())
    }
}
