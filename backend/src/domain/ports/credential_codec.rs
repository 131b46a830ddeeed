//! Port for issuing and verifying signed identity credentials.
//!
//! Implementations are pure apart from reading the clock: the signing
//! secret is process-wide configuration fixed at construction.

use chrono::{DateTime, Utc};

use crate::domain::Identity;

use super::define_port_error;

define_port_error! {
    /// Failures raised by credential codecs.
    pub enum CredentialError {
        /// The token could not be decoded or lacks required claims.
        Malformed { message: String } => "credential malformed: {message}",
        /// The token's expiry has passed.
        Expired => "credential expired",
        /// The signature does not match the payload.
        InvalidSignature => "credential signature invalid",
        /// A credential could not be produced.
        Signing { message: String } => "credential signing failed: {message}",
    }
}

impl CredentialError {
    /// Whether the failure means the presented credential must be rejected.
    ///
    /// Every variant except [`CredentialError::Signing`] describes an
    /// invalid credential.
    pub fn is_invalid_credential(&self) -> bool {
        !matches!(self, Self::Signing { .. })
    }
}

/// Signed credential plus the instant it stops being valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCredential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
pub trait CredentialCodec: Send + Sync {
    /// Sign a credential for `identity`.
    fn issue(&self, identity: &Identity) -> Result<IssuedCredential, CredentialError>;

    /// Verify `token` and recover the identity it encodes.
    ///
    /// Fails closed: no partial identity is returned for a token that fails
    /// any check.
    fn verify(&self, token: &str) -> Result<Identity, CredentialError>;
}
