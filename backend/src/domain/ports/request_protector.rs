//! Port for the sliding-window request protection collaborator.
use async_trait::async_trait;

use crate::domain::{RateLimitDecision, RateLimitRule, RequestFingerprint};

use super::define_port_error;

define_port_error! {
    /// Failures raised while evaluating a request.
    pub enum ProtectionError {
        /// The protection backend could not be reached.
        Unavailable { message: String } => "request protection unavailable: {message}",
        /// The backend returned an unusable answer.
        Evaluation { message: String } => "request protection failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RequestProtector: Send + Sync {
    /// Classify `request` and count it against `rule`.
    async fn protect(
        &self,
        rule: &RateLimitRule,
        request: &RequestFingerprint,
    ) -> Result<RateLimitDecision, ProtectionError>;
}
