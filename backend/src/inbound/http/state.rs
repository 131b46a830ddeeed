//! Shared HTTP adapter state.
//!
//! HTTP handlers and the identity middleware accept this state via
//! `actix_web::web::Data` so they only depend on domain ports and remain
//! testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{AccountService, CredentialCodec, UserDirectory};

use super::cookies::CookiePolicy;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountService>,
    pub users: Arc<dyn UserDirectory>,
    pub credentials: Arc<dyn CredentialCodec>,
    pub cookies: CookiePolicy,
}

impl HttpState {
    /// Bundle the ports used by HTTP handlers.
    pub fn new(
        accounts: Arc<dyn AccountService>,
        users: Arc<dyn UserDirectory>,
        credentials: Arc<dyn CredentialCodec>,
        cookies: CookiePolicy,
    ) -> Self {
        Self {
            accounts,
            users,
            credentials,
            cookies,
        }
    }
}
