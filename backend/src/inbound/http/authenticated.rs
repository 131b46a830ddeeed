//! Extractor exposing the identity attached by
//! [`RequireIdentity`](crate::middleware::RequireIdentity).

use std::ops::Deref;

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{Ready, ready};

use crate::domain::access::AUTHENTICATION_REQUIRED;
use crate::domain::{Error, Identity};

/// Verified caller of a protected handler.
///
/// Extraction fails with `401` when the route is not wrapped in the
/// identity middleware.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

impl AuthenticatedUser {
    /// Take the inner identity.
    pub fn into_inner(self) -> Identity {
        self.0
    }
}

impl Deref for AuthenticatedUser {
    type Target = Identity;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Identity>()
                .cloned()
                .map(Self)
                .ok_or_else(|| Error::authentication(AUTHENTICATION_REQUIRED)),
        )
    }
}
