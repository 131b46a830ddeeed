//! Identity extraction for protected routes.
//!
//! Reads the `token` cookie, verifies it through the configured
//! [`CredentialCodec`](crate::domain::ports::CredentialCodec) and stores the
//! resulting [`Identity`] in the request extensions. Requests without a valid
//! credential are answered with `401` before reaching the handler.

use std::rc::Rc;
use std::task::{Context, Poll};

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, HttpMessage, HttpResponse, web};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{debug, warn};

use crate::domain::{self, Identity};
use crate::inbound::http::cookies::TOKEN_COOKIE;
use crate::inbound::http::state::HttpState;

/// Message for a protected request without a credential cookie.
pub const TOKEN_REQUIRED: &str = "Access token required";
/// Message for a credential that fails verification for any reason.
pub const INVALID_TOKEN: &str = "Invalid or expired token";

/// Middleware requiring a verified credential.
///
/// # Examples
/// ```
/// use actix_web::web;
/// use warden::middleware::RequireIdentity;
///
/// let scope = web::scope("/api/users").wrap(RequireIdentity);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct RequireIdentity;

impl<S, B> Transform<S, ServiceRequest> for RequireIdentity
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireIdentityMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireIdentityMiddleware {
            service: Rc::new(service),
        }))
    }
}

/// Service wrapper produced by [`RequireIdentity`].
pub struct RequireIdentityMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireIdentityMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match authenticate(&req) {
            Ok(identity) => {
                debug!(user_id = %identity.id(), role = %identity.role(), "identity attached");
                req.extensions_mut().insert(identity);
                let service = Rc::clone(&self.service);
                Box::pin(async move { service.call(req).await.map(ServiceResponse::map_into_left_body) })
            }
            Err(error) => {
                let response = req.into_response(HttpResponse::from_error(error));
                Box::pin(async move { Ok(response.map_into_right_body()) })
            }
        }
    }
}

fn authenticate(req: &ServiceRequest) -> Result<Identity, domain::Error> {
    let state = req
        .app_data::<web::Data<HttpState>>()
        .ok_or_else(|| domain::Error::internal("HTTP state missing from application data"))?;
    let cookie = req
        .cookie(TOKEN_COOKIE)
        .filter(|cookie| !cookie.value().is_empty())
        .ok_or_else(|| domain::Error::authentication(TOKEN_REQUIRED))?;
    state.credentials.verify(cookie.value()).map_err(|err| {
        warn!(error = %err, path = req.path(), "credential rejected");
        domain::Error::authentication(INVALID_TOKEN)
    })
}
