//! Role policy gate applied to individual routes.
//!
//! Must run inside [`RequireIdentity`](super::RequireIdentity); without an
//! attached identity every request fails with `401`.

use std::rc::Rc;
use std::task::{Context, Poll};

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, HttpMessage, HttpResponse};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::warn;

use crate::domain::{Identity, Role, RolePolicy};

/// Middleware admitting only callers whose role is in the policy.
///
/// # Examples
/// ```
/// use actix_web::web;
/// use warden::domain::Role;
/// use warden::middleware::RequireRoles;
///
/// let admin_only = web::resource("/api/users/{id}").wrap(RequireRoles::admin_only());
/// let members = RequireRoles::new([Role::User, Role::Admin]);
/// ```
#[derive(Clone, Debug)]
pub struct RequireRoles {
    policy: Rc<RolePolicy>,
}

impl RequireRoles {
    /// Gate admitting any of `roles`.
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            policy: Rc::new(RolePolicy::new(roles)),
        }
    }

    /// Gate admitting administrators only.
    pub fn admin_only() -> Self {
        Self {
            policy: Rc::new(RolePolicy::admin_only()),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRoles
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireRolesMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRolesMiddleware {
            service,
            policy: Rc::clone(&self.policy),
        }))
    }
}

/// Service wrapper produced by [`RequireRoles`].
pub struct RequireRolesMiddleware<S> {
    service: S,
    policy: Rc<RolePolicy>,
}

impl<S, B> Service<ServiceRequest> for RequireRolesMiddleware<S>
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
        let verdict = {
            let extensions = req.extensions();
            let identity = extensions.get::<Identity>();
            self.policy.authorize(identity).inspect_err(|_| {
                warn!(
                    role = identity.map_or("none", |id| id.role().as_str()),
                    allowed = ?self.policy.allowed(),
                    path = req.path(),
                    "role policy denied request"
                );
            })
        };
        match verdict {
            Ok(()) => {
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Err(error) => {
                let response = req.into_response(HttpResponse::from_error(error));
                Box::pin(async move { Ok(response.map_into_right_body()) })
            }
        }
    }
}
