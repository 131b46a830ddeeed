//! Adaptive rate limiting applied to every request.
//!
//! Runs before identity extraction, so the caller's role is taken from a
//! best-effort peek at the credential cookie. A cookie that fails to verify
//! is not an error here; the caller is simply treated as a guest.

use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::StatusCode;
use actix_web::{Error, HttpMessage, HttpResponse};
use futures_util::future::{LocalBoxFuture, Ready, ready};

use crate::domain::ports::CredentialCodec;
use crate::domain::{AdaptiveRateLimiter, Admission, Identity, Rejection, RequestFingerprint, Role};
use crate::inbound::http::cookies::TOKEN_COOKIE;
use crate::inbound::http::request_meta::{client_ip, path_and_query, user_agent};

/// Middleware counting each request against its role's budget.
#[derive(Clone)]
pub struct RateLimit {
    limiter: AdaptiveRateLimiter,
    credentials: Arc<dyn CredentialCodec>,
}

impl RateLimit {
    /// Wrap `limiter`, peeking at credentials with `credentials`.
    pub fn new(limiter: AdaptiveRateLimiter, credentials: Arc<dyn CredentialCodec>) -> Self {
        Self {
            limiter,
            credentials,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
            credentials: Arc::clone(&self.credentials),
        }))
    }
}

/// Service wrapper produced by [`RateLimit`].
pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    limiter: AdaptiveRateLimiter,
    credentials: Arc<dyn CredentialCodec>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
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
        let service = Rc::clone(&self.service);
        let limiter = self.limiter.clone();
        let role = caller_role(&req, self.credentials.as_ref());
        let fingerprint = RequestFingerprint::new(
            client_ip(req.request()),
            user_agent(req.request()),
            req.method().as_str(),
            path_and_query(req.request()),
        );

        Box::pin(async move {
            match limiter.admit(role, &fingerprint).await {
                Admission::Proceed => service
                    .call(req)
                    .await
                    .map(ServiceResponse::map_into_left_body),
                Admission::Reject(rejection) => {
                    let response = req.into_response(rejection_response(rejection));
                    Ok(response.map_into_right_body())
                }
            }
        })
    }
}

fn caller_role(req: &ServiceRequest, credentials: &dyn CredentialCodec) -> Role {
    if let Some(identity) = req.extensions().get::<Identity>() {
        return identity.role();
    }
    req.cookie(TOKEN_COOKIE)
        .and_then(|cookie| credentials.verify(cookie.value()).ok())
        .map_or(Role::Guest, |identity| identity.role())
}

fn rejection_response(rejection: Rejection) -> HttpResponse {
    let mut response = HttpResponse::from_error(rejection.to_error());
    if rejection == Rejection::ProtectionFailure {
        *response.status_mut() = StatusCode::BAD_REQUEST;
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockRequestProtector, ProtectionError};
    use crate::domain::{DeploymentRegime, DenialReason, RateLimitDecision};
    use crate::inbound::http::test_utils::{member_identity, test_codec};
    use actix_web::cookie::Cookie;
    use actix_web::{App, test, web};
    use rstest::rstest;
    use serde_json::Value;

    fn middleware(
        regime: DeploymentRegime,
        outcome: Result<RateLimitDecision, ProtectionError>,
    ) -> RateLimit {
        let mut protector = MockRequestProtector::new();
        protector
            .expect_protect()
            .returning(move |_, _| outcome.clone());
        RateLimit::new(
            AdaptiveRateLimiter::new(Arc::new(protector), regime),
            test_codec(),
        )
    }

    async fn call(limit: RateLimit, req: test::TestRequest) -> ServiceResponse<impl actix_web::body::MessageBody> {
        let app = test::init_service(
            App::new()
                .wrap(limit)
                .route("/", web::get().to(|| async { HttpResponse::Ok().body("ok") })),
        )
        .await;
        test::call_service(&app, req.uri("/").to_request()).await
    }

    #[rstest]
    #[case(DenialReason::Bot)]
    #[case(DenialReason::Shield)]
    #[case(DenialReason::RateLimit)]
    #[actix_web::test]
    async fn permissive_denials_do_not_change_status(#[case] reason: DenialReason) {
        let limit = middleware(DeploymentRegime::Permissive, Ok(RateLimitDecision::deny(reason)));
        let res = call(limit, test::TestRequest::get()).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[rstest]
    #[case(DenialReason::Bot, StatusCode::FORBIDDEN, "AUTHORIZATION_ERROR", "Access forbidden")]
    #[case(DenialReason::Shield, StatusCode::FORBIDDEN, "AUTHORIZATION_ERROR", "Access forbidden")]
    #[case(
        DenialReason::RateLimit,
        StatusCode::TOO_MANY_REQUESTS,
        "RATE_LIMIT_EXCEEDED",
        "Guest rate limit exceeded. Try again later."
    )]
    #[actix_web::test]
    async fn strict_denials_block(
        #[case] reason: DenialReason,
        #[case] status: StatusCode,
        #[case] kind: &str,
        #[case] message: &str,
    ) {
        let limit = middleware(DeploymentRegime::Strict, Ok(RateLimitDecision::deny(reason)));
        let res = call(limit, test::TestRequest::get()).await;
        assert_eq!(res.status(), status);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["type"], kind);
        assert_eq!(body["error"]["message"], message);
    }

    #[actix_web::test]
    async fn strict_protector_failure_is_bad_request() {
        let limit = middleware(
            DeploymentRegime::Strict,
            Err(ProtectionError::unavailable("backend down")),
        );
        let res = call(limit, test::TestRequest::get()).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["error"]["type"], "INTERNAL_ERROR");
        assert_eq!(body["error"]["message"], "Internal server error");
    }

    #[actix_web::test]
    async fn role_is_peeked_from_cookie() {
        let codec = test_codec();
        let token = codec.issue(&member_identity()).expect("issue token").token;
        let mut protector = MockRequestProtector::new();
        protector
            .expect_protect()
            .withf(|rule, _| rule.key() == "user-rate-limit")
            .times(1)
            .returning(|_, _| Ok(RateLimitDecision::deny(DenialReason::RateLimit)));
        let limit = RateLimit::new(
            AdaptiveRateLimiter::new(Arc::new(protector), DeploymentRegime::Strict),
            codec,
        );
        let res = call(
            limit,
            test::TestRequest::get().cookie(Cookie::new(TOKEN_COOKIE, token)),
        )
        .await;
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["error"]["message"], "User rate limit exceeded. Try again later.");
    }

    #[actix_web::test]
    async fn unverifiable_cookie_counts_as_guest() {
        let mut protector = MockRequestProtector::new();
        protector
            .expect_protect()
            .withf(|rule, request| {
                rule.key() == "guest-rate-limit" && request.user_agent() == "Internal-Request/1.0"
            })
            .times(1)
            .returning(|_, _| Ok(RateLimitDecision::allow()));
        let limit = RateLimit::new(
            AdaptiveRateLimiter::new(Arc::new(protector), DeploymentRegime::Strict),
            test_codec(),
        );
        let res = call(
            limit,
            test::TestRequest::get().cookie(Cookie::new(TOKEN_COOKIE, "forged")),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
    }
}
