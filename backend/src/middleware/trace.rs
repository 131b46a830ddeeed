//! Outermost middleware: request correlation and the access log.
//!
//! Every request runs inside a fresh [`TraceId`] so error envelopes can
//! quote it, and leaves one log line carrying the caller, status, latency
//! and, for failures, the error classification.

use std::task::{Context, Poll};
use std::time::Instant;

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{error, info, warn};

use crate::domain;
pub use crate::domain::TraceId;
use crate::inbound::http::request_meta::{client_ip, user_agent};

/// Response header carrying the trace identifier.
pub const TRACE_ID_HEADER: &str = "trace-id";

/// Outermost middleware: trace id, `trace-id` header and request logging.
///
/// Handler and middleware failures reach it as responses carrying the
/// error, so they are classified in the access log and get the header too.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use warden::Trace;
///
/// let app = App::new().wrap(Trace);
/// ```
#[derive(Clone)]
pub struct Trace;

impl<S, B> Transform<S, ServiceRequest> for Trace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TraceMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TraceMiddleware { service }))
    }
}

/// Service wrapper produced by [`Trace`].
pub struct TraceMiddleware<S> {
    service: S,
}

struct RequestSummary {
    method: String,
    path: String,
    ip: String,
    user_agent: String,
    started: Instant,
}

impl<S, B> Service<ServiceRequest> for TraceMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let trace_id = TraceId::generate();
        let summary = RequestSummary {
            method: req.method().to_string(),
            path: req.path().to_owned(),
            ip: client_ip(req.request()),
            user_agent: user_agent(req.request()).unwrap_or("-").to_owned(),
            started: Instant::now(),
        };
        let fut = TraceId::scope(trace_id, self.service.call(req));
        Box::pin(TraceId::scope(trace_id, async move {
            let mut res = fut.await?;
            log_completion(&summary, &res, trace_id);
            match HeaderValue::from_str(&trace_id.to_string()) {
                Ok(value) => {
                    res.response_mut()
                        .headers_mut()
                        .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
                }
                Err(error) => {
                    error!(
                        %error,
                        trace_id = %trace_id,
                        "failed to encode trace identifier header"
                    );
                }
            }
            Ok(res)
        }))
    }
}

fn log_completion<B>(summary: &RequestSummary, res: &ServiceResponse<B>, trace_id: TraceId) {
    let status = res.status().as_u16();
    let latency_ms = summary.started.elapsed().as_millis();
    let Some(err) = res.response().error() else {
        info!(
            trace_id = %trace_id,
            method = %summary.method,
            path = %summary.path,
            ip = %summary.ip,
            user_agent = %summary.user_agent,
            status,
            latency_ms,
            "request completed"
        );
        return;
    };

    let (classification, message, operational) = err
        .as_error::<domain::Error>()
        .map_or(("UNCLASSIFIED", err.to_string(), false), |domain_err| {
            (
                domain_err.code().as_str(),
                domain_err.message().to_owned(),
                domain_err.is_operational(),
            )
        });
    if res.status().is_server_error() || !operational {
        error!(
            trace_id = %trace_id,
            method = %summary.method,
            path = %summary.path,
            ip = %summary.ip,
            user_agent = %summary.user_agent,
            status,
            latency_ms,
            classification,
            operational,
            error = %message,
            "request failed"
        );
    } else {
        warn!(
            trace_id = %trace_id,
            method = %summary.method,
            path = %summary.path,
            ip = %summary.ip,
            user_agent = %summary.user_agent,
            status,
            latency_ms,
            classification,
            error = %message,
            "request rejected"
        );
    }
}
