//! Application assembly: routes, extractor configuration and middleware order.

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpRequest, web};
use tracing::warn;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use crate::domain::{AdaptiveRateLimiter, Error};
use crate::middleware::{RateLimit, RequireIdentity, Trace};

#[cfg(debug_assertions)]
use crate::doc::ApiDoc;

use super::ApiResult;
use super::auth::{profile, sign_in, sign_out, sign_up};
use super::health::{HealthState, health, live, ready};
use super::state::HttpState;
use super::users::{create_user, delete_user, get_user, list_users, update_user};
use super::validation::{json_error_handler, path_error_handler, query_error_handler};

/// Shared state handed to every worker's application instance.
#[derive(Clone)]
pub struct AppDependencies {
    pub health: web::Data<HealthState>,
    pub http: web::Data<HttpState>,
    pub limiter: AdaptiveRateLimiter,
}

/// Fallback for unmatched routes.
pub async fn route_not_found(req: HttpRequest) -> ApiResult<()> {
    warn!(method = %req.method(), path = req.path(), "route not found");
    Err(Error::not_found(format!(
        "Route {} {} not found",
        req.method(),
        req.path()
    )))
}

/// Build the application.
///
/// Middleware runs as [`Trace`], then [`RateLimit`], then
/// [`RequireIdentity`] on `/api/users` and the profile route.
pub fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health: health_state,
        http,
        limiter,
    } = deps;
    let rate_limit = RateLimit::new(limiter, http.credentials.clone());

    let auth = web::scope("/api/auth")
        .service(sign_up)
        .service(sign_in)
        .service(sign_out)
        .service(profile);

    let users = web::scope("/api/users")
        .wrap(RequireIdentity)
        .service(list_users)
        .service(create_user)
        .service(get_user)
        .service(update_user)
        .service(delete_user);

    let app = App::new()
        .app_data(health_state)
        .app_data(http)
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .service(auth)
        .service(users)
        .service(health)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app.default_service(web::to(route_not_found))
        .wrap(rate_limit)
        .wrap(Trace)
}
