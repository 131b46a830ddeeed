//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint, the response envelopes and the
//! `token` cookie security scheme. Swagger UI serves it in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{ErrorCode, Identity, Pagination, Role, User};
use crate::inbound::http::auth::{
    AccountSummary, AuthResponse, MessageResponse, ProfileResponse, RegistrationRequest,
    SignInRequest,
};
use crate::inbound::http::error::{ErrorBody, ErrorEnvelope};
use crate::inbound::http::health::{HealthReport, ProtectionStatus};
use crate::inbound::http::users::{
    DeletedResponse, UpdateUserRequest, UserListResponse, UserResponse,
};

/// Enrich the generated document with the credential cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "TokenCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "token",
                "Signed credential issued by POST /api/auth/sign-in.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Warden API",
        description = "Account management behind cookie credentials, role policies and adaptive rate limits."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("TokenCookie" = [])),
    paths(
        crate::inbound::http::auth::sign_up,
        crate::inbound::http::auth::sign_in,
        crate::inbound::http::auth::sign_out,
        crate::inbound::http::auth::profile,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::create_user,
        crate::inbound::http::users::update_user,
        crate::inbound::http::users::delete_user,
        crate::inbound::http::health::health,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        User,
        Identity,
        Role,
        Pagination,
        ErrorCode,
        ErrorBody,
        ErrorEnvelope,
        RegistrationRequest,
        SignInRequest,
        AccountSummary,
        AuthResponse,
        MessageResponse,
        ProfileResponse,
        UpdateUserRequest,
        UserListResponse,
        UserResponse,
        DeletedResponse,
        HealthReport,
        ProtectionStatus
    )),
    tags(
        (name = "auth", description = "Sign-up, sign-in and the caller's identity"),
        (name = "users", description = "Account management"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
