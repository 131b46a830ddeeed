//! Account entry points: sign-up, sign-in, sign-out and profile.
//!
//! ```text
//! POST /api/auth/sign-up {"name":"Ann","email":"ann@x.com","password":"secret1","role":"user"}
//! POST /api/auth/sign-in {"email":"ann@x.com","password":"secret1"}
//! POST /api/auth/sign-out
//! GET  /api/auth/profile
//! ```
//!
//! Successful sign-up and sign-in set the credential cookie; sign-out
//! replaces it with an expired one.

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use utoipa::ToSchema;

use crate::domain::{
    Credentials, EmailAddress, Error, Identity, Password, Registration, Role, User, UserName,
};
use crate::middleware::RequireIdentity;

use super::ApiResult;
use super::authenticated::AuthenticatedUser;
use super::error::ErrorEnvelope;
use super::state::HttpState;
use super::validation::{FieldErrors, parse_assignable_role};

/// Summary attached to a rejected registration.
pub const REGISTRATION_INVALID: &str = "Please provide all required fields with valid data";
/// Summary attached to rejected sign-in input.
pub const CREDENTIALS_INVALID: &str = "Please provide valid login credentials";

/// Registration body shared by sign-up and `POST /api/users`.
///
/// Every field is optional at the wire level so that one response can list
/// all problems.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct RegistrationRequest {
    #[schema(example = "Ann")]
    pub name: Option<String>,
    #[schema(example = "ann@x.com")]
    pub email: Option<String>,
    #[schema(example = "secret1")]
    pub password: Option<String>,
    /// `user` (default) or `admin`.
    #[schema(example = "user")]
    pub role: Option<String>,
}

impl RegistrationRequest {
    /// Validate into a [`Registration`], reporting failures under `summary`.
    pub(crate) fn validate(self, summary: &str) -> Result<Registration, Error> {
        let mut errors = FieldErrors::default();
        let name = errors
            .require("name", self.name)
            .and_then(|raw| errors.check("name", UserName::new(raw)));
        let email = errors
            .require("email", self.email)
            .and_then(|raw| errors.check("email", EmailAddress::new(raw)));
        let password = errors
            .require("password", self.password)
            .and_then(|raw| errors.check("password", Password::new(raw)));
        let role = errors.check(
            "role",
            self.role
                .as_deref()
                .map_or(Ok(Role::User), parse_assignable_role),
        );

        match (name, email, password, role) {
            (Some(name), Some(email), Some(password), Some(role)) if errors.is_empty() => {
                Ok(Registration {
                    name,
                    email,
                    password,
                    role,
                })
            }
            _ => Err(errors.into_error_with(summary)),
        }
    }
}

/// Sign-in body.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct SignInRequest {
    #[schema(example = "ann@x.com")]
    pub email: Option<String>,
    #[schema(example = "secret1")]
    pub password: Option<String>,
}

impl SignInRequest {
    fn validate(self) -> Result<Credentials, Error> {
        let mut errors = FieldErrors::default();
        let email = errors
            .require("email", self.email)
            .and_then(|raw| errors.check("email", EmailAddress::new(raw)));
        let password = errors
            .require("password", self.password)
            .and_then(|raw| errors.check("password", Password::presented(raw)));

        match (email, password) {
            (Some(email), Some(password)) if errors.is_empty() => {
                Ok(Credentials { email, password })
            }
            _ => Err(errors.into_error_with(CREDENTIALS_INVALID)),
        }
    }
}

/// Public account fields returned after sign-up and sign-in.
#[derive(Debug, Serialize, ToSchema)]
pub struct AccountSummary {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Ann")]
    pub name: String,
    #[schema(example = "ann@x.com")]
    pub email: String,
    pub role: Role,
}

impl From<&User> for AccountSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().get(),
            name: user.name().as_ref().to_owned(),
            email: user.email().as_ref().to_owned(),
            role: user.role(),
        }
    }
}

/// Body of a successful sign-up or sign-in.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    #[schema(example = "User signed in successfully")]
    pub message: &'static str,
    pub user: AccountSummary,
}

/// Body carrying only a confirmation message.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    #[schema(example = "User signed out successfully")]
    pub message: &'static str,
}

/// Body of `GET /api/auth/profile`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub success: bool,
    pub user: Identity,
}

/// Issue a credential for `user` and answer with the cookie attached.
fn signed_in(
    state: &HttpState,
    mut response: actix_web::HttpResponseBuilder,
    user: &User,
    message: &'static str,
) -> ApiResult<HttpResponse> {
    let issued = state.credentials.issue(&Identity::from(user)).map_err(|err| {
        error!(error = %err, user_id = %user.id(), "credential issuance failed");
        Error::internal("credential issuance failed")
    })?;
    Ok(response
        .cookie(state.cookies.credential_cookie(&issued))
        .json(AuthResponse {
            success: true,
            message,
            user: AccountSummary::from(user),
        }))
}

/// Register an account and sign it in.
#[utoipa::path(
    post,
    path = "/api/auth/sign-up",
    request_body = RegistrationRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse,
            headers(("Set-Cookie" = String, description = "Credential cookie"))),
        (status = 400, description = "Invalid input", body = ErrorEnvelope),
        (status = 409, description = "Email already in use", body = ErrorEnvelope),
        (status = 429, description = "Rate limit exceeded", body = ErrorEnvelope),
        (status = 500, description = "Internal server error", body = ErrorEnvelope)
    ),
    tags = ["auth"],
    operation_id = "signUp",
    security([])
)]
#[post("/sign-up")]
pub async fn sign_up(
    state: web::Data<HttpState>,
    payload: web::Json<RegistrationRequest>,
) -> ApiResult<HttpResponse> {
    let registration = payload.into_inner().validate(REGISTRATION_INVALID)?;
    let user = state.accounts.sign_up(registration).await?;
    info!(email = %user.email(), role = %user.role(), "user signed up");
    signed_in(&state, HttpResponse::Created(), &user, "User created successfully")
}

/// Authenticate and receive a credential cookie.
#[utoipa::path(
    post,
    path = "/api/auth/sign-in",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse,
            headers(("Set-Cookie" = String, description = "Credential cookie"))),
        (status = 400, description = "Invalid input", body = ErrorEnvelope),
        (status = 401, description = "Invalid email or password", body = ErrorEnvelope),
        (status = 429, description = "Rate limit exceeded", body = ErrorEnvelope),
        (status = 500, description = "Internal server error", body = ErrorEnvelope)
    ),
    tags = ["auth"],
    operation_id = "signIn",
    security([])
)]
#[post("/sign-in")]
pub async fn sign_in(
    state: web::Data<HttpState>,
    payload: web::Json<SignInRequest>,
) -> ApiResult<HttpResponse> {
    let credentials = payload.into_inner().validate()?;
    let user = state.accounts.sign_in(credentials).await?;
    info!(email = %user.email(), role = %user.role(), "user signed in");
    signed_in(&state, HttpResponse::Ok(), &user, "User signed in successfully")
}

/// Drop the credential cookie.
#[utoipa::path(
    post,
    path = "/api/auth/sign-out",
    responses(
        (status = 200, description = "Signed out", body = MessageResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorEnvelope)
    ),
    tags = ["auth"],
    operation_id = "signOut",
    security([])
)]
#[post("/sign-out")]
pub async fn sign_out(state: web::Data<HttpState>) -> HttpResponse {
    info!("user signed out");
    HttpResponse::Ok()
        .cookie(state.cookies.removal_cookie())
        .json(MessageResponse {
            success: true,
            message: "User signed out successfully",
        })
}

/// Identity carried by the caller's credential.
#[utoipa::path(
    get,
    path = "/api/auth/profile",
    responses(
        (status = 200, description = "Caller identity", body = ProfileResponse),
        (status = 401, description = "Missing or invalid credential", body = ErrorEnvelope),
        (status = 429, description = "Rate limit exceeded", body = ErrorEnvelope)
    ),
    tags = ["auth"],
    operation_id = "profile"
)]
#[get("/profile", wrap = "RequireIdentity")]
pub async fn profile(user: AuthenticatedUser) -> web::Json<ProfileResponse> {
    web::Json(ProfileResponse {
        success: true,
        user: user.into_inner(),
    })
}
