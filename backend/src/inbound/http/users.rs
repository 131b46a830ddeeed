//! Account management handlers.
//!
//! ```text
//! GET    /api/users?page=1&limit=10&role=user&search=ann
//! GET    /api/users/{id}
//! POST   /api/users {"name":"Bob","email":"bob@x.com","password":"secret1"}
//! PUT    /api/users/{id} {"name":"Robert"}
//! DELETE /api/users/{id}
//! ```
//!
//! Every route sits behind [`RequireIdentity`](crate::middleware::RequireIdentity)
//! at the scope level; delete additionally requires the admin role.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    AccountUpdate, EmailAddress, Error, Pagination, Password, User, UserId, UserListQuery,
    UserName,
};
use crate::domain::user_query::DEFAULT_LIMIT;
use crate::middleware::RequireRoles;

use super::ApiResult;
use super::auth::{REGISTRATION_INVALID, RegistrationRequest};
use super::authenticated::AuthenticatedUser;
use super::error::ErrorEnvelope;
use super::state::HttpState;
use super::validation::{FieldErrors, parse_assignable_role};

/// Summary attached to rejected listing parameters.
pub const QUERY_INVALID: &str = "Invalid query parameters";
/// Summary attached to a malformed `{id}` segment.
pub const ID_INVALID: &str = "Invalid user ID";
/// Summary attached to a rejected update body.
pub const UPDATE_INVALID: &str = "Invalid update data";
/// Detail reported for an update body without fields.
pub const UPDATE_EMPTY: &str = "At least one field must be provided for update";

/// Listing parameters as received; all values arrive as strings.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListUsersParams {
    /// One-based page number (digits only).
    #[param(example = "1")]
    pub page: Option<String>,
    /// Page size, 1 to 100 (digits only).
    #[param(example = "10")]
    pub limit: Option<String>,
    /// `user` or `admin`.
    pub role: Option<String>,
    /// Case-insensitive substring of name or email.
    pub search: Option<String>,
}

fn parse_count(raw: &str, message: &'static str) -> Result<u32, &'static str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(message);
    }
    trimmed.parse::<u32>().map_err(|_| message)
}

impl ListUsersParams {
    fn validate(self) -> Result<UserListQuery, Error> {
        let mut errors = FieldErrors::default();
        let page = self
            .page
            .as_deref()
            .map(|raw| errors.check("page", parse_count(raw, "Page must be a number")))
            .unwrap_or(Some(1));
        let limit = self
            .limit
            .as_deref()
            .map(|raw| errors.check("limit", parse_count(raw, "Limit must be a number")))
            .unwrap_or(Some(DEFAULT_LIMIT));
        let role = match self.role.as_deref() {
            Some(raw) => errors.check("role", parse_assignable_role(raw)).map(Some),
            None => Some(None),
        };
        errors.finish_with(QUERY_INVALID)?;

        let (Some(page), Some(limit), Some(role)) = (page, limit, role) else {
            return Err(Error::validation(QUERY_INVALID));
        };
        UserListQuery::new(Some(page), Some(limit), role, self.search.as_deref()).map_err(|err| {
            let mut errors = FieldErrors::default();
            errors.push(err.field(), err.to_string());
            errors.into_error_with(QUERY_INVALID)
        })
    }
}

fn parse_id(raw: &str) -> Result<UserId, Error> {
    let mut errors = FieldErrors::default();
    match errors.check("id", UserId::parse(raw.trim())) {
        Some(id) => Ok(id),
        None => Err(errors.into_error_with(ID_INVALID)),
    }
}

/// Partial update body; at least one field must be present.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateUserRequest {
    #[schema(example = "Robert")]
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// Applied only when the caller is an admin.
    pub role: Option<String>,
}

impl UpdateUserRequest {
    fn validate(self) -> Result<AccountUpdate, Error> {
        let mut errors = FieldErrors::default();
        let update = AccountUpdate {
            name: self
                .name
                .and_then(|raw| errors.check("name", UserName::new(raw))),
            email: self
                .email
                .and_then(|raw| errors.check("email", EmailAddress::new(raw))),
            password: self
                .password
                .and_then(|raw| errors.check("password", Password::new(raw))),
            role: self
                .role
                .as_deref()
                .and_then(|raw| errors.check("role", parse_assignable_role(raw))),
        };
        errors.finish_with(UPDATE_INVALID)?;
        if update.is_empty() {
            let mut errors = FieldErrors::default();
            errors.push("body", UPDATE_EMPTY);
            return Err(errors.into_error_with(UPDATE_INVALID));
        }
        Ok(update)
    }
}

/// Page of accounts.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserListResponse {
    pub success: bool,
    #[schema(example = "Users fetched successfully")]
    pub message: &'static str,
    pub data: Vec<User>,
    pub pagination: Pagination,
}

/// Single account.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub success: bool,
    #[schema(example = "User fetched successfully")]
    pub message: &'static str,
    pub data: User,
}

/// Confirmation of a deletion.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedResponse {
    pub success: bool,
    #[schema(example = "User deleted successfully")]
    pub message: &'static str,
}

fn user_response(message: &'static str, data: User) -> UserResponse {
    UserResponse {
        success: true,
        message,
        data,
    }
}

/// List accounts with optional role filter and search term.
#[utoipa::path(
    get,
    path = "/api/users",
    params(ListUsersParams),
    responses(
        (status = 200, description = "Accounts", body = UserListResponse),
        (status = 400, description = "Invalid query parameters", body = ErrorEnvelope),
        (status = 401, description = "Missing or invalid credential", body = ErrorEnvelope),
        (status = 429, description = "Rate limit exceeded", body = ErrorEnvelope),
        (status = 500, description = "Internal server error", body = ErrorEnvelope)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("")]
pub async fn list_users(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    params: web::Query<ListUsersParams>,
) -> ApiResult<web::Json<UserListResponse>> {
    let query = params.into_inner().validate()?;
    let page = state.users.list(query.clone()).await?;
    let pagination = Pagination::new(&query, page.total);
    info!(
        caller = %caller.id(),
        count = page.users.len(),
        page = pagination.page,
        total = pagination.total,
        "users listed"
    );
    Ok(web::Json(UserListResponse {
        success: true,
        message: "Users fetched successfully",
        data: page.users,
        pagination,
    }))
}

/// Fetch one account; members may only read their own.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "Account identifier")),
    responses(
        (status = 200, description = "Account", body = UserResponse),
        (status = 400, description = "Invalid user ID", body = ErrorEnvelope),
        (status = 401, description = "Missing or invalid credential", body = ErrorEnvelope),
        (status = 403, description = "Not the caller's account", body = ErrorEnvelope),
        (status = 404, description = "Unknown account", body = ErrorEnvelope)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserResponse>> {
    let id = parse_id(&path)?;
    let user = state.users.get(&caller, id).await?;
    info!(user_id = %id, caller = %caller.id(), "user fetched");
    Ok(web::Json(user_response("User fetched successfully", user)))
}

/// Create an account on behalf of the caller.
///
/// Non-admin callers always create plain users.
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = RegistrationRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid input", body = ErrorEnvelope),
        (status = 401, description = "Missing or invalid credential", body = ErrorEnvelope),
        (status = 409, description = "Email already in use", body = ErrorEnvelope)
    ),
    tags = ["users"],
    operation_id = "createUser"
)]
#[post("")]
pub async fn create_user(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    payload: web::Json<RegistrationRequest>,
) -> ApiResult<HttpResponse> {
    let registration = payload.into_inner().validate(REGISTRATION_INVALID)?;
    let user = state.users.create(&caller, registration).await?;
    info!(user_id = %user.id(), role = %user.role(), caller = %caller.id(), "user created");
    Ok(HttpResponse::Created().json(user_response("User created successfully", user)))
}

/// Apply a partial update; role changes by non-admins are ignored.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "Account identifier")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Account updated", body = UserResponse),
        (status = 400, description = "Invalid user ID or update data", body = ErrorEnvelope),
        (status = 401, description = "Missing or invalid credential", body = ErrorEnvelope),
        (status = 403, description = "Not the caller's account", body = ErrorEnvelope),
        (status = 404, description = "Unknown account", body = ErrorEnvelope),
        (status = 409, description = "Email already in use", body = ErrorEnvelope)
    ),
    tags = ["users"],
    operation_id = "updateUser"
)]
#[put("/{id}")]
pub async fn update_user(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<String>,
    payload: web::Json<UpdateUserRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let id = parse_id(&path)?;
    let update = payload.into_inner().validate()?;
    let user = state.users.update(&caller, id, update).await?;
    Ok(web::Json(user_response("User updated successfully", user)))
}

/// Remove an account. Admin only; admins cannot remove themselves.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "Account identifier")),
    responses(
        (status = 200, description = "Account removed", body = DeletedResponse),
        (status = 400, description = "Invalid user ID", body = ErrorEnvelope),
        (status = 401, description = "Missing or invalid credential", body = ErrorEnvelope),
        (status = 403, description = "Not an admin, or own account", body = ErrorEnvelope),
        (status = 404, description = "Unknown account", body = ErrorEnvelope)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/{id}", wrap = "RequireRoles::admin_only()")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<DeletedResponse>> {
    let id = parse_id(&path)?;
    state.users.delete(&caller, id).await?;
    Ok(web::Json(DeletedResponse {
        success: true,
        message: "User deleted successfully",
    }))
}

#[cfg(test)]
mod tests;
