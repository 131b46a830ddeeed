//! Handler tests for account management.

use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use chrono::Utc;
use rstest::rstest;
use serde_json::{Value, json};

use super::*;
use crate::domain::directory::{CANNOT_DELETE_SELF, USER_NOT_FOUND};
use crate::domain::ports::{CredentialCodec, MockAccountService, MockUserDirectory};
use crate::domain::{Identity, Role, UserPage};
use crate::inbound::http::cookies::TOKEN_COOKIE;
use crate::inbound::http::test_utils::{admin_identity, member_identity, test_codec, test_state};
use crate::inbound::http::validation::json_error_handler;
use crate::middleware::RequireIdentity;

fn account(id: i64, name: &str, email: &str, role: Role) -> User {
    User::new(
        UserId::new(id).expect("id"),
        UserName::new(name).expect("name"),
        EmailAddress::new(email).expect("email"),
        role,
        Utc::now(),
        Utc::now(),
    )
}

fn token_for(identity: &Identity) -> Cookie<'static> {
    let issued = test_codec().issue(identity).expect("issue");
    Cookie::new(TOKEN_COOKIE, issued.token)
}

async fn call(
    users: MockUserDirectory,
    caller: Option<Identity>,
    req: test::TestRequest,
) -> ServiceResponse {
    let state = test_state(
        Arc::new(MockAccountService::new()),
        Arc::new(users),
        test_codec(),
    );
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .service(
                web::scope("/api/users")
                    .wrap(RequireIdentity)
                    .service(list_users)
                    .service(create_user)
                    .service(get_user)
                    .service(update_user)
                    .service(delete_user),
            ),
    )
    .await;
    let req = match caller {
        Some(identity) => req.cookie(token_for(&identity)),
        None => req,
    };
    test::call_service(&app, req.to_request()).await
}

#[actix_web::test]
async fn anonymous_callers_are_rejected() {
    let res = call(
        MockUserDirectory::new(),
        None,
        test::TestRequest::get().uri("/api/users"),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn list_returns_page_and_pagination() {
    let mut users = MockUserDirectory::new();
    users
        .expect_list()
        .withf(|query| {
            query.page() == 2
                && query.limit() == 1
                && query.role() == Some(Role::User)
                && query.search() == Some("ann")
        })
        .times(1)
        .returning(|_| {
            Ok(UserPage {
                users: vec![account(2, "Ann", "ann@x.com", Role::User)],
                total: 3,
            })
        });

    let res = call(
        users,
        Some(member_identity()),
        test::TestRequest::get().uri("/api/users?page=2&limit=1&role=user&search=%20ann%20"),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["message"], "Users fetched successfully");
    assert_eq!(body["data"][0]["email"], "ann@x.com");
    assert!(body["data"][0].get("password").is_none());
    assert_eq!(
        body["pagination"],
        json!({
            "page": 2, "limit": 1, "total": 3,
            "totalPages": 3, "hasNext": true, "hasPrev": true
        })
    );
}

#[rstest]
#[case("page=abc", "page")]
#[case("page=0", "page")]
#[case("limit=-5", "limit")]
#[case("limit=101", "limit")]
#[case("role=guest", "role")]
#[actix_web::test]
async fn invalid_list_parameters(#[case] query: &str, #[case] field: &str) {
    let res = call(
        MockUserDirectory::new(),
        Some(admin_identity()),
        test::TestRequest::get().uri(&format!("/api/users?{query}")),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["error"]["message"], QUERY_INVALID);
    assert!(body["error"]["details"][field].is_array());
}

#[rstest]
#[case("abc")]
#[case("0")]
#[case("-1")]
#[actix_web::test]
async fn malformed_ids_are_rejected(#[case] id: &str) {
    let res = call(
        MockUserDirectory::new(),
        Some(admin_identity()),
        test::TestRequest::get().uri(&format!("/api/users/{id}")),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["error"]["message"], ID_INVALID);
    assert_eq!(body["error"]["details"]["id"][0], "ID must be a valid number");
}

#[actix_web::test]
async fn get_passes_caller_and_maps_errors() {
    let mut users = MockUserDirectory::new();
    users
        .expect_get()
        .withf(|caller, id| caller.id().get() == 2 && id.get() == 5)
        .returning(|_, _| Err(Error::authorization("You can only view your own profile")));

    let res = call(
        users,
        Some(member_identity()),
        test::TestRequest::get().uri("/api/users/5"),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["error"]["type"], "AUTHORIZATION_ERROR");
}

#[actix_web::test]
async fn get_returns_account() {
    let mut users = MockUserDirectory::new();
    users
        .expect_get()
        .returning(|_, _| Ok(account(2, "Ann", "ann@x.com", Role::User)));

    let res = call(
        users,
        Some(member_identity()),
        test::TestRequest::get().uri("/api/users/2"),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["message"], "User fetched successfully");
    assert_eq!(body["data"]["id"], 2);
}

#[actix_web::test]
async fn create_returns_created() {
    let mut users = MockUserDirectory::new();
    users
        .expect_create()
        .withf(|caller, reg| caller.is_admin() && reg.role == Role::Admin)
        .times(1)
        .returning(|_, _| Ok(account(3, "Bob", "bob@x.com", Role::Admin)));

    let res = call(
        users,
        Some(admin_identity()),
        test::TestRequest::post().uri("/api/users").set_json(json!({
            "name": "Bob",
            "email": "bob@x.com",
            "password": "secret1",
            "role": "admin"
        })),
    )
    .await;

    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["message"], "User created successfully");
    assert_eq!(body["data"]["role"], "admin");
}

#[actix_web::test]
async fn update_forwards_validated_fields() {
    let mut users = MockUserDirectory::new();
    users
        .expect_update()
        .withf(|_, id, update| {
            id.get() == 2
                && update.name.as_ref().map(AsRef::as_ref) == Some("Annie")
                && update.role == Some(Role::Admin)
                && update.email.is_none()
        })
        .times(1)
        .returning(|_, _, _| Ok(account(2, "Annie", "ann@x.com", Role::User)));

    let res = call(
        users,
        Some(member_identity()),
        test::TestRequest::put()
            .uri("/api/users/2")
            .set_json(json!({ "name": "Annie", "role": "admin" })),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["message"], "User updated successfully");
    assert_eq!(body["data"]["role"], "user");
}

#[rstest]
#[case(json!({}), "body", UPDATE_EMPTY)]
#[case(json!({ "email": "nope" }), "email", "Invalid email address")]
#[case(json!({ "password": "123" }), "password", "Password must be at least 6 characters")]
#[actix_web::test]
async fn invalid_updates(#[case] payload: Value, #[case] field: &str, #[case] detail: &str) {
    let res = call(
        MockUserDirectory::new(),
        Some(member_identity()),
        test::TestRequest::put().uri("/api/users/2").set_json(payload),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["error"]["message"], UPDATE_INVALID);
    assert_eq!(body["error"]["details"][field][0], detail);
}

#[actix_web::test]
async fn delete_requires_admin_role() {
    let res = call(
        MockUserDirectory::new(),
        Some(member_identity()),
        test::TestRequest::delete().uri("/api/users/3"),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[rstest]
#[case(Ok(()), StatusCode::OK)]
#[case(Err(Error::authorization(CANNOT_DELETE_SELF)), StatusCode::FORBIDDEN)]
#[case(Err(Error::not_found(USER_NOT_FOUND)), StatusCode::NOT_FOUND)]
#[actix_web::test]
async fn delete_outcomes(#[case] outcome: Result<(), Error>, #[case] expected: StatusCode) {
    let mut users = MockUserDirectory::new();
    users
        .expect_delete()
        .times(1)
        .returning(move |_, _| outcome.clone());

    let res = call(
        users,
        Some(admin_identity()),
        test::TestRequest::delete().uri("/api/users/3"),
    )
    .await;
    assert_eq!(res.status(), expected);
    if expected == StatusCode::OK {
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["message"], "User deleted successfully");
    }
}
