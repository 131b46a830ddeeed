//! End-to-end account flows through the assembled application.

mod support;

use actix_web::http::StatusCode;
use actix_web::{http::header, test};
use rstest::rstest;
use serde_json::{Value, json};

use support::{dependencies, token_cookie};
use warden::domain::{DeploymentRegime, RateLimitTable};
use warden::inbound::http::app::build_app;
use warden::middleware::trace::TRACE_ID_HEADER;

#[rstest]
#[actix_web::test]
async fn accounts_lifecycle() {
    let app = test::init_service(build_app(dependencies(
        DeploymentRegime::Permissive,
        RateLimitTable::default(),
    )))
    .await;

    // An admin signs up and receives a credential.
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/sign-up")
            .set_json(json!({
                "name": "Root",
                "email": "root@x.com",
                "password": "secret1",
                "role": "admin"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let admin = token_cookie(&res).expect("admin cookie");
    let body: Value = test::read_body_json(res).await;
    let admin_id = body["user"]["id"].as_i64().expect("admin id");

    // A second sign-up with the same address conflicts.
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/sign-up")
            .set_json(json!({
                "name": "Dup",
                "email": "ROOT@x.com",
                "password": "hijack9",
                "role": "user"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // The original account keeps its password, name and role.
    for (password, expected) in [("secret1", StatusCode::OK), ("hijack9", StatusCode::UNAUTHORIZED)] {
        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/auth/sign-in")
                .set_json(json!({ "email": "root@x.com", "password": password }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), expected);
    }
    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/users/{admin_id}"))
            .cookie(admin.clone())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["data"]["name"], "Root");
    assert_eq!(body["data"]["role"], "admin");

    // The admin creates a member.
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/users")
            .cookie(admin.clone())
            .set_json(json!({ "name": "Ann", "email": "ann@x.com", "password": "secret2" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(res).await;
    let ann_id = body["data"]["id"].as_i64().expect("member id");
    assert_eq!(body["data"]["role"], "user");

    // The member signs in with the password chosen by the admin.
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/sign-in")
            .set_json(json!({ "email": "ann@x.com", "password": "secret2" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let member = token_cookie(&res).expect("member cookie");

    // Wrong passwords and unknown addresses look identical.
    for (email, password) in [("ann@x.com", "wrong-pass"), ("nobody@x.com", "secret2")] {
        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/auth/sign-in")
                .set_json(json!({ "email": email, "password": password }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["error"]["message"], "Invalid email or password");
    }

    // Profile echoes the credential's identity.
    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/auth/profile")
            .cookie(member.clone())
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["user"], json!({ "id": ann_id, "email": "ann@x.com", "role": "user" }));

    // Members read only their own record and cannot promote themselves.
    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/users/{admin_id}"))
            .cookie(member.clone())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/users/{ann_id}"))
            .cookie(member.clone())
            .set_json(json!({ "name": "Annie", "role": "admin" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["data"]["name"], "Annie");
    assert_eq!(body["data"]["role"], "user");

    // Deletion is admin only, and never of oneself.
    let res = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/users/{admin_id}"))
            .cookie(member.clone())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/users/{admin_id}"))
            .cookie(admin.clone())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/users/{ann_id}"))
            .cookie(admin.clone())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/users/{ann_id}"))
            .cookie(admin.clone())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Listing shows the remaining account.
    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/users?role=admin")
            .cookie(admin.clone())
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["email"], "root@x.com");

    // Sign-out clears the cookie.
    let res = test::call_service(
        &app,
        test::TestRequest::post().uri("/api/auth/sign-out").cookie(admin).to_request(),
    )
    .await;
    assert_eq!(token_cookie(&res).map(|c| c.value().to_owned()), Some(String::new()));
}

#[rstest]
#[case("not-a-token")]
#[case("")]
#[actix_web::test]
async fn protected_routes_reject_bad_credentials(#[case] token: &str) {
    let app = test::init_service(build_app(dependencies(
        DeploymentRegime::Permissive,
        RateLimitTable::default(),
    )))
    .await;

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/users")
            .insert_header((header::COOKIE, format!("token={token}")))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["type"], "AUTHENTICATION_ERROR");
}

#[rstest]
#[actix_web::test]
async fn unknown_routes_are_normalised_and_traced() {
    let app = test::init_service(build_app(dependencies(
        DeploymentRegime::Permissive,
        RateLimitTable::default(),
    )))
    .await;

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/nothing-here").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(res.headers().contains_key(TRACE_ID_HEADER));
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["error"]["type"], "RESOURCE_NOT_FOUND");
    assert_eq!(body["error"]["message"], "Route GET /api/nothing-here not found");
}

#[rstest]
#[actix_web::test]
async fn malformed_bodies_become_validation_errors() {
    let app = test::init_service(build_app(dependencies(
        DeploymentRegime::Permissive,
        RateLimitTable::default(),
    )))
    .await;

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/sign-up")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{\"name\":")
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["error"]["type"], "VALIDATION_ERROR");
}

#[rstest]
#[actix_web::test]
async fn health_reports_status() {
    let app = test::init_service(build_app(dependencies(
        DeploymentRegime::Strict,
        RateLimitTable::default(),
    )))
    .await;

    let res = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["status"], "OK");
    assert_eq!(body["environment"], "production");
    assert_eq!(body["protection"], "missing");

    let res = test::call_service(&app, test::TestRequest::get().uri("/health/ready").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[rstest]
#[case("/health", StatusCode::OK)]
#[case("/health/live", StatusCode::OK)]
#[case("/api/users", StatusCode::UNAUTHORIZED)]
#[case("/api/users/7", StatusCode::UNAUTHORIZED)]
#[case("/api/auth/profile", StatusCode::UNAUTHORIZED)]
#[actix_web::test]
async fn every_layer_answers_with_a_trace_header(#[case] uri: &str, #[case] expected: StatusCode) {
    let app = test::init_service(build_app(dependencies(
        DeploymentRegime::Permissive,
        RateLimitTable::default(),
    )))
    .await;

    let res = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
    assert_eq!(res.status(), expected);
    assert!(res.headers().contains_key(TRACE_ID_HEADER));
}
