//! REST login/logout behaviour against in-memory stores

mod common;

use actix_middleware::{AuthenticatedUser, JwtAuthMiddleware};
use actix_web::{cookie::Cookie, http::StatusCode, test, web, App, HttpResponse};
use auth_service::handlers;
use common::*;
use jwt_security::{AuthError, FailureMode};
use serde_json::{json, Value};

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .configure(handlers::configure),
        )
        .await
    };
}

macro_rules! login {
    ($app:expr, $email:expr, $password:expr) => {
        test::call_service(&$app, login_request($email, $password).to_request()).await
    };
}

fn login_request(email: &str, password: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "email": email, "password": password }))
}

#[actix_web::test]
async fn test_login_returns_token_and_cookie() {
    let ctx = context();
    let app = app!(ctx.state);

    let resp = login!(app, ALICE_EMAIL, ALICE_PASSWORD);
    assert_eq!(resp.status(), StatusCode::OK);

    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == "access_token")
        .expect("access_token cookie");
    assert_eq!(cookie.http_only(), Some(true));
    let cookie_value = cookie.value().to_string();

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 3600);
    assert_eq!(body["role"], "employee");
    assert_eq!(body["user_id"], ALICE_ID.to_string());

    let token = body["access_token"].as_str().unwrap();
    assert_eq!(token, cookie_value);

    let claims = ctx.validator.validate(token).await.unwrap();
    assert_eq!(claims.sub, ALICE_ID.to_string());
}

#[actix_web::test]
async fn test_login_email_is_case_insensitive() {
    let ctx = context();
    let app = app!(ctx.state);

    let resp = login!(app, "  ALICE@Example.com ", ALICE_PASSWORD);
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_unknown_identity_and_wrong_password_look_the_same() {
    let ctx = context();
    let app = app!(ctx.state);

    let wrong = login!(app, ALICE_EMAIL, "not-the-password");
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    let wrong_body: Value = test::read_body_json(wrong).await;

    let unknown = login!(app, "mallory@example.com", "whatever");
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    let unknown_body: Value = test::read_body_json(unknown).await;

    assert_eq!(wrong_body, unknown_body);
    assert_eq!(wrong_body, json!({ "error": "invalid_credentials", "status": 401 }));
}

#[actix_web::test]
async fn test_blank_or_malformed_email_is_bad_request() {
    let ctx = context();
    let app = app!(ctx.state);

    for email in ["", "   ", "alice.example.com"] {
        let resp = login!(app, email, ALICE_PASSWORD);
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "invalid_request");
    }
}

#[actix_web::test]
async fn test_lockout_refuses_correct_password() {
    let ctx = context();
    let app = app!(ctx.state);

    for _ in 0..5 {
        let resp = login!(app, ALICE_EMAIL, "guess");
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    assert_eq!(ctx.users.lookups(), 5);

    let resp = login!(app, ALICE_EMAIL, ALICE_PASSWORD);
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

    // Refused before the credential store or the password hash is consulted
    assert_eq!(ctx.users.lookups(), 5);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "too_many_attempts", "status": 429 }));
}

#[actix_web::test]
async fn test_success_resets_failure_count() {
    let ctx = context();
    let app = app!(ctx.state);

    for _ in 0..4 {
        let resp = login!(app, ALICE_EMAIL, "guess");
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
    let resp = login!(app, ALICE_EMAIL, ALICE_PASSWORD);
    assert_eq!(resp.status(), StatusCode::OK);

    // Counter starts over, so four more failures still don't lock
    for _ in 0..4 {
        let resp = login!(app, ALICE_EMAIL, "guess");
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
    let resp = login!(app, ALICE_EMAIL, ALICE_PASSWORD);
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_logout_revokes_bearer_token() {
    let ctx = context();
    let app = app!(ctx.state);

    let resp = login!(app, BOB_EMAIL, BOB_PASSWORD);
    let body: Value = test::read_body_json(resp).await;
    let token = body["access_token"].as_str().unwrap().to_string();

    let req = test::TestRequest::delete()
        .uri("/api/v1/auth/logout")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let cleared = resp
        .response()
        .cookies()
        .find(|c| c.name() == "access_token")
        .expect("removal cookie");
    assert_eq!(cleared.value(), "");

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "message": "logged_out" }));

    assert!(matches!(
        ctx.validator.validate(&token).await,
        Err(AuthError::RevokedToken)
    ));

    // Second logout is a no-op success
    let req = test::TestRequest::delete()
        .uri("/api/v1/auth/logout")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_logout_with_cookie() {
    let ctx = context();
    let app = app!(ctx.state);

    let resp = login!(app, ALICE_EMAIL, ALICE_PASSWORD);
    let body: Value = test::read_body_json(resp).await;
    let token = body["access_token"].as_str().unwrap().to_string();

    let req = test::TestRequest::delete()
        .uri("/api/v1/auth/logout")
        .cookie(Cookie::new("access_token", token.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    assert!(matches!(
        ctx.validator.validate(&token).await,
        Err(AuthError::RevokedToken)
    ));
}

#[actix_web::test]
async fn test_logout_requires_token() {
    let ctx = context();
    let app = app!(ctx.state);

    let req = test::TestRequest::delete().uri("/api/v1/auth/logout").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "missing_token");

    let req = test::TestRequest::delete()
        .uri("/api/v1/auth/logout")
        .insert_header(("Authorization", "Bearer not.a.token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_token");
}

#[actix_web::test]
async fn test_logout_during_store_outage_is_unavailable() {
    let ctx = context();
    let app = app!(ctx.state);

    let resp = login!(app, ALICE_EMAIL, ALICE_PASSWORD);
    let body: Value = test::read_body_json(resp).await;
    let token = body["access_token"].as_str().unwrap().to_string();

    ctx.store.set_available(false);

    let req = test::TestRequest::delete()
        .uri("/api/v1/auth/logout")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "service_unavailable");
}

#[actix_web::test]
async fn test_throttle_outage_follows_failure_mode() {
    let open = context_with_modes(FailureMode::FailClosed, FailureMode::FailOpen);
    open.store.set_available(false);
    let app = app!(open.state);
    let resp = login!(app, ALICE_EMAIL, ALICE_PASSWORD);
    assert_eq!(resp.status(), StatusCode::OK);

    let closed = context_with_modes(FailureMode::FailClosed, FailureMode::FailClosed);
    closed.store.set_available(false);
    let app = app!(closed.state);
    let resp = login!(app, ALICE_EMAIL, ALICE_PASSWORD);
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[actix_web::test]
async fn test_health_and_metrics() {
    let ctx = context();
    let app = app!(ctx.state);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(test::read_body(resp).await, web::Bytes::from_static(b"OK"));

    auth_service::metrics::initialize_auth_metrics();
    let req = test::TestRequest::get().uri("/metrics").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert!(String::from_utf8_lossy(&body).contains("login_requests_total"));
}

async fn whoami(user: AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().body(user.user_id)
}

/// A downstream service sharing the validator stops honoring a token as
/// soon as it is logged out here.
#[actix_web::test]
async fn test_downstream_middleware_sees_logout() {
    let ctx = context();
    let app = app!(ctx.state);
    let downstream = test::init_service(
        App::new()
            .wrap(JwtAuthMiddleware::new(ctx.validator.clone()))
            .route("/api/me", web::get().to(whoami)),
    )
    .await;

    let resp = login!(app, ALICE_EMAIL, ALICE_PASSWORD);
    let body: Value = test::read_body_json(resp).await;
    let token = body["access_token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/me")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&downstream, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(test::read_body(resp).await, web::Bytes::from(ALICE_ID.to_string()));

    let req = test::TestRequest::delete()
        .uri("/api/v1/auth/logout")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/me")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let err = test::try_call_service(&downstream, req).await.err().unwrap();
    let resp = err.error_response();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
