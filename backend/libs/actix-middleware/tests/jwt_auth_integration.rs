use actix_middleware::{AuthenticatedUser, JwtAuthMiddleware};
use actix_web::{cookie::Cookie, test, web, App, HttpResponse};
use jwt_security::{
    FailureMode, InMemoryStore, RevocationLedger, Role, SigningSecret, TokenSigner,
    TokenValidator, TokenVerifier,
};
use std::sync::Arc;
use std::time::Duration;

const SECRET: &str = "Qm7vT2xWp9LrK4sZn8YbHc3JdF6gAe5U";

/// Echo the authenticated identity
async fn whoami(user: AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().body(format!("{}:{}", user.user_id, user.role))
}

fn setup(mode: FailureMode) -> (TokenSigner, Arc<TokenValidator>, InMemoryStore) {
    let secret = SigningSecret::new(SECRET).unwrap();
    let store = InMemoryStore::new();
    let validator = TokenValidator::new(
        TokenVerifier::new(&secret),
        RevocationLedger::new(Arc::new(store.clone())),
        mode,
    );
    (TokenSigner::new(&secret), Arc::new(validator), store)
}

#[actix_web::test]
async fn test_valid_bearer_token() {
    let (signer, validator, _) = setup(FailureMode::FailClosed);
    let issued = signer
        .issue("u1", Role::Employee, Duration::from_secs(60))
        .unwrap();

    let app = test::init_service(
        App::new()
            .wrap(JwtAuthMiddleware::new(validator))
            .route("/me", web::get().to(whoami)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/me")
        .insert_header(("Authorization", format!("Bearer {}", issued.token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body = test::read_body(resp).await;
    assert_eq!(body, web::Bytes::from_static(b"u1:employee"));
}

#[actix_web::test]
async fn test_cookie_token() {
    let (signer, validator, _) = setup(FailureMode::FailClosed);
    let issued = signer.issue("u1", Role::Admin, Duration::from_secs(60)).unwrap();

    let app = test::init_service(
        App::new()
            .wrap(JwtAuthMiddleware::new(validator))
            .route("/me", web::get().to(whoami)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/me")
        .cookie(Cookie::new("access_token", issued.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
}

#[actix_web::test]
async fn test_missing_token() {
    let (_, validator, _) = setup(FailureMode::FailClosed);

    let app = test::init_service(
        App::new()
            .wrap(JwtAuthMiddleware::new(validator))
            .route("/me", web::get().to(whoami)),
    )
    .await;

    let req = test::TestRequest::get().uri("/me").to_request();
    let resp = test::try_call_service(&app, req).await;
    let err = resp.err().expect("missing token must be rejected");
    let resp = err.error_response();
    assert_eq!(resp.status(), 401);

    let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "missing_token");
    assert_eq!(json["status"], 401);
}

#[actix_web::test]
async fn test_revoked_token_rejected() {
    let (signer, validator, _) = setup(FailureMode::FailClosed);
    let issued = signer
        .issue("u1", Role::Employee, Duration::from_secs(60))
        .unwrap();
    validator.ledger().revoke_claims(&issued.claims).await.unwrap();

    let app = test::init_service(
        App::new()
            .wrap(JwtAuthMiddleware::new(validator))
            .route("/me", web::get().to(whoami)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/me")
        .insert_header(("Authorization", format!("Bearer {}", issued.token)))
        .to_request();
    let err = test::try_call_service(&app, req).await.err().unwrap();
    let resp = err.error_response();
    assert_eq!(resp.status(), 401);

    let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "revoked_token");
}

#[actix_web::test]
async fn test_store_outage_fail_closed_rejects() {
    let (signer, validator, store) = setup(FailureMode::FailClosed);
    let issued = signer
        .issue("u1", Role::Employee, Duration::from_secs(60))
        .unwrap();
    store.set_available(false);

    let app = test::init_service(
        App::new()
            .wrap(JwtAuthMiddleware::new(validator))
            .route("/me", web::get().to(whoami)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/me")
        .insert_header(("Authorization", format!("Bearer {}", issued.token)))
        .to_request();
    let err = test::try_call_service(&app, req).await.err().unwrap();
    assert_eq!(err.error_response().status(), 401);
}

#[actix_web::test]
async fn test_extractor_without_middleware() {
    let app = test::init_service(App::new().route("/me", web::get().to(whoami))).await;

    let req = test::TestRequest::get().uri("/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}
