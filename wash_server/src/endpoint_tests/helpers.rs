use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use chrono::Duration;
use log::debug;
use serde_json::Value;
use wash_common::Secret;
use wash_engine::db_types::Role;

use crate::{
    auth::{TokenIssuer, TokenVerifier},
    config::AuthConfig,
    middleware::JwtAuthMiddlewareFactory,
};

// Creates a test `AuthConfig` for issuing tokens. DO NOT re-use this secret anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: Secret::new("do-not-use-this-endpoint-test-secret-anywhere-else"),
        token_lifetime: Duration::hours(24),
    }
}

pub fn issue_token(user_id: i64, name: &str, role: Role) -> String {
    TokenIssuer::new(&get_auth_config()).issue_token(user_id, name, role).expect("Failed to sign token")
}

pub fn issue_expired_token(user_id: i64, name: &str, role: Role) -> String {
    let config = AuthConfig { token_lifetime: Duration::hours(-2), ..get_auth_config() };
    TokenIssuer::new(&config).issue_token(user_id, name, role).expect("Failed to sign token")
}

/// Build the app the way the server does (bearer middleware around everything the configure
/// closure registers) and run one request against it. Handler and middleware errors surface on
/// the `Err` side with their display message, successful responses as `(status, body)`.
async fn run_request(
    req: TestRequest,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let verifier = TokenVerifier::new(&get_auth_config());
    let app = App::new().wrap(JwtAuthMiddlewareFactory::new(verifier)).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req.to_request()).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}

fn with_auth(mut req: TestRequest, token: &str) -> TestRequest {
    if !token.is_empty() {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    req
}

pub async fn get_request(
    token: &str,
    path: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    run_request(with_auth(TestRequest::get().uri(path), token), configure).await
}

pub async fn post_request(
    token: &str,
    path: &str,
    body: Value,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    run_request(with_auth(TestRequest::post().uri(path).set_json(body), token), configure).await
}

pub async fn put_request(
    token: &str,
    path: &str,
    body: Value,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    run_request(with_auth(TestRequest::put().uri(path).set_json(body), token), configure).await
}

/// Run a raw-body request against the webhook scope, with the HMAC middleware in place exactly
/// as the server mounts it.
pub async fn post_webhook(
    body: &[u8],
    signature: Option<&str>,
    secret: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let mut req = TestRequest::post()
        .uri("/payments/webhook")
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body.to_vec());
    if let Some(sig) = signature {
        req = req.insert_header((cardgate::SIGNATURE_HEADER, sig));
    }
    let scope = web::scope("/payments")
        .wrap(crate::middleware::HmacMiddlewareFactory::new(cardgate::SIGNATURE_HEADER, Secret::new(secret), true))
        .configure(configure);
    let app = App::new().service(scope);
    let service = test::init_service(app).await;
    let (_, res) = test::try_call_service(&service, req.to_request()).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}
