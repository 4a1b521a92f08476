// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session JWT tests.
//!
//! These tests verify that session tokens issued at sign-in are accepted by
//! the session middleware, and that tampered or foreign tokens are not.

use axum::http::{header, StatusCode};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use ramadan_tracker::config::Config;
use ramadan_tracker::middleware::auth::{create_jwt, verify_session};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower::ServiceExt;

mod common;

/// Claims structure that must match what the middleware expects.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
    iat: usize,
    jti: String,
}

fn now_secs() -> usize {
    chrono::Utc::now().timestamp() as usize
}

#[test]
fn test_jwt_roundtrip() {
    let signing_key = b"test_signing_key_32_bytes_long!!";
    let token = create_jwt("user-abc", signing_key).expect("Failed to create JWT");

    let key = DecodingKey::from_secret(signing_key);
    let token_data = decode::<Claims>(&token, &key, &Validation::new(Algorithm::HS256))
        .expect("Failed to decode JWT - check Claims struct compatibility");

    assert_eq!(token_data.claims.sub, "user-abc");
    assert!(token_data.claims.exp > token_data.claims.iat);
    assert_eq!(verify_session(&token, signing_key).unwrap().user_id, "user-abc");
}

#[test]
fn test_jwt_expiration_is_future() {
    let signing_key = b"test_signing_key_32_bytes_long!!";
    let token = create_jwt("user-abc", signing_key).unwrap();

    let key = DecodingKey::from_secret(signing_key);
    let token_data = decode::<Claims>(&token, &key, &Validation::new(Algorithm::HS256)).unwrap();

    assert!(
        token_data.claims.exp > now_secs() + 86400 * 29,
        "Token expiration should be ~30 days in the future"
    );
}

#[test]
fn test_jwt_rejects_other_key_and_expired_tokens() {
    let token = create_jwt("user-abc", b"one_signing_key_32_bytes_long!!!").unwrap();
    assert!(verify_session(&token, b"another_key_32_bytes_long_here!!").is_err());

    let expired = encode(
        &Header::new(Algorithm::HS256),
        &Claims {
            sub: "user-abc".to_string(),
            exp: now_secs() - 3600,
            iat: now_secs() - 7200,
            jti: "expired-session".to_string(),
        },
        &EncodingKey::from_secret(b"one_signing_key_32_bytes_long!!!"),
    )
    .unwrap();
    assert!(verify_session(&expired, b"one_signing_key_32_bytes_long!!!").is_err());
}

#[tokio::test]
async fn test_bearer_token_accepted() {
    let (app, _) = common::create_test_app();
    let token = create_jwt("bearer-user", &Config::test_default().jwt_signing_key).unwrap();

    let mut request = common::get("/daily-tracker", None);
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {token}").parse().unwrap(),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_garbage_cookie_redirects_to_auth() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(common::get("/daily-tracker", Some("ramadan_session=not-a-jwt")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/auth");
}

#[tokio::test]
async fn test_logged_out_token_rejected_as_bearer() {
    let (app, state) = common::create_test_app();
    let key = Config::test_default().jwt_signing_key;
    let token = create_jwt("bearer-user", &key).unwrap();
    let bearer = |token: &str| {
        let mut request = common::get("/daily-tracker", None);
        request.headers_mut().insert(
            header::AUTHORIZATION,
            format!("Bearer {token}").parse().unwrap(),
        );
        request
    };

    let response = app.clone().oneshot(bearer(&token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = format!("ramadan_session={token}");
    let response = app
        .clone()
        .oneshot(common::post_json("/auth/logout", Some(&cookie), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(state.revoked_sessions.len(), 1);

    // The cookie is gone, and the same token sent as a bearer is refused.
    let response = app.clone().oneshot(bearer(&token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    // Signing in again issues a new token that works.
    let fresh = create_jwt("bearer-user", &key).unwrap();
    let response = app.oneshot(bearer(&fresh)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
