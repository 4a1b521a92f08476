// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-up, sign-in, and sign-out routes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::{Validate, ValidationErrors};

use crate::error::{AppError, Result};
use crate::middleware::auth::{clear_session_cookie, create_jwt, session_cookie};
use crate::middleware::MaybeUser;
use crate::models::UserProfile;
use crate::services::identity::{AuthErrorCode, MIN_PASSWORD_LEN};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth", get(auth_page))
        .route("/auth/signup", post(sign_up))
        .route("/auth/login", post(log_in))
        .route("/auth/google", post(google_sign_in))
        .route("/auth/logout", post(logout))
}

#[derive(Debug, Serialize)]
pub struct AuthPage {
    pub google_enabled: bool,
    pub min_password_length: usize,
}

/// Auth page options; users who are already signed in go to the dashboard.
async fn auth_page(State(state): State<Arc<AppState>>, MaybeUser(user): MaybeUser) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }
    Json(AuthPage {
        google_enabled: state.config.google_client_id.is_some(),
        min_password_length: MIN_PASSWORD_LEN,
    })
    .into_response()
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub display_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LogInRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct GoogleSignInRequest {
    #[serde(default)]
    pub id_token: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: UserProfile,
}

/// Map request validation failures onto identity error codes, checking
/// fields in the order the form shows them.
fn validation_code(errors: &ValidationErrors) -> AuthErrorCode {
    let fields = errors.field_errors();
    if fields.contains_key("display_name") {
        AuthErrorCode::MissingDisplayName
    } else if fields.contains_key("email") {
        AuthErrorCode::InvalidEmail
    } else if fields.contains_key("password") {
        AuthErrorCode::WeakPassword
    } else {
        AuthErrorCode::InvalidCredential
    }
}

/// Issue a session cookie for a freshly authenticated user.
fn start_session(
    state: &AppState,
    jar: CookieJar,
    user: UserProfile,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let jwt = create_jwt(&user.id, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;
    let jar = jar.add(session_cookie(jwt, &state.config.frontend_url));
    Ok((jar, Json(SessionResponse { user })))
}

async fn sign_up(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<SignUpRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    req.validate().map_err(|e| validation_code(&e))?;

    let user = state
        .auth
        .sign_up(&req.email, &req.password, &req.display_name)
        .await?;
    start_session(&state, jar, user)
}

async fn log_in(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<LogInRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    if let Err(e) = req.validate() {
        // Only a malformed email is reported specifically
        let code = match validation_code(&e) {
            AuthErrorCode::InvalidEmail => AuthErrorCode::InvalidEmail,
            _ => AuthErrorCode::InvalidCredential,
        };
        return Err(code.into());
    }

    let user = state.auth.sign_in(&req.email, &req.password).await?;
    start_session(&state, jar, user)
}

async fn google_sign_in(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<GoogleSignInRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let user = state.auth.sign_in_with_google(&req.id_token).await?;
    start_session(&state, jar, user)
}

/// Sign out: revoke the token, announce it, and clear the session cookie.
async fn logout(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
) -> (CookieJar, StatusCode) {
    if let Some(user) = user {
        state.revoked_sessions.revoke(&user);
        state.auth.sign_out(&user.user_id).await;
    }
    let jar = jar.add(clear_session_cookie(&state.config.frontend_url));
    (jar, StatusCode::NO_CONTENT)
}
