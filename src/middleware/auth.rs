// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session cookie authentication.
//!
//! A signed-in user carries an HS256 JWT in the `ramadan_session` cookie
//! (or an `Authorization: Bearer` header). Protected pages redirect anyone
//! without a valid session to `/auth`. Logging out revokes the token, so a
//! copy kept outside the cookie stops working too.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use dashmap::DashMap;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;

pub const SESSION_COOKIE: &str = "ramadan_session";
const SESSION_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    /// Token id, the handle used to revoke it
    pub jti: String,
}

/// Authenticated user extracted from the session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
    pub session_id: String,
    pub expires_at: usize,
}

/// Session tokens revoked by logout, kept until they would have expired.
#[derive(Debug, Default)]
pub struct RevokedSessions {
    revoked: DashMap<String, usize>,
}

impl RevokedSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revoke(&self, user: &AuthUser) {
        let now = unix_now();
        self.revoked.retain(|_, expires_at| *expires_at > now);
        self.revoked
            .insert(user.session_id.clone(), user.expires_at);
    }

    pub fn is_revoked(&self, session_id: &str) -> bool {
        self.revoked.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.revoked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revoked.is_empty()
    }
}

fn unix_now() -> usize {
    chrono::Utc::now().timestamp().max(0) as usize
}

fn session_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Validate a session token and return its user.
pub fn verify_session(token: &str, signing_key: &[u8]) -> Result<AuthUser, AppError> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let claims = decode::<Claims>(token, &key, &validation)
        .map_err(|_| AppError::InvalidToken)?
        .claims;
    if claims.sub.is_empty() || claims.jti.is_empty() {
        return Err(AppError::InvalidToken);
    }

    Ok(AuthUser {
        user_id: claims.sub,
        session_id: claims.jti,
        expires_at: claims.exp,
    })
}

fn authenticate(jar: &CookieJar, headers: &HeaderMap, state: &AppState) -> Option<AuthUser> {
    let token = session_token(jar, headers)?;
    match verify_session(&token, &state.config.jwt_signing_key) {
        Ok(user) if state.revoked_sessions.is_revoked(&user.session_id) => {
            tracing::debug!(user_id = %user.user_id, "Ignoring revoked session token");
            None
        }
        Ok(user) => Some(user),
        Err(_) => {
            tracing::debug!("Ignoring invalid session token");
            None
        }
    }
}

/// Middleware for pages that need a signed-in user.
///
/// Without a valid session the request never reaches the handler; the
/// client is sent to `/auth` with `303 See Other`.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&jar, request.headers(), &state) {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => Redirect::to("/auth").into_response(),
    }
}

/// Session of the caller, if any. For pages that render for everyone.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthUser>);

impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        Ok(MaybeUser(authenticate(&jar, &parts.headers, state)))
    }
}

/// Create a JWT for a user session.
pub fn create_jwt(user_id: &str, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    let mut jti = [0u8; 16];
    SystemRandom::new()
        .fill(&mut jti)
        .map_err(|_| anyhow::anyhow!("system RNG failure"))?;

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now as usize,
        exp: (now + SESSION_TTL_SECS) as usize,
        jti: URL_SAFE_NO_PAD.encode(jti),
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Cookies are marked `Secure` unless the frontend is served over plain HTTP.
fn secure_cookies(frontend_url: &str) -> bool {
    !frontend_url.starts_with("http://")
}

/// Session cookie carrying `token`.
pub fn session_cookie(token: String, frontend_url: &str) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure_cookies(frontend_url))
        .max_age(time::Duration::seconds(SESSION_TTL_SECS as i64))
        .build()
}

/// Removal cookie for the session, with the same attributes it was set with.
pub fn clear_session_cookie(frontend_url: &str) -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure_cookies(frontend_url))
        .build();
    cookie.make_removal();
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"test_jwt_key_32_bytes_minimum!!";

    #[test]
    fn test_create_then_verify() {
        let token = create_jwt("user-1", KEY).unwrap();
        let user = verify_session(&token, KEY).unwrap();
        assert_eq!(user.user_id, "user-1");
        assert!(!user.session_id.is_empty());

        let again = verify_session(&create_jwt("user-1", KEY).unwrap(), KEY).unwrap();
        assert_ne!(again.session_id, user.session_id);
    }

    #[test]
    fn test_revoke_keeps_only_live_sessions() {
        let revoked = RevokedSessions::new();
        let stale = AuthUser {
            user_id: "user-1".to_string(),
            session_id: "old".to_string(),
            expires_at: unix_now() - 1,
        };
        let live = AuthUser {
            user_id: "user-1".to_string(),
            session_id: "new".to_string(),
            expires_at: unix_now() + 60,
        };

        revoked.revoke(&stale);
        assert!(revoked.is_revoked("old"));
        revoked.revoke(&live);
        assert!(revoked.is_revoked("new"));
        assert!(!revoked.is_revoked("old"));
        assert_eq!(revoked.len(), 1);
    }

    #[test]
    fn test_wrong_key_rejected() {
        let token = create_jwt("user-1", KEY).unwrap();
        assert!(matches!(
            verify_session(&token, b"some_other_key_of_similar_size!"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_bearer_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer abc".parse().unwrap());
        let jar = CookieJar::from_headers(&headers);
        assert_eq!(session_token(&jar, &headers).as_deref(), Some("abc"));

        headers.insert(header::COOKIE, "ramadan_session=xyz".parse().unwrap());
        let jar = CookieJar::from_headers(&headers);
        assert_eq!(session_token(&jar, &headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn test_cookie_attributes() {
        let local = session_cookie("t".to_string(), "http://localhost:5173").to_string();
        assert!(local.contains("HttpOnly"));
        assert!(local.contains("SameSite=Lax"));
        assert!(!local.contains("Secure"));

        let prod = clear_session_cookie("https://ramadan.example.org").to_string();
        assert!(prod.contains("Secure"));
        assert!(prod.contains("Max-Age=0"));
    }
}
