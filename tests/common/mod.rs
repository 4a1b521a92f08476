// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use ramadan_tracker::config::Config;
use ramadan_tracker::db::{Document, DocumentStore, FirestoreDb, MemoryStore};
use ramadan_tracker::error::AppError;
use ramadan_tracker::middleware::auth::{create_jwt, SESSION_COOKIE};
use ramadan_tracker::routes::create_router;
use ramadan_tracker::services::{AuthService, GoogleIdTokenVerifier, StoreIdentityProvider};
use ramadan_tracker::{AppState, Clock};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const GOOGLE_CLIENT_ID: &str = "test-client.apps.googleusercontent.com";
pub const GOOGLE_KID: &str = "test-kid";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Store wrapper whose reads and writes can be made to fail on demand.
#[allow(dead_code)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
}

#[allow(dead_code)]
impl FlakyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    fn check(flag: &AtomicBool) -> Result<(), AppError> {
        if flag.load(Ordering::SeqCst) {
            return Err(AppError::Database("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>, AppError> {
        Self::check(&self.fail_reads)?;
        self.inner.list(collection).await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        Self::check(&self.fail_reads)?;
        self.inner.get(collection, id).await
    }

    async fn put(&self, collection: &str, id: &str, fields: &Document) -> Result<(), AppError> {
        Self::check(&self.fail_writes)?;
        self.inner.put(collection, id, fields).await
    }
}

/// Options for building a test app.
#[derive(Default)]
#[allow(dead_code)]
pub struct TestApp {
    pub config: Option<Config>,
    pub store: Option<Arc<dyn DocumentStore>>,
    pub clock: Option<Clock>,
    pub google: bool,
}

#[allow(dead_code)]
impl TestApp {
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn now(mut self, now: DateTime<Utc>) -> Self {
        self.clock = Some(Arc::new(move || now));
        self
    }

    pub fn with_google(mut self) -> Self {
        self.google = true;
        self
    }

    /// Returns the router and the shared state.
    pub fn build(self) -> (axum::Router, Arc<AppState>) {
        let mut config = self.config.unwrap_or_else(Config::test_default);
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn DocumentStore>);

        let google = if self.google {
            config.google_client_id = Some(GOOGLE_CLIENT_ID.to_string());
            Some(Arc::new(test_google_verifier()))
        } else {
            None
        };
        let auth: Arc<dyn AuthService> = Arc::new(StoreIdentityProvider::new(store.clone(), google));

        let mut state = AppState::new(config, store, auth.clone());
        if let Some(clock) = self.clock {
            state = state.with_clock(clock);
        }
        let state = Arc::new(state);
        state.trackers.evict_on_sign_out(auth.subscribe());

        (create_router(state.clone()), state)
    }
}

/// Create a test app backed by an empty in-memory store.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    TestApp::default().build()
}

/// Create a test app whose cookies follow `frontend_url`.
#[allow(dead_code)]
pub fn create_test_app_with_frontend_url(frontend_url: &str) -> (axum::Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.frontend_url = frontend_url.to_string();
    TestApp::default().config(config).build()
}

/// `Cookie` header value holding a valid session for `user_id`.
#[allow(dead_code)]
pub fn session_cookie_for(user_id: &str) -> String {
    let key = Config::test_default().jwt_signing_key;
    let jwt = create_jwt(user_id, &key).expect("JWT creation failed");
    format!("{SESSION_COOKIE}={jwt}")
}

/// Pull the session cookie value out of a response's `Set-Cookie` headers.
#[allow(dead_code)]
pub fn session_from_response(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{SESSION_COOKIE}=")))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

#[allow(dead_code)]
pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

#[allow(dead_code)]
pub fn post_json(uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[allow(dead_code)]
pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Schedule document for one day.
#[allow(dead_code)]
pub fn schedule_doc(date: &str, sehri_end: &str, iftar: &str) -> Document {
    let value = json!({
        "Date": date,
        "SehriEnd": sehri_end,
        "Iftar": iftar,
        "Fajr": "05:00",
        "Dhuhr": "12:15",
        "Asr": "15:45",
        "Maghrib": iftar,
        "Isha": "19:30",
    });
    serde_json::from_value(value).unwrap()
}

#[allow(dead_code)]
pub fn doc(value: Value) -> Document {
    serde_json::from_value(value).unwrap()
}

#[allow(dead_code)]
pub fn test_google_verifier() -> GoogleIdTokenVerifier {
    let public_pem = include_bytes!("../fixtures/google_test_key.pub.pem");
    let key = DecodingKey::from_rsa_pem(public_pem).expect("valid test public key");
    GoogleIdTokenVerifier::new_with_static_key(GOOGLE_CLIENT_ID, GOOGLE_KID, key)
        .expect("static verifier")
}

/// Mint a Google-style ID token signed with the test key.
#[allow(dead_code)]
pub fn google_id_token(subject: &str, email: &str, email_verified: bool) -> String {
    let private_pem = include_bytes!("../fixtures/google_test_key.pem");
    let key = EncodingKey::from_rsa_pem(private_pem).expect("valid test private key");
    let now = Utc::now().timestamp();
    let claims = json!({
        "iss": "https://accounts.google.com",
        "aud": GOOGLE_CLIENT_ID,
        "sub": subject,
        "email": email,
        "email_verified": email_verified,
        "name": "Test Google User",
        "iat": now,
        "exp": now + 3600,
    });
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(GOOGLE_KID.to_string());
    encode(&header, &claims, &key).expect("token signing")
}
