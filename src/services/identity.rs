// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider: email/password and Google sign-in.
//!
//! [`AuthService`] is the seam the routes talk to. [`StoreIdentityProvider`]
//! implements it on top of the document store: password accounts are
//! PBKDF2-hashed, Google accounts are keyed by the verified email, and every
//! sign-in or sign-out is announced on a broadcast channel.

use crate::db::{collections, decode, encode, DocumentStore};
use crate::error::AppError;
use crate::models::{Account, AuthProvider, UserProfile};
use crate::services::google_oidc::{GoogleIdTokenVerifier, GoogleIdentity, OidcError};
use crate::time_utils::format_utc_rfc3339;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};
use ring::{digest, pbkdf2};
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, Mutex, OwnedMutexGuard};
use validator::ValidateEmail;

pub const MIN_PASSWORD_LEN: usize = 6;
const PBKDF2_ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = digest::SHA256_OUTPUT_LEN;

/// Failed sign-ins allowed per email within [`THROTTLE_WINDOW`].
pub const MAX_FAILED_ATTEMPTS: u32 = 5;
pub const THROTTLE_WINDOW: Duration = Duration::from_secs(15 * 60);
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Identity provider error codes and the text shown for each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthErrorCode {
    EmailAlreadyInUse,
    InvalidEmail,
    WeakPassword,
    MissingDisplayName,
    UserNotFound,
    WrongPassword,
    InvalidCredential,
    TooManyRequests,
    PopupClosedByUser,
    NetworkRequestFailed,
    /// Any code without a dedicated message.
    Other(String),
}

impl AuthErrorCode {
    pub fn code(&self) -> &str {
        match self {
            AuthErrorCode::EmailAlreadyInUse => "auth/email-already-in-use",
            AuthErrorCode::InvalidEmail => "auth/invalid-email",
            AuthErrorCode::WeakPassword => "auth/weak-password",
            AuthErrorCode::MissingDisplayName => "auth/missing-display-name",
            AuthErrorCode::UserNotFound => "auth/user-not-found",
            AuthErrorCode::WrongPassword => "auth/wrong-password",
            AuthErrorCode::InvalidCredential => "auth/invalid-credential",
            AuthErrorCode::TooManyRequests => "auth/too-many-requests",
            AuthErrorCode::PopupClosedByUser => "auth/popup-closed-by-user",
            AuthErrorCode::NetworkRequestFailed => "auth/network-request-failed",
            AuthErrorCode::Other(code) => code,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            AuthErrorCode::EmailAlreadyInUse => "This email is already registered. Try logging in.",
            AuthErrorCode::InvalidEmail => "Please enter a valid email address.",
            AuthErrorCode::WeakPassword => "Password should be at least 6 characters.",
            AuthErrorCode::MissingDisplayName => "Please enter your name.",
            AuthErrorCode::UserNotFound => "No account found with this email.",
            AuthErrorCode::WrongPassword => "Incorrect password. Please try again.",
            AuthErrorCode::InvalidCredential => "Invalid email or password.",
            AuthErrorCode::TooManyRequests => "Too many attempts. Please try again later.",
            AuthErrorCode::PopupClosedByUser => "Google sign-in was cancelled.",
            AuthErrorCode::NetworkRequestFailed => "Network error. Check your connection.",
            AuthErrorCode::Other(_) => "Something went wrong. Please try again.",
        }
    }

    /// Parse a provider code string. Unrecognized codes become `Other`.
    pub fn from_code(code: &str) -> Self {
        match code {
            "auth/email-already-in-use" => AuthErrorCode::EmailAlreadyInUse,
            "auth/invalid-email" => AuthErrorCode::InvalidEmail,
            "auth/weak-password" => AuthErrorCode::WeakPassword,
            "auth/missing-display-name" => AuthErrorCode::MissingDisplayName,
            "auth/user-not-found" => AuthErrorCode::UserNotFound,
            "auth/wrong-password" => AuthErrorCode::WrongPassword,
            "auth/invalid-credential" => AuthErrorCode::InvalidCredential,
            "auth/too-many-requests" => AuthErrorCode::TooManyRequests,
            "auth/popup-closed-by-user" => AuthErrorCode::PopupClosedByUser,
            "auth/network-request-failed" => AuthErrorCode::NetworkRequestFailed,
            other => AuthErrorCode::Other(other.to_string()),
        }
    }
}

/// Identity change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn { user_id: String },
    SignedOut { user_id: String },
}

/// Operations the application needs from an identity provider.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<UserProfile, AppError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<UserProfile, AppError>;

    /// Federated sign-in with a Google ID token.
    async fn sign_in_with_google(&self, id_token: &str) -> Result<UserProfile, AppError>;

    async fn sign_out(&self, user_id: &str);

    async fn current_user(&self, user_id: &str) -> Result<Option<UserProfile>, AppError>;

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;
}

#[derive(Debug, Clone, Copy)]
struct FailureWindow {
    count: u32,
    started: Instant,
}

/// [`AuthService`] backed by the document store.
pub struct StoreIdentityProvider {
    store: Arc<dyn DocumentStore>,
    google: Option<Arc<GoogleIdTokenVerifier>>,
    rng: SystemRandom,
    failures: DashMap<String, FailureWindow>,
    last_prune: StdMutex<Instant>,
    /// Serializes account creation and linking per normalized email.
    email_locks: DashMap<String, Arc<Mutex<()>>>,
    events: broadcast::Sender<SessionEvent>,
}

/// Held while an email's account is looked up and written.
struct EmailLock {
    handle: Arc<Mutex<()>>,
    guard: OwnedMutexGuard<()>,
}

impl StoreIdentityProvider {
    pub fn new(store: Arc<dyn DocumentStore>, google: Option<Arc<GoogleIdTokenVerifier>>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            google,
            rng: SystemRandom::new(),
            failures: DashMap::new(),
            last_prune: StdMutex::new(Instant::now()),
            email_locks: DashMap::new(),
            events,
        }
    }

    fn random_bytes<const N: usize>(&self) -> Result<[u8; N], AppError> {
        let mut buf = [0u8; N];
        self.rng
            .fill(&mut buf)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("system RNG failure")))?;
        Ok(buf)
    }

    async fn find_account(&self, email: &str) -> Result<Option<Account>, AppError> {
        self.store
            .get(collections::ACCOUNTS, &account_id(email))
            .await?
            .map(decode::<Account>)
            .transpose()
    }

    async fn load_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        self.store
            .get(collections::USERS, user_id)
            .await?
            .map(decode::<UserProfile>)
            .transpose()
    }

    async fn save_account(&self, account: &Account) -> Result<(), AppError> {
        self.store
            .put(collections::ACCOUNTS, &account_id(&account.email), &encode(account)?)
            .await
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), AppError> {
        self.store
            .put(collections::USERS, &profile.id, &encode(profile)?)
            .await
    }

    async fn create_account(
        &self,
        email: &str,
        display_name: Option<String>,
        photo_url: Option<String>,
        credential: Credential,
    ) -> Result<UserProfile, AppError> {
        let now = format_utc_rfc3339(Utc::now());
        let user_id = URL_SAFE_NO_PAD.encode(self.random_bytes::<16>()?);

        let (provider, password_salt, password_hash, google_subject) = match credential {
            Credential::Password { salt, hash } => {
                (AuthProvider::Password, Some(salt), Some(hash), None)
            }
            Credential::Google { subject } => (AuthProvider::Google, None, None, Some(subject)),
        };

        let profile = UserProfile {
            id: user_id.clone(),
            display_name,
            email: email.to_string(),
            photo_url,
        };
        let account = Account {
            user_id,
            email: email.to_string(),
            provider,
            password_salt,
            password_hash,
            google_subject,
            created_at: now.clone(),
            last_sign_in: now,
        };

        self.save_profile(&profile).await?;
        self.save_account(&account).await?;
        Ok(profile)
    }

    async fn touch_and_profile(&self, mut account: Account) -> Result<UserProfile, AppError> {
        account.last_sign_in = format_utc_rfc3339(Utc::now());
        self.save_account(&account).await?;

        match self.load_profile(&account.user_id).await? {
            Some(profile) => Ok(profile),
            None => {
                tracing::warn!(user_id = %account.user_id, "Account without profile, recreating");
                let profile = UserProfile {
                    id: account.user_id.clone(),
                    display_name: None,
                    email: account.email.clone(),
                    photo_url: None,
                };
                self.save_profile(&profile).await?;
                Ok(profile)
            }
        }
    }

    async fn lock_email(&self, email: &str) -> EmailLock {
        let handle = self
            .email_locks
            .entry(email.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = handle.clone().lock_owned().await;
        EmailLock { handle, guard }
    }

    fn unlock_email(&self, email: &str, lock: EmailLock) {
        let EmailLock { handle, guard } = lock;
        drop(guard);
        // Map entry plus our handle; anyone waiting holds another reference.
        self.email_locks
            .remove_if(email, |_, l| Arc::ptr_eq(l, &handle) && Arc::strong_count(l) == 2);
    }

    /// Count a sign-in attempt against the email's window before any
    /// credential is checked. A successful sign-in clears the window.
    fn begin_attempt(&self, email: &str) -> Result<(), AuthErrorCode> {
        self.prune_failures(Instant::now());

        let mut window = self.failures.entry(email.to_string()).or_insert(FailureWindow {
            count: 0,
            started: Instant::now(),
        });
        if window.started.elapsed() >= THROTTLE_WINDOW {
            *window = FailureWindow {
                count: 0,
                started: Instant::now(),
            };
        }
        if window.count >= MAX_FAILED_ATTEMPTS {
            tracing::warn!(email = %email, "Sign-in throttled");
            return Err(AuthErrorCode::TooManyRequests);
        }
        window.count += 1;
        Ok(())
    }

    /// Drop windows that have expired, at most once per [`PRUNE_INTERVAL`].
    fn prune_failures(&self, now: Instant) {
        let Ok(mut last) = self.last_prune.try_lock() else {
            return;
        };
        if now.saturating_duration_since(*last) < PRUNE_INTERVAL {
            return;
        }
        *last = now;
        self.failures
            .retain(|_, window| now.saturating_duration_since(window.started) < THROTTLE_WINDOW);
    }

    /// Link or create the account for a verified Google identity. Callers
    /// hold the email lock.
    async fn google_account(
        &self,
        email: &str,
        identity: GoogleIdentity,
    ) -> Result<UserProfile, AppError> {
        match self.find_account(email).await? {
            Some(mut account) => {
                if account.google_subject.is_none() {
                    tracing::info!(user_id = %account.user_id, "Linking Google identity to account");
                    account.google_subject = Some(identity.subject.clone());
                } else if account.google_subject.as_deref() != Some(identity.subject.as_str()) {
                    return Err(AuthErrorCode::InvalidCredential.into());
                }
                self.touch_and_profile(account).await
            }
            None => {
                let profile = self
                    .create_account(
                        email,
                        identity.name,
                        identity.picture,
                        Credential::Google {
                            subject: identity.subject,
                        },
                    )
                    .await?;
                tracing::info!(user_id = %profile.id, "Account created from Google sign-in");
                Ok(profile)
            }
        }
    }

    fn signed_in(&self, profile: &UserProfile) {
        tracing::info!(user_id = %profile.id, "User signed in");
        // No receivers is fine
        let _ = self.events.send(SessionEvent::SignedIn {
            user_id: profile.id.clone(),
        });
    }
}

enum Credential {
    Password { salt: String, hash: String },
    Google { subject: String },
}

#[async_trait]
impl AuthService for StoreIdentityProvider {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<UserProfile, AppError> {
        let email = normalize_email(email);
        let display_name = display_name.trim();

        if display_name.is_empty() {
            return Err(AuthErrorCode::MissingDisplayName.into());
        }
        if !email.validate_email() {
            return Err(AuthErrorCode::InvalidEmail.into());
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthErrorCode::WeakPassword.into());
        }

        let salt = self.random_bytes::<SALT_LEN>()?;
        let hash = {
            let password = password.to_string();
            blocking(move || hash_password(&password, &salt)).await?
        };

        let lock = self.lock_email(&email).await;
        let created = match self.find_account(&email).await {
            Ok(Some(_)) => Err(AuthErrorCode::EmailAlreadyInUse.into()),
            Ok(None) => {
                self.create_account(
                    &email,
                    Some(display_name.to_string()),
                    None,
                    Credential::Password {
                        salt: STANDARD.encode(salt),
                        hash: STANDARD.encode(hash),
                    },
                )
                .await
            }
            Err(e) => Err(e),
        };
        self.unlock_email(&email, lock);
        let profile = created?;

        tracing::info!(user_id = %profile.id, "Account created");
        self.signed_in(&profile);
        Ok(profile)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<UserProfile, AppError> {
        let email = normalize_email(email);
        if !email.validate_email() {
            return Err(AuthErrorCode::InvalidEmail.into());
        }
        self.begin_attempt(&email)?;

        let account = self.find_account(&email).await?;
        let verified = match &account {
            Some(account) => {
                let account = account.clone();
                let password = password.to_string();
                blocking(move || verify_password(&account, &password)).await?
            }
            None => false,
        };

        let Some(account) = account.filter(|_| verified) else {
            return Err(AuthErrorCode::InvalidCredential.into());
        };

        self.failures.remove(&email);
        let profile = self.touch_and_profile(account).await?;
        self.signed_in(&profile);
        Ok(profile)
    }

    async fn sign_in_with_google(&self, id_token: &str) -> Result<UserProfile, AppError> {
        if id_token.trim().is_empty() {
            return Err(AuthErrorCode::PopupClosedByUser.into());
        }
        let Some(verifier) = &self.google else {
            return Err(AuthErrorCode::Other("auth/operation-not-allowed".to_string()).into());
        };

        let identity = verifier.verify(id_token).await.map_err(|e| {
            tracing::warn!(error = %e, "Google ID token verification failed");
            match e {
                OidcError::Rejected(_) => AuthErrorCode::InvalidCredential,
                OidcError::Transient(_) => AuthErrorCode::NetworkRequestFailed,
            }
        })?;

        let email = normalize_email(&identity.email);
        let lock = self.lock_email(&email).await;
        let result = self.google_account(&email, identity).await;
        self.unlock_email(&email, lock);
        let profile = result?;

        self.signed_in(&profile);
        Ok(profile)
    }

    async fn sign_out(&self, user_id: &str) {
        tracing::info!(user_id = %user_id, "User signed out");
        let _ = self.events.send(SessionEvent::SignedOut {
            user_id: user_id.to_string(),
        });
    }

    async fn current_user(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        self.load_profile(user_id).await
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Document id for an account: the URL-encoded normalized email.
fn account_id(email: &str) -> String {
    urlencoding::encode(email).into_owned()
}

fn iterations() -> NonZeroU32 {
    NonZeroU32::new(PBKDF2_ITERATIONS).unwrap_or(NonZeroU32::MIN)
}

fn hash_password(password: &str, salt: &[u8]) -> [u8; HASH_LEN] {
    let mut out = [0u8; HASH_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations(),
        salt,
        password.as_bytes(),
        &mut out,
    );
    out
}

/// Run PBKDF2 work on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing task failed: {e}")))
}

fn verify_password(account: &Account, password: &str) -> bool {
    let (Some(salt), Some(hash)) = (&account.password_salt, &account.password_hash) else {
        return false;
    };
    let (Ok(salt), Ok(hash)) = (STANDARD.decode(salt), STANDARD.decode(hash)) else {
        tracing::warn!(user_id = %account.user_id, "Undecodable password hash");
        return false;
    };
    pbkdf2::verify(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations(),
        &salt,
        password.as_bytes(),
        &hash,
    )
    .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Document, MemoryStore};
    use futures_util::future::join_all;

    /// Yields before every call so concurrent requests interleave.
    #[derive(Default)]
    struct YieldingStore(MemoryStore);

    #[async_trait]
    impl DocumentStore for YieldingStore {
        async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>, AppError> {
            tokio::task::yield_now().await;
            self.0.list(collection).await
        }

        async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
            tokio::task::yield_now().await;
            self.0.get(collection, id).await
        }

        async fn put(&self, collection: &str, id: &str, fields: &Document) -> Result<(), AppError> {
            tokio::task::yield_now().await;
            self.0.put(collection, id, fields).await
        }
    }

    fn provider() -> (StoreIdentityProvider, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (StoreIdentityProvider::new(store.clone(), None), store)
    }

    fn code(err: AppError) -> AuthErrorCode {
        match err {
            AppError::Auth(code) => code,
            other => panic!("expected auth error, got {other:?}"),
        }
    }

    #[test]
    fn test_error_messages() {
        let table = [
            ("auth/email-already-in-use", "This email is already registered. Try logging in."),
            ("auth/invalid-email", "Please enter a valid email address."),
            ("auth/weak-password", "Password should be at least 6 characters."),
            ("auth/user-not-found", "No account found with this email."),
            ("auth/wrong-password", "Incorrect password. Please try again."),
            ("auth/invalid-credential", "Invalid email or password."),
            ("auth/too-many-requests", "Too many attempts. Please try again later."),
            ("auth/popup-closed-by-user", "Google sign-in was cancelled."),
            ("auth/network-request-failed", "Network error. Check your connection."),
        ];
        for (raw, message) in table {
            let parsed = AuthErrorCode::from_code(raw);
            assert_eq!(parsed.code(), raw);
            assert_eq!(parsed.message(), message);
        }

        let unknown = AuthErrorCode::from_code("auth/quota-exceeded");
        assert_eq!(unknown.code(), "auth/quota-exceeded");
        assert_eq!(unknown.message(), "Something went wrong. Please try again.");
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let (provider, store) = provider();
        let created = provider
            .sign_up(" Amina@Example.com ", "secret123", "Amina")
            .await
            .unwrap();
        assert_eq!(created.email, "amina@example.com");
        assert_eq!(store.len(collections::ACCOUNTS), 1);

        let signed_in = provider.sign_in("amina@example.com", "secret123").await.unwrap();
        assert_eq!(signed_in, created);

        let current = provider.current_user(&created.id).await.unwrap();
        assert_eq!(current, Some(created));
    }

    #[tokio::test]
    async fn test_sign_up_validation() {
        let (provider, _) = provider();
        assert_eq!(
            code(provider.sign_up("a@b.com", "secret123", "  ").await.unwrap_err()),
            AuthErrorCode::MissingDisplayName
        );
        assert_eq!(
            code(provider.sign_up("not-an-email", "secret123", "A").await.unwrap_err()),
            AuthErrorCode::InvalidEmail
        );
        assert_eq!(
            code(provider.sign_up("a@b.com", "12345", "A").await.unwrap_err()),
            AuthErrorCode::WeakPassword
        );

        provider.sign_up("a@b.com", "123456", "A").await.unwrap();
        assert_eq!(
            code(provider.sign_up("A@B.com", "123456", "A").await.unwrap_err()),
            AuthErrorCode::EmailAlreadyInUse
        );
    }

    #[tokio::test]
    async fn test_unknown_email_and_wrong_password_look_alike() {
        let (provider, _) = provider();
        provider.sign_up("a@b.com", "123456", "A").await.unwrap();

        assert_eq!(
            code(provider.sign_in("a@b.com", "nope!!").await.unwrap_err()),
            AuthErrorCode::InvalidCredential
        );
        assert_eq!(
            code(provider.sign_in("z@b.com", "123456").await.unwrap_err()),
            AuthErrorCode::InvalidCredential
        );
    }

    #[tokio::test]
    async fn test_throttle_after_repeated_failures() {
        let (provider, _) = provider();
        provider.sign_up("a@b.com", "123456", "A").await.unwrap();

        for _ in 0..MAX_FAILED_ATTEMPTS {
            assert_eq!(
                code(provider.sign_in("a@b.com", "wrong!").await.unwrap_err()),
                AuthErrorCode::InvalidCredential
            );
        }
        // Even the right password is refused inside the window.
        assert_eq!(
            code(provider.sign_in("a@b.com", "123456").await.unwrap_err()),
            AuthErrorCode::TooManyRequests
        );
    }

    #[tokio::test]
    async fn test_success_resets_failure_count() {
        let (provider, _) = provider();
        provider.sign_up("a@b.com", "123456", "A").await.unwrap();

        for _ in 0..MAX_FAILED_ATTEMPTS - 1 {
            let _ = provider.sign_in("a@b.com", "wrong!").await;
        }
        provider.sign_in("a@b.com", "123456").await.unwrap();
        for _ in 0..MAX_FAILED_ATTEMPTS - 1 {
            let _ = provider.sign_in("a@b.com", "wrong!").await;
        }
        assert!(provider.sign_in("a@b.com", "123456").await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_sign_up_creates_one_account() {
        let store = Arc::new(YieldingStore::default());
        let provider = StoreIdentityProvider::new(store.clone(), None);

        let (first, second) = tokio::join!(
            provider.sign_up("a@b.com", "123456", "A"),
            provider.sign_up("A@b.com ", "654321", "B"),
        );

        let results = [first, second];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let err = results.into_iter().find_map(Result::err).unwrap();
        assert_eq!(code(err), AuthErrorCode::EmailAlreadyInUse);
        assert_eq!(store.0.len(collections::ACCOUNTS), 1);
        assert_eq!(store.0.len(collections::USERS), 1);
        assert!(provider.email_locks.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_wrong_passwords_are_capped() {
        let store = Arc::new(YieldingStore::default());
        let provider = StoreIdentityProvider::new(store, None);
        provider.sign_up("a@b.com", "123456", "A").await.unwrap();

        let attempts = (0..3 * MAX_FAILED_ATTEMPTS).map(|_| provider.sign_in("a@b.com", "wrong!"));
        let codes: Vec<AuthErrorCode> = join_all(attempts)
            .await
            .into_iter()
            .map(|r| code(r.unwrap_err()))
            .collect();

        let checked = codes
            .iter()
            .filter(|c| **c == AuthErrorCode::InvalidCredential)
            .count();
        assert_eq!(checked, MAX_FAILED_ATTEMPTS as usize);
        assert!(codes[MAX_FAILED_ATTEMPTS as usize..]
            .iter()
            .all(|c| *c == AuthErrorCode::TooManyRequests));
        assert_eq!(
            code(provider.sign_in("a@b.com", "123456").await.unwrap_err()),
            AuthErrorCode::TooManyRequests
        );
    }

    #[test]
    fn test_expired_windows_are_pruned() {
        let (provider, _) = provider();
        provider.begin_attempt("old@b.com").unwrap();
        provider.begin_attempt("other@b.com").unwrap();
        assert_eq!(provider.failures.len(), 2);

        let start = Instant::now();
        let half_minute = Duration::from_secs(30);

        // Windows still open: kept.
        provider.prune_failures(start + THROTTLE_WINDOW - half_minute);
        assert_eq!(provider.failures.len(), 2);

        // Expired, but the last sweep was too recent.
        provider.prune_failures(start + THROTTLE_WINDOW);
        assert_eq!(provider.failures.len(), 2);

        provider.prune_failures(start + THROTTLE_WINDOW + PRUNE_INTERVAL);
        assert!(provider.failures.is_empty());
    }

    #[tokio::test]
    async fn test_events_broadcast() {
        let (provider, _) = provider();
        let mut events = provider.subscribe();

        let profile = provider.sign_up("a@b.com", "123456", "A").await.unwrap();
        provider.sign_out(&profile.id).await;

        assert_eq!(
            events.recv().await.unwrap(),
            SessionEvent::SignedIn {
                user_id: profile.id.clone()
            }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            SessionEvent::SignedOut { user_id: profile.id }
        );
    }

    #[tokio::test]
    async fn test_google_sign_in_without_token_is_cancelled() {
        let (provider, _) = provider();
        assert_eq!(
            code(provider.sign_in_with_google("").await.unwrap_err()),
            AuthErrorCode::PopupClosedByUser
        );
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let salt = [7u8; SALT_LEN];
        let account = Account {
            user_id: "u1".to_string(),
            email: "a@b.com".to_string(),
            provider: AuthProvider::Password,
            password_salt: Some(STANDARD.encode(salt)),
            password_hash: Some(STANDARD.encode(hash_password("hunter22", &salt))),
            google_subject: None,
            created_at: String::new(),
            last_sign_in: String::new(),
        };
        assert!(verify_password(&account, "hunter22"));
        assert!(!verify_password(&account, "hunter23"));
    }

    #[test]
    fn test_account_id_encodes_email() {
        assert_eq!(account_id("a+b@example.com"), "a%2Bb%40example.com");
    }
}
