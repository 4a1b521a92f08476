// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile and identity provider account records.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Signed-in user as seen by the rest of the application.
///
/// Stored in `users`, keyed by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserProfile {
    pub id: String,
    pub display_name: Option<String>,
    pub email: String,
    pub photo_url: Option<String>,
}

impl UserProfile {
    /// Name for greetings: the display name, else the email's local part.
    pub fn greeting_name(&self) -> String {
        match self.display_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self
                .email
                .split('@')
                .next()
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// How an account signs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Password,
    Google,
}

/// Credentials kept by the identity provider.
///
/// Stored in `accounts`, keyed by the URL-encoded lowercase email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub user_id: String,
    pub email: String,
    pub provider: AuthProvider,
    /// PBKDF2 salt (base64), password accounts only
    #[serde(default)]
    pub password_salt: Option<String>,
    /// PBKDF2-HMAC-SHA256 hash (base64), password accounts only
    #[serde(default)]
    pub password_hash: Option<String>,
    /// Google `sub` claim, Google accounts only
    #[serde(default)]
    pub google_subject: Option<String>,
    pub created_at: String,
    pub last_sign_in: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(display_name: Option<&str>) -> UserProfile {
        UserProfile {
            id: "u1".to_string(),
            display_name: display_name.map(str::to_string),
            email: "fatima@example.com".to_string(),
            photo_url: None,
        }
    }

    #[test]
    fn test_greeting_name_prefers_display_name() {
        assert_eq!(profile(Some("Fatima")).greeting_name(), "Fatima");
    }

    #[test]
    fn test_greeting_name_falls_back_to_email() {
        assert_eq!(profile(None).greeting_name(), "fatima");
        assert_eq!(profile(Some("  ")).greeting_name(), "fatima");
    }

    #[test]
    fn test_account_provider_serialization() {
        let value = serde_json::to_value(AuthProvider::Google).unwrap();
        assert_eq!(value, serde_json::json!("google"));
    }
}
