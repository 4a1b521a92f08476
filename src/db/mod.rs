// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Document store layer.
//!
//! Everything the service persists or reads goes through [`DocumentStore`],
//! a whole-document get/list/put interface. Production uses Firestore;
//! local development and tests use [`MemoryStore`].

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use async_trait::async_trait;
use std::collections::HashMap;

/// Field map of a single document.
pub type Document = HashMap<String, serde_json::Value>;

/// Collection names as constants.
pub mod collections {
    /// Per-user tracker documents (keyed by user id)
    pub const TRACKERS: &str = "trackers";
    /// Daily duas (keyed by Ramadan day number)
    pub const DUA: &str = "Dua";
    /// Identity provider accounts (keyed by encoded email)
    pub const ACCOUNTS: &str = "accounts";
    /// Account id lookup (keyed by user id)
    pub const USERS: &str = "users";
}

/// Minimal capability interface over the remote document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch every document in a collection as `(id, fields)` pairs.
    async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>, AppError>;

    /// Fetch one document, `None` if it does not exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError>;

    /// Replace a document's contents entirely.
    async fn put(&self, collection: &str, id: &str, fields: &Document) -> Result<(), AppError>;
}

/// Deserialize a typed record out of a raw document.
pub fn decode<T: serde::de::DeserializeOwned>(fields: Document) -> Result<T, AppError> {
    let map: serde_json::Map<String, serde_json::Value> = fields.into_iter().collect();
    serde_json::from_value(serde_json::Value::Object(map))
        .map_err(|e| AppError::Database(format!("Malformed document: {}", e)))
}

/// Serialize a typed record into a raw document.
pub fn encode<T: serde::Serialize>(record: &T) -> Result<Document, AppError> {
    match serde_json::to_value(record).map_err(|e| AppError::Internal(e.into()))? {
        serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(AppError::Internal(anyhow::anyhow!(
            "Expected a JSON object for document, got {}",
            other
        ))),
    }
}

/// Keep documents whose id is a number and sort them by it.
///
/// Reference collections are keyed by day number, but document ids are
/// strings, so lexical order would put "10" before "2".
pub fn sort_numbered(collection: &str, docs: Vec<(String, Document)>) -> Vec<(u32, Document)> {
    let mut numbered: Vec<(u32, Document)> = docs
        .into_iter()
        .filter_map(|(id, fields)| match id.trim().parse::<u32>() {
            Ok(n) => Some((n, fields)),
            Err(_) => {
                tracing::warn!(collection, id = %id, "Skipping document with non-numeric id");
                None
            }
        })
        .collect();
    numbered.sort_by_key(|(n, _)| *n);
    numbered
}
