// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed [`DocumentStore`].
//!
//! Documents are read and written as untyped field maps; typed decoding
//! happens in the services that own each collection.

use crate::db::{Document, DocumentStore};
use crate::error::AppError;
use async_trait::async_trait;

/// Prefix of the metadata fields the Firestore deserializer injects.
const FIRESTORE_META_PREFIX: &str = "_firestore_";

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator accepts any bearer token, so skip credential lookup.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }
}

/// Drop the `_firestore_*` metadata fields from a deserialized document.
fn strip_metadata(mut fields: Document) -> Document {
    fields.retain(|key, _| !key.starts_with(FIRESTORE_META_PREFIX));
    fields
}

/// Last path segment of a full document name.
fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

#[async_trait]
impl DocumentStore for FirestoreDb {
    async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>, AppError> {
        let docs: Vec<firestore::FirestoreDocument> = self
            .client
            .fluent()
            .select()
            .from(collection)
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut out = Vec::with_capacity(docs.len());
        for doc in docs {
            let fields: Document = firestore::FirestoreDb::deserialize_doc_to(&doc)
                .map_err(|e| AppError::Database(e.to_string()))?;
            out.push((document_id(&doc.name).to_string(), strip_metadata(fields)));
        }

        tracing::debug!(collection, count = out.len(), "Listed collection");
        Ok(out)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        let fields: Option<Document> = self
            .client
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(fields.map(strip_metadata))
    }

    async fn put(&self, collection: &str, id: &str, fields: &Document) -> Result<(), AppError> {
        let _: Document = self
            .client
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(fields)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_from_full_name() {
        assert_eq!(
            document_id("projects/p/databases/(default)/documents/Dua/17"),
            "17"
        );
        assert_eq!(document_id("plain"), "plain");
    }

    #[test]
    fn test_strip_metadata() {
        let mut doc = Document::new();
        doc.insert("_firestore_id".to_string(), serde_json::json!("5"));
        doc.insert("_firestore_updated".to_string(), serde_json::json!("x"));
        doc.insert("5-namaz".to_string(), serde_json::json!(true));

        let stripped = strip_metadata(doc);
        assert_eq!(stripped.len(), 1);
        assert!(stripped.contains_key("5-namaz"));
    }
}
