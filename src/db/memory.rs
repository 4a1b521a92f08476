// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process [`DocumentStore`] for local development and tests.

use crate::db::{Document, DocumentStore};
use crate::error::AppError;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeMap;

/// Document store held entirely in memory.
///
/// Collections list their documents in id order, like Firestore does.
#[derive(Default)]
pub struct MemoryStore {
    collections: DashMap<String, BTreeMap<String, Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document without going through the async interface.
    pub fn insert(&self, collection: &str, id: &str, fields: Document) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map(|c| c.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>, AppError> {
        Ok(self
            .collections
            .get(collection)
            .map(|c| c.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|c| c.get(id).cloned()))
    }

    async fn put(&self, collection: &str, id: &str, fields: &Document) -> Result<(), AppError> {
        self.insert(collection, id, fields.clone());
        Ok(())
    }
}
