// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily dua fetcher.

use crate::db::{collections, decode, sort_numbered, DocumentStore};
use crate::models::{DailyDua, DuaRecord};
use std::sync::Arc;

#[derive(Clone)]
pub struct DuaService {
    store: Arc<dyn DocumentStore>,
}

impl DuaService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// All published duas ordered by Ramadan day. Fetch failures degrade to
    /// an empty list.
    pub async fn daily_duas(&self) -> Vec<DailyDua> {
        let docs = match self.store.list(collections::DUA).await {
            Ok(docs) => docs,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch daily duas");
                return Vec::new();
            }
        };

        sort_numbered(collections::DUA, docs)
            .into_iter()
            .map(|(day, fields)| {
                let record = decode::<DuaRecord>(fields).unwrap_or_else(|e| {
                    tracing::warn!(day, error = %e, "Malformed dua record, showing placeholder");
                    DuaRecord::default()
                });
                DailyDua::from_record(day, record)
            })
            .collect()
    }
}
