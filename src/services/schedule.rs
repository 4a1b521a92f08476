// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Prayer and fasting schedule fetcher.
//!
//! Each call re-reads the whole region collection; nothing is cached
//! between requests.

use crate::db::{decode, sort_numbered, DocumentStore};
use crate::models::{ScheduleDay, ScheduleRecord};
use chrono::NaiveDate;
use std::sync::Arc;

/// Reads region schedule collections.
#[derive(Clone)]
pub struct ScheduleService {
    store: Arc<dyn DocumentStore>,
}

impl ScheduleService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Every day in a region's schedule, ordered by day number.
    ///
    /// A failed fetch is logged and yields an empty schedule. Documents that
    /// do not decode are skipped.
    pub async fn month(&self, region: &str) -> Vec<ScheduleDay> {
        let docs = match self.store.list(region).await {
            Ok(docs) => docs,
            Err(e) => {
                tracing::warn!(region, error = %e, "Failed to fetch schedule");
                return Vec::new();
            }
        };

        sort_numbered(region, docs)
            .into_iter()
            .filter_map(|(day, fields)| match decode::<ScheduleRecord>(fields) {
                Ok(record) => Some(ScheduleDay { day, record }),
                Err(e) => {
                    tracing::warn!(region, day, error = %e, "Skipping malformed schedule record");
                    None
                }
            })
            .collect()
    }

    /// The schedule entry whose date matches `date`, if any.
    pub async fn for_date(&self, region: &str, date: NaiveDate) -> Option<ScheduleDay> {
        find_date(self.month(region).await, date)
    }
}

/// Pick the entry for `date` out of a month.
pub fn find_date(month: Vec<ScheduleDay>, date: NaiveDate) -> Option<ScheduleDay> {
    month.into_iter().find(|d| d.date() == Some(date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Document, MemoryStore};
    use serde_json::json;

    fn record(date: &str, sehri: &str, iftar: &str) -> Document {
        [
            ("Date".to_string(), json!(date)),
            ("SehriEnd".to_string(), json!(sehri)),
            ("Iftar".to_string(), json!(iftar)),
        ]
        .into_iter()
        .collect()
    }

    fn seeded() -> ScheduleService {
        let store = MemoryStore::new();
        store.insert("Dhaka", "10", record("2026-03-27", "04:58", "06:14"));
        store.insert("Dhaka", "2", record("2026-03-19", "05:05", "06:10"));
        store.insert("Dhaka", "1", record("2026-03-18", "05:06", "06:09"));
        store.insert("Dhaka", "notes", Document::new());
        ScheduleService::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_month_sorted_by_day_number() {
        let days: Vec<u32> = seeded().month("Dhaka").await.iter().map(|d| d.day).collect();
        assert_eq!(days, vec![1, 2, 10]);
    }

    #[tokio::test]
    async fn test_for_date() {
        let service = seeded();
        let day = service
            .for_date("Dhaka", NaiveDate::from_ymd_opt(2026, 3, 19).unwrap())
            .await
            .unwrap();
        assert_eq!(day.day, 2);

        assert!(service
            .for_date("Dhaka", NaiveDate::from_ymd_opt(2026, 5, 1).unwrap())
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_unknown_region_is_empty() {
        assert!(seeded().month("Sylhet").await.is_empty());
    }
}
