// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily dua records (`Dua` collection, keyed by Ramadan day).

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Dua document as stored by the backend. Every field is optional; an
/// empty document is a day whose dua has not been published yet.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DuaRecord {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "Arabic", default)]
    pub arabic: Option<String>,
    #[serde(rename = "Pronunciation", default)]
    pub pronunciation: Option<String>,
    #[serde(default)]
    pub translation: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// A dua as rendered on the daily dua page.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DailyDua {
    pub day: u32,
    pub title: Option<String>,
    pub arabic: Option<String>,
    pub pronunciation: Option<String>,
    pub translation: Option<String>,
    pub source: Option<String>,
    /// True when none of the text fields are filled in yet.
    pub coming_soon: bool,
}

impl DailyDua {
    pub fn from_record(day: u32, record: DuaRecord) -> Self {
        let filled = |s: &Option<String>| s.as_deref().is_some_and(|v| !v.trim().is_empty());
        let coming_soon =
            !filled(&record.arabic) && !filled(&record.pronunciation) && !filled(&record.translation);
        Self {
            day,
            title: record.title,
            arabic: record.arabic,
            pronunciation: record.pronunciation,
            translation: record.translation,
            source: record.source,
            coming_soon,
        }
    }
}
