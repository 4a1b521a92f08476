// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily ibadah tracker: the activity catalog, composite keys, and the
//! per-user completion set with its derived statistics.
//!
//! On the wire a tracker is a flat map `"<day>-<activity>" → true`, one
//! document per user. Key presence means "done"; absent keys and `false`
//! values both mean "not done".

use crate::db::Document;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Number of days tracked.
pub const DAYS: u8 = 30;

/// The fixed catalog of tracked activities, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Activity {
    Roza,
    Namaz,
    Quran,
    Tarawe,
    Tahajjud,
    Istighfar,
    Darood,
    Hasbunallah,
    Subhanallah,
    Lailaha,
    Lahawla,
    Tawheed,
}

impl Activity {
    pub const ALL: [Activity; 12] = [
        Activity::Roza,
        Activity::Namaz,
        Activity::Quran,
        Activity::Tarawe,
        Activity::Tahajjud,
        Activity::Istighfar,
        Activity::Darood,
        Activity::Hasbunallah,
        Activity::Subhanallah,
        Activity::Lailaha,
        Activity::Lahawla,
        Activity::Tawheed,
    ];

    /// Number of activities per day.
    pub const COUNT: usize = Self::ALL.len();

    /// Stable key used in stored documents.
    pub fn key(self) -> &'static str {
        match self {
            Activity::Roza => "roza",
            Activity::Namaz => "namaz",
            Activity::Quran => "quran",
            Activity::Tarawe => "tarawe",
            Activity::Tahajjud => "tahajjud",
            Activity::Istighfar => "istighfar",
            Activity::Darood => "darood",
            Activity::Hasbunallah => "hasbunallah",
            Activity::Subhanallah => "subhanallah",
            Activity::Lailaha => "lailaha",
            Activity::Lahawla => "lahawla",
            Activity::Tawheed => "tawheed",
        }
    }

    /// One-letter column label.
    pub fn label(self) -> &'static str {
        match self {
            Activity::Roza => "R",
            Activity::Namaz => "N",
            Activity::Quran => "Q",
            Activity::Tarawe | Activity::Tahajjud => "T",
            Activity::Istighfar => "I",
            Activity::Darood => "D",
            Activity::Hasbunallah => "H",
            Activity::Subhanallah => "S",
            Activity::Lailaha | Activity::Lahawla | Activity::Tawheed => "L",
        }
    }

    /// Legend text.
    pub fn full_name(self) -> &'static str {
        match self {
            Activity::Roza => "Roza",
            Activity::Namaz => "Namaz",
            Activity::Quran => "Qur'an",
            Activity::Tarawe => "Tarawe",
            Activity::Tahajjud => "Tahajjud",
            Activity::Istighfar => "Istighfar × 1000",
            Activity::Darood => "Darood e Sharif × 100",
            Activity::Hasbunallah => "Hasbunallah Wanimal Wakeel × 100",
            Activity::Subhanallah => "Subhanallahi wa bihamdihi × 100",
            Activity::Lailaha => {
                "La ilaha illa anta subhanaka inni kuntu minaz zalimin × 100"
            }
            Activity::Lahawla => "La hawla wala quwwata illa billah × 100",
            Activity::Tawheed => {
                "Laa ilaaha ill-Allaah wahdahu laa shareeka lah lahu'l-mulk wa lahu'l-hamd \
                 yuhyi wa yumeet wa huwa 'ala kulli shay'in qadeer × 100"
            }
        }
    }
}

impl FromStr for Activity {
    type Err = TrackerKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Activity::ALL
            .into_iter()
            .find(|a| a.key() == s)
            .ok_or_else(|| TrackerKeyError::UnknownActivity(s.to_string()))
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Errors from parsing or constructing a tracker key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackerKeyError {
    #[error("Day must be between 1 and {DAYS}, got {0}")]
    DayOutOfRange(i64),

    #[error("Unknown activity: {0}")]
    UnknownActivity(String),

    #[error("Malformed tracker key: {0}")]
    Malformed(String),
}

/// Composite `(day, activity)` key of one tracker cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrackerKey {
    day: u8,
    activity: Activity,
}

impl TrackerKey {
    pub fn new(day: i64, activity: Activity) -> Result<Self, TrackerKeyError> {
        if !(1..=DAYS as i64).contains(&day) {
            return Err(TrackerKeyError::DayOutOfRange(day));
        }
        Ok(Self {
            day: day as u8,
            activity,
        })
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }
}

impl FromStr for TrackerKey {
    type Err = TrackerKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (day, activity) = s
            .split_once('-')
            .ok_or_else(|| TrackerKeyError::Malformed(s.to_string()))?;
        let day: i64 = day
            .parse()
            .map_err(|_| TrackerKeyError::Malformed(s.to_string()))?;
        TrackerKey::new(day, activity.parse()?)
    }
}

impl fmt::Display for TrackerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.day, self.activity.key())
    }
}

/// Round `100 × part / whole` half up, as a whole percentage.
fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((200 * part + whole) / (2 * whole)) as u32
}

/// One user's set of completed cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerDocument {
    completed: BTreeSet<TrackerKey>,
}

impl TrackerDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a stored document, dropping keys that do not name a
    /// catalog cell and keys whose value is not `true`.
    pub fn from_fields(fields: &Document) -> Self {
        let mut completed = BTreeSet::new();
        for (raw, value) in fields {
            if value.as_bool() != Some(true) {
                continue;
            }
            match raw.parse::<TrackerKey>() {
                Ok(key) => {
                    completed.insert(key);
                }
                Err(e) => {
                    tracing::warn!(key = %raw, error = %e, "Ignoring invalid tracker key");
                }
            }
        }
        Self { completed }
    }

    /// Stored representation: every completed key mapped to `true`.
    pub fn to_fields(&self) -> Document {
        self.completed
            .iter()
            .map(|key| (key.to_string(), serde_json::Value::Bool(true)))
            .collect()
    }

    pub fn contains(&self, key: TrackerKey) -> bool {
        self.completed.contains(&key)
    }

    /// Flip one cell. Returns the new presence.
    pub fn toggle(&mut self, key: TrackerKey) -> bool {
        if self.completed.remove(&key) {
            false
        } else {
            self.completed.insert(key);
            true
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = TrackerKey> + '_ {
        self.completed.iter().copied()
    }

    pub fn completed_count(&self, day: u8) -> usize {
        self.completed.iter().filter(|k| k.day == day).count()
    }

    pub fn day_percentage(&self, day: u8) -> u32 {
        percentage(self.completed_count(day), Activity::COUNT)
    }

    pub fn total_completed(&self) -> usize {
        self.completed.len()
    }

    pub fn perfect_days(&self) -> usize {
        (1..=DAYS)
            .filter(|&d| self.completed_count(d) == Activity::COUNT)
            .count()
    }

    /// Mean of the per-day percentages, rounded.
    pub fn overall_percentage(&self) -> u32 {
        let sum: usize = (1..=DAYS).map(|d| self.day_percentage(d) as usize).sum();
        percentage(sum, 100 * DAYS as usize)
    }

    /// Highest day with at least one completed activity.
    pub fn latest_active_day(&self) -> Option<u8> {
        self.completed.iter().map(|k| k.day).max()
    }
}
