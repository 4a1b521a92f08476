// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod content;
pub mod dua;
pub mod schedule;
pub mod tracker;
pub mod user;

pub use dua::{DailyDua, DuaRecord};
pub use schedule::{ClockTime, FastingTimes, PrayerTime, ScheduleDay, ScheduleRecord};
pub use tracker::{Activity, TrackerDocument, TrackerKey, TrackerKeyError, DAYS};
pub use user::{Account, AuthProvider, UserProfile};
