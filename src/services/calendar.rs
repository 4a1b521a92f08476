// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ramadan calendar, greetings, and progress thresholds for the dashboard.

use crate::config::Config;
use crate::services::countdown::{time_left, Countdown, TimeLeft};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Start and end of the month in local time.
#[derive(Debug, Clone, Copy)]
pub struct RamadanCalendar {
    start: DateTime<Utc>,
    /// Last instant of the final day.
    end: DateTime<Utc>,
    offset: FixedOffset,
}

impl RamadanCalendar {
    pub fn new(start: NaiveDate, end: NaiveDate, offset: FixedOffset) -> Self {
        let start_of = |d: NaiveDate| {
            offset
                .from_local_datetime(&d.and_time(NaiveTime::MIN))
                .single()
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|| d.and_time(NaiveTime::MIN).and_utc())
        };
        let start = start_of(start);
        let end = start_of(end) + Duration::days(1) - Duration::seconds(1);
        Self { start, end, offset }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.ramadan_start, config.ramadan_end, config.utc_offset())
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Current time in the calendar's zone.
    pub fn local(&self, now: DateTime<Utc>) -> DateTime<FixedOffset> {
        now.with_timezone(&self.offset)
    }

    /// Day of Ramadan: 0 before it starts, 30 once it is over.
    pub fn ramadan_day(&self, now: DateTime<Utc>) -> u32 {
        if now < self.start {
            return 0;
        }
        if now > self.end {
            return 30;
        }
        let elapsed_days = (now - self.start).num_days() as u32;
        (elapsed_days + 1).min(30)
    }

    /// Time until the first day begins, `None` once it has.
    pub fn countdown_to_start(&self, now: DateTime<Utc>) -> Option<TimeLeft> {
        match time_left(self.start, now) {
            Countdown::Remaining(left) => Some(left),
            Countdown::Passed => None,
        }
    }
}

/// Salutation for the local hour.
pub fn greeting(hour: u32) -> &'static str {
    match hour {
        0..=4 => "Assalamu Alaikum",
        5..=11 => "Good Morning",
        12..=16 => "Good Afternoon",
        17..=19 => "Good Evening",
        _ => "Assalamu Alaikum",
    }
}

/// Greeting for the given instant in the calendar's zone.
pub fn greeting_at(calendar: &RamadanCalendar, now: DateTime<Utc>) -> &'static str {
    greeting(calendar.local(now).hour())
}

/// How a day's completion percentage reads on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ProgressLevel {
    Behind,
    Steady,
    Excellent,
}

impl ProgressLevel {
    pub fn for_percentage(pct: u32) -> Self {
        if pct < 40 {
            ProgressLevel::Behind
        } else if pct <= 70 {
            ProgressLevel::Steady
        } else {
            ProgressLevel::Excellent
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ProgressLevel::Behind => {
                "You're falling behind today! Every small deed counts. Start now and earn Allah's mercy."
            }
            ProgressLevel::Steady => {
                "Good effort so far! Push a little more to complete your daily ibadah. You're almost there."
            }
            ProgressLevel::Excellent => {
                "MashaAllah! You're doing amazing today. May Allah accept all your ibadah."
            }
        }
    }
}
