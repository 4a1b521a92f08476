// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Countdowns to an absolute target instant.
//!
//! Every tick recomputes from the target, so a late or skipped tick never
//! accumulates drift. The per-second stream owns its interval timer; when
//! the consumer drops the stream (e.g. an SSE client disconnects) the timer
//! goes with it.

use chrono::{DateTime, Utc};
use futures_util::stream::{self, Stream};
use serde::Serialize;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub const TICK: Duration = Duration::from_secs(1);

/// Time remaining, split into display units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TimeLeft {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl TimeLeft {
    fn from_secs(total: u64) -> Self {
        Self {
            days: total / 86_400,
            hours: (total % 86_400) / 3_600,
            minutes: (total % 3_600) / 60,
            seconds: total % 60,
        }
    }

    pub fn total_seconds(&self) -> u64 {
        self.days * 86_400 + self.hours * 3_600 + self.minutes * 60 + self.seconds
    }
}

/// State of a countdown at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Countdown {
    Remaining(TimeLeft),
    Passed,
}

impl Countdown {
    pub fn is_passed(&self) -> bool {
        matches!(self, Countdown::Passed)
    }
}

/// Remaining time from `now` until `target`. Never negative: anything at or
/// past the target is [`Countdown::Passed`]. Sub-second remainders round
/// down, matching a clock display.
pub fn time_left(target: DateTime<Utc>, now: DateTime<Utc>) -> Countdown {
    let millis = (target - now).num_milliseconds();
    if millis <= 0 {
        return Countdown::Passed;
    }
    Countdown::Remaining(TimeLeft::from_secs(millis as u64 / 1000))
}

/// Emit the countdown immediately, then once per [`TICK`], ending right
/// after the first [`Countdown::Passed`].
pub fn countdown_stream<C>(target: DateTime<Utc>, clock: C) -> impl Stream<Item = Countdown>
where
    C: Fn() -> DateTime<Utc> + Send + 'static,
{
    let mut interval = tokio::time::interval(TICK);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    stream::unfold(
        (interval, clock, false),
        move |(mut interval, clock, finished)| async move {
            if finished {
                return None;
            }
            interval.tick().await;
            let state = time_left(target, clock());
            let done = state.is_passed();
            Some((state, (interval, clock, done)))
        },
    )
}
