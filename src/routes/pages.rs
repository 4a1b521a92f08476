// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public pages: dashboard, prayer and meal schedules, dua library, and the
//! live iftar countdown.

use crate::error::{AppError, Result};
use crate::middleware::MaybeUser;
use crate::models::content::{
    self, Amol, EssentialDua, Hadith, QuickLink, ESSENTIAL_DUAS, IFTAR_SUGGESTIONS,
    RECOMMENDED_AMOL, SUHOOR_HADITH, SUHOOR_SUGGESTIONS,
};
use crate::models::schedule::FastDuration;
use crate::models::{FastingTimes, PrayerTime, ScheduleDay, TrackerDocument, DAYS};
use crate::services::schedule::find_date;
use crate::services::{countdown_stream, greeting_at, time_left, Countdown, ProgressLevel, TimeLeft};
use crate::time_utils::local_instant;
use crate::AppState;
use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, KeepAliveStream, Sse},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use futures_util::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(dashboard))
        .route("/salat", get(salat))
        .route("/suhoor-iftar", get(suhoor_iftar))
        .route("/dua-amol", get(dua_amol))
        .route("/countdown/iftar", get(iftar_countdown))
}

#[derive(Debug, Deserialize)]
pub struct RegionParams {
    #[serde(default)]
    region: Option<String>,
}

/// Resolve `?region=` against the configured regions.
fn requested_region<'a>(state: &'a AppState, params: &'a RegionParams) -> Result<&'a str> {
    state
        .config
        .resolve_region(params.region.as_deref())
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "Unknown region: {}",
                params.region.as_deref().unwrap_or_default()
            ))
        })
}

fn local_today(state: &AppState, now: DateTime<Utc>) -> NaiveDate {
    state.calendar.local(now).date_naive()
}

/// Absolute iftar instant for a schedule day.
fn iftar_instant(state: &AppState, day: &ScheduleDay) -> Option<DateTime<Utc>> {
    let times = day.fasting_times()?;
    local_instant(day.date()?, times.iftar, state.calendar.offset())
}

// ─── Shared response pieces ──────────────────────────────────

/// Sehri end, iftar, and the length of the fast.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FastingSummary {
    pub sehri_end: String,
    pub iftar: String,
    pub duration: FastDuration,
}

impl From<FastingTimes> for FastingSummary {
    fn from(times: FastingTimes) -> Self {
        Self {
            sehri_end: times.sehri_end.to_string(),
            iftar: times.iftar.to_string(),
            duration: times.duration(),
        }
    }
}

/// One day of a region's month.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ScheduleRow {
    pub day: u32,
    pub date: String,
    pub fasting: Option<FastingSummary>,
    pub prayers: Vec<PrayerTime>,
}

impl From<&ScheduleDay> for ScheduleRow {
    fn from(day: &ScheduleDay) -> Self {
        Self {
            day: day.day,
            date: day.record.date.clone(),
            fasting: day.fasting_times().map(FastingSummary::from),
            prayers: day.prayers(),
        }
    }
}

/// Iftar countdown state, including the case of no schedule for today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum IftarStatus {
    Remaining(TimeLeft),
    Passed,
    NoSchedule,
}

impl From<Countdown> for IftarStatus {
    fn from(countdown: Countdown) -> Self {
        match countdown {
            Countdown::Remaining(left) => IftarStatus::Remaining(left),
            Countdown::Passed => IftarStatus::Passed,
        }
    }
}

// ─── Dashboard ───────────────────────────────────────────────

/// Tracker progress card for signed-in users.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TrackerCard {
    pub day: u8,
    pub completed: usize,
    pub total: usize,
    pub percentage: u32,
    pub level: ProgressLevel,
    pub message: String,
}

impl TrackerCard {
    /// Card for the latest active day, or for `ramadan_day` at 0% when
    /// nothing has been tracked yet.
    pub fn new(document: &TrackerDocument, ramadan_day: u32) -> Self {
        let day = document
            .latest_active_day()
            .unwrap_or_else(|| ramadan_day.clamp(1, DAYS as u32) as u8);
        let percentage = document.day_percentage(day);
        let level = ProgressLevel::for_percentage(percentage);
        Self {
            day,
            completed: document.completed_count(day),
            total: crate::models::Activity::COUNT,
            percentage,
            level,
            message: level.message().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub greeting: &'static str,
    pub user_name: Option<String>,
    pub region: String,
    pub ramadan_day: u32,
    pub countdown_to_ramadan: Option<TimeLeft>,
    pub today: Option<FastingSummary>,
    pub iftar: IftarStatus,
    pub quick_links: Vec<QuickLink>,
    pub tracker: Option<TrackerCard>,
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Query(params): Query<RegionParams>,
) -> Result<Json<DashboardResponse>> {
    let region = requested_region(&state, &params)?;
    let now = state.now();
    let ramadan_day = state.calendar.ramadan_day(now);

    let today = find_date(state.schedules.month(region).await, local_today(&state, now));
    let iftar = match today.as_ref().and_then(|d| iftar_instant(&state, d)) {
        Some(target) => time_left(target, now).into(),
        None => IftarStatus::NoSchedule,
    };

    let (user_name, tracker) = match &user {
        Some(user) => {
            let profile = state
                .auth
                .current_user(&user.user_id)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(user_id = %user.user_id, error = %e, "Failed to load profile");
                    None
                });
            let document = state
                .trackers
                .remote_document(&user.user_id)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(user_id = %user.user_id, error = %e, "Failed to load tracker for dashboard");
                    TrackerDocument::new()
                });
            (
                profile.map(|p| p.greeting_name()),
                Some(TrackerCard::new(&document, ramadan_day)),
            )
        }
        None => (None, None),
    };

    Ok(Json(DashboardResponse {
        greeting: greeting_at(&state.calendar, now),
        user_name,
        region: region.to_string(),
        ramadan_day,
        countdown_to_ramadan: state.calendar.countdown_to_start(now),
        today: today
            .as_ref()
            .and_then(ScheduleDay::fasting_times)
            .map(FastingSummary::from),
        iftar,
        quick_links: content::quick_links(user.is_some()),
        tracker,
    }))
}

// ─── Schedules ───────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SalatResponse {
    pub region: String,
    pub regions: Vec<String>,
    pub date: String,
    pub prayers: Vec<PrayerTime>,
    pub month: Vec<ScheduleRow>,
}

async fn salat(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RegionParams>,
) -> Result<Json<SalatResponse>> {
    let region = requested_region(&state, &params)?;
    let date = local_today(&state, state.now());
    let month = state.schedules.month(region).await;

    let prayers = month
        .iter()
        .find(|d| d.date() == Some(date))
        .map(ScheduleDay::prayers)
        .unwrap_or_default();

    Ok(Json(SalatResponse {
        region: region.to_string(),
        regions: state.config.regions.clone(),
        date: date.to_string(),
        prayers,
        month: month.iter().map(ScheduleRow::from).collect(),
    }))
}

#[derive(Debug, Serialize)]
pub struct SuhoorIftarResponse {
    pub region: String,
    pub regions: Vec<String>,
    pub date: String,
    pub today: Option<FastingSummary>,
    pub month: Vec<ScheduleRow>,
    pub suhoor_suggestions: &'static [&'static str],
    pub iftar_suggestions: &'static [&'static str],
    pub tip: Hadith,
}

async fn suhoor_iftar(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RegionParams>,
) -> Result<Json<SuhoorIftarResponse>> {
    let region = requested_region(&state, &params)?;
    let date = local_today(&state, state.now());
    let month = state.schedules.month(region).await;

    let today = month
        .iter()
        .find(|d| d.date() == Some(date))
        .and_then(ScheduleDay::fasting_times)
        .map(FastingSummary::from);

    Ok(Json(SuhoorIftarResponse {
        region: region.to_string(),
        regions: state.config.regions.clone(),
        date: date.to_string(),
        today,
        month: month.iter().map(ScheduleRow::from).collect(),
        suhoor_suggestions: SUHOOR_SUGGESTIONS,
        iftar_suggestions: IFTAR_SUGGESTIONS,
        tip: SUHOOR_HADITH,
    }))
}

#[derive(Debug, Serialize)]
pub struct DuaAmolResponse {
    pub duas: &'static [EssentialDua],
    pub amol: &'static [Amol],
}

async fn dua_amol() -> Json<DuaAmolResponse> {
    Json(DuaAmolResponse {
        duas: ESSENTIAL_DUAS,
        amol: RECOMMENDED_AMOL,
    })
}

// ─── Live countdown ──────────────────────────────────────────

type EventStream = BoxStream<'static, std::result::Result<Event, axum::Error>>;

/// Server-sent iftar countdown: one `tick` per second, a final `passed`,
/// or a single `no_schedule` when today has no iftar time.
async fn iftar_countdown(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RegionParams>,
) -> Result<Sse<KeepAliveStream<EventStream>>> {
    let region = requested_region(&state, &params)?;
    let now = state.now();
    let today = find_date(state.schedules.month(region).await, local_today(&state, now));

    let stream: EventStream = match today.as_ref().and_then(|d| iftar_instant(&state, d)) {
        Some(target) => {
            tracing::debug!(region, target = %target, "Starting iftar countdown stream");
            let clock = state.clock.clone();
            countdown_stream(target, move || clock())
                .map(|countdown| {
                    let name = if countdown.is_passed() { "passed" } else { "tick" };
                    Event::default().event(name).json_data(countdown)
                })
                .boxed()
        }
        None => stream::once(async {
            Event::default()
                .event("no_schedule")
                .json_data(IftarStatus::NoSchedule)
        })
        .boxed(),
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
