// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed-in pages: the 30 daily duas and the ibadah tracker.
//! The session middleware is applied in routes/mod.rs for these routes.

use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{DailyDua, TrackerKey};
use crate::services::tracker::{activity_catalog, ActivityInfo, ToggleOutcome};
use crate::services::TrackerSnapshot;
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/daily-dua", get(daily_dua))
        .route("/daily-tracker", get(tracker_page))
        .route("/daily-tracker/edit", post(enter_edit))
        .route("/daily-tracker/toggle", post(toggle))
        .route("/daily-tracker/save", post(save))
}

// ─── Daily Dua ───────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct DailyDuaResponse {
    /// Current day of Ramadan, 0 before it starts.
    pub ramadan_day: u32,
    pub duas: Vec<DailyDua>,
}

async fn daily_dua(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<DailyDuaResponse> {
    let duas = state.duas.daily_duas().await;
    tracing::debug!(user_id = %user.user_id, count = duas.len(), "Serving daily duas");
    Json(DailyDuaResponse {
        ramadan_day: state.calendar.ramadan_day(state.now()),
        duas,
    })
}

// ─── Tracker ─────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TrackerPage {
    pub activities: Vec<ActivityInfo>,
    #[serde(flatten)]
    pub tracker: TrackerSnapshot,
}

impl TrackerPage {
    fn new(tracker: TrackerSnapshot) -> Self {
        Self {
            activities: activity_catalog(),
            tracker,
        }
    }
}

async fn tracker_page(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<TrackerPage> {
    Json(TrackerPage::new(state.trackers.open(&user.user_id).await))
}

async fn enter_edit(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<TrackerPage> {
    Json(TrackerPage::new(
        state.trackers.enter_edit(&user.user_id).await,
    ))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ToggleRequest {
    #[validate(range(min = 1, max = 30))]
    pub day: i64,
    #[validate(length(min = 1, max = 32))]
    pub activity: String,
}

impl ToggleRequest {
    fn key(&self) -> Result<TrackerKey> {
        self.validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        let activity = self
            .activity
            .parse()
            .map_err(|e: crate::models::TrackerKeyError| AppError::BadRequest(e.to_string()))?;
        TrackerKey::new(self.day, activity).map_err(|e| AppError::BadRequest(e.to_string()))
    }
}

async fn toggle(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<ToggleRequest>,
) -> Result<Json<ToggleOutcome>> {
    let key = request.key()?;
    Ok(Json(state.trackers.toggle(&user.user_id, key).await))
}

async fn save(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<TrackerPage>> {
    let snapshot = state.trackers.save(&user.user_id).await?;
    Ok(Json(TrackerPage::new(snapshot)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Activity;

    fn request(day: i64, activity: &str) -> ToggleRequest {
        ToggleRequest {
            day,
            activity: activity.to_string(),
        }
    }

    #[test]
    fn test_toggle_request_key() {
        let key = request(5, "namaz").key().unwrap();
        assert_eq!(key.day(), 5);
        assert_eq!(key.activity(), Activity::Namaz);
    }

    #[test]
    fn test_toggle_request_rejects_bad_input() {
        assert!(matches!(request(0, "namaz").key(), Err(AppError::BadRequest(_))));
        assert!(matches!(request(31, "namaz").key(), Err(AppError::BadRequest(_))));
        assert!(matches!(request(3, "nap").key(), Err(AppError::BadRequest(_))));
        assert!(matches!(request(3, "").key(), Err(AppError::BadRequest(_))));
    }
}
