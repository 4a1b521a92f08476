// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Ramadan Tracker: companion backend for the month of fasting
//!
//! This crate serves prayer and fasting schedules, daily duas, live iftar
//! countdowns, and a per-user daily ibadah tracker.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use chrono::{DateTime, Utc};
use config::Config;
use db::DocumentStore;
use middleware::auth::RevokedSessions;
use services::{AuthService, DuaService, RamadanCalendar, ScheduleService, TrackerService};
use std::sync::Arc;

/// Source of the current time, replaceable in tests.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub auth: Arc<dyn AuthService>,
    pub schedules: ScheduleService,
    pub duas: DuaService,
    pub trackers: TrackerService,
    pub calendar: RamadanCalendar,
    pub revoked_sessions: RevokedSessions,
    pub clock: Clock,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn DocumentStore>, auth: Arc<dyn AuthService>) -> Self {
        Self {
            calendar: RamadanCalendar::from_config(&config),
            schedules: ScheduleService::new(store.clone()),
            duas: DuaService::new(store.clone()),
            trackers: TrackerService::new(store),
            revoked_sessions: RevokedSessions::new(),
            clock: Arc::new(Utc::now),
            config,
            auth,
        }
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}
