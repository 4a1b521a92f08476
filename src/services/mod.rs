// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod calendar;
pub mod countdown;
pub mod dua;
pub mod google_oidc;
pub mod identity;
pub mod schedule;
pub mod tracker;

pub use calendar::{greeting, greeting_at, ProgressLevel, RamadanCalendar};
pub use countdown::{countdown_stream, time_left, Countdown, TimeLeft};
pub use dua::DuaService;
pub use google_oidc::{GoogleIdTokenVerifier, GoogleIdentity, OidcError};
pub use identity::{AuthErrorCode, AuthService, SessionEvent, StoreIdentityProvider};
pub use schedule::ScheduleService;
pub use tracker::{TrackerMode, TrackerService, TrackerSnapshot};
