// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user daily tracker sessions.
//!
//! A user who is editing has a live session holding the local completion
//! set. Toggles only touch that local state; `save` writes the whole document
//! back and ends the session. Viewing keeps nothing in memory: every page
//! visit reads the stored document. Operations on one user's session are
//! serialized by a per-user lock, including the store write during save.

use crate::db::{collections, DocumentStore};
use crate::error::AppError;
use crate::models::{Activity, TrackerDocument, TrackerKey, DAYS};
use crate::services::identity::SessionEvent;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, OwnedMutexGuard};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Whether the grid accepts toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum TrackerMode {
    Viewing,
    Editing,
}

#[derive(Debug)]
struct TrackerSession {
    document: TrackerDocument,
    mode: TrackerMode,
}

impl TrackerSession {
    fn new() -> Self {
        Self {
            document: TrackerDocument::new(),
            mode: TrackerMode::Viewing,
        }
    }

    fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot::new(&self.document, self.mode)
    }
}

type SessionHandle = Arc<Mutex<TrackerSession>>;

/// Completion for one day of the grid.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DayProgress {
    pub day: u8,
    pub completed: usize,
    pub percentage: u32,
}

/// Everything the tracker page renders.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TrackerSnapshot {
    pub mode: TrackerMode,
    /// Completed cells as `"<day>-<activity>"` keys.
    pub completed: Vec<String>,
    pub days: Vec<DayProgress>,
    pub total_completed: usize,
    pub perfect_days: usize,
    pub overall_percentage: u32,
}

impl TrackerSnapshot {
    pub fn new(document: &TrackerDocument, mode: TrackerMode) -> Self {
        Self {
            mode,
            completed: document.keys().map(|k| k.to_string()).collect(),
            days: (1..=DAYS)
                .map(|day| DayProgress {
                    day,
                    completed: document.completed_count(day),
                    percentage: document.day_percentage(day),
                })
                .collect(),
            total_completed: document.total_completed(),
            perfect_days: document.perfect_days(),
            overall_percentage: document.overall_percentage(),
        }
    }

    pub fn is_completed(&self, key: TrackerKey) -> bool {
        let key = key.to_string();
        self.completed.iter().any(|k| *k == key)
    }
}

/// Result of a toggle request.
#[derive(Debug, Clone, Serialize)]
pub struct ToggleOutcome {
    /// False when the session was not in editing mode.
    pub changed: bool,
    pub key: String,
    /// Presence of the key after the request.
    pub completed: bool,
    pub day: DayProgress,
}

impl ToggleOutcome {
    fn new(changed: bool, key: TrackerKey, document: &TrackerDocument) -> Self {
        Self {
            changed,
            key: key.to_string(),
            completed: document.contains(key),
            day: DayProgress {
                day: key.day(),
                completed: document.completed_count(key.day()),
                percentage: document.day_percentage(key.day()),
            },
        }
    }
}

/// Owns every editing session.
#[derive(Clone)]
pub struct TrackerService {
    store: Arc<dyn DocumentStore>,
    sessions: Arc<DashMap<String, SessionHandle>>,
}

impl TrackerService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            sessions: Arc::new(DashMap::new()),
        }
    }

    /// Lock the live session for `user_id`, creating one if `create` is set.
    ///
    /// A handle removed from the map while we waited for its lock is stale;
    /// the lookup is retried so that work never lands on a dropped session.
    async fn lock_session(
        &self,
        user_id: &str,
        create: bool,
    ) -> Option<(SessionHandle, OwnedMutexGuard<TrackerSession>)> {
        loop {
            let handle = if create {
                self.sessions
                    .entry(user_id.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(TrackerSession::new())))
                    .clone()
            } else {
                self.sessions.get(user_id)?.value().clone()
            };
            let guard = handle.clone().lock_owned().await;
            let current = self
                .sessions
                .get(user_id)
                .is_some_and(|s| Arc::ptr_eq(s.value(), &handle));
            if current {
                return Some((handle, guard));
            }
        }
    }

    /// Remove `handle` from the map unless it has already been replaced.
    fn release(&self, user_id: &str, handle: &SessionHandle) {
        self.sessions
            .remove_if(user_id, |_, s| Arc::ptr_eq(s, handle));
    }

    /// Fetch the stored document without touching any session.
    pub async fn remote_document(&self, user_id: &str) -> Result<TrackerDocument, AppError> {
        let fields = self.store.get(collections::TRACKERS, user_id).await?;
        Ok(fields
            .map(|f| TrackerDocument::from_fields(&f))
            .unwrap_or_default())
    }

    async fn stored_or_empty(&self, user_id: &str) -> TrackerDocument {
        match self.remote_document(user_id).await {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Failed to load tracker, starting empty");
                TrackerDocument::new()
            }
        }
    }

    /// Discard any unsaved edits and show the stored document.
    pub async fn load(&self, user_id: &str) -> TrackerSnapshot {
        if let Some((handle, _session)) = self.lock_session(user_id, false).await {
            self.release(user_id, &handle);
        }
        TrackerSnapshot::new(&self.stored_or_empty(user_id).await, TrackerMode::Viewing)
    }

    /// State for a page visit: unsaved edits are kept, otherwise reload.
    pub async fn open(&self, user_id: &str) -> TrackerSnapshot {
        if let Some((_, session)) = self.lock_session(user_id, false).await {
            if session.mode == TrackerMode::Editing {
                return session.snapshot();
            }
        }
        TrackerSnapshot::new(&self.stored_or_empty(user_id).await, TrackerMode::Viewing)
    }

    pub async fn enter_edit(&self, user_id: &str) -> TrackerSnapshot {
        let Some((_, mut session)) = self.lock_session(user_id, true).await else {
            return TrackerSnapshot::new(&TrackerDocument::new(), TrackerMode::Viewing);
        };
        if session.mode != TrackerMode::Editing {
            session.document = self.stored_or_empty(user_id).await;
            session.mode = TrackerMode::Editing;
            tracing::debug!(user_id = %user_id, "Tracker editing started");
        }
        session.snapshot()
    }

    /// Flip one cell locally. Ignored unless the user is editing.
    pub async fn toggle(&self, user_id: &str, key: TrackerKey) -> ToggleOutcome {
        let Some((_, mut session)) = self.lock_session(user_id, false).await else {
            tracing::debug!(user_id = %user_id, key = %key, "Ignoring toggle outside editing");
            return ToggleOutcome::new(false, key, &self.stored_or_empty(user_id).await);
        };

        let changed = session.mode == TrackerMode::Editing;
        if changed {
            session.document.toggle(key);
        }
        ToggleOutcome::new(changed, key, &session.document)
    }

    /// Overwrite the stored document with local state and end the session.
    ///
    /// On failure the session stays in editing mode with its changes.
    pub async fn save(&self, user_id: &str) -> Result<TrackerSnapshot, AppError> {
        let not_editing = || AppError::BadRequest("Tracker is not being edited".to_string());
        let (handle, mut session) = self
            .lock_session(user_id, false)
            .await
            .ok_or_else(not_editing)?;
        if session.mode != TrackerMode::Editing {
            return Err(not_editing());
        }

        let fields = session.document.to_fields();
        if let Err(e) = self
            .store
            .put(collections::TRACKERS, user_id, &fields)
            .await
        {
            tracing::error!(user_id = %user_id, error = %e, "Failed to save tracker");
            return Err(e);
        }

        session.mode = TrackerMode::Viewing;
        self.release(user_id, &handle);
        tracing::info!(
            user_id = %user_id,
            completed = fields.len(),
            "Tracker saved"
        );
        Ok(session.snapshot())
    }

    /// Drop a user's session, discarding unsaved edits.
    pub fn forget(&self, user_id: &str) {
        if self.sessions.remove(user_id).is_some() {
            tracing::debug!(user_id = %user_id, "Tracker session dropped");
        }
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Drop sessions as their users sign out, until the channel closes.
    pub fn evict_on_sign_out(
        &self,
        mut events: broadcast::Receiver<SessionEvent>,
    ) -> tokio::task::JoinHandle<()> {
        let trackers = self.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::SignedOut { user_id }) => trackers.forget(&user_id),
                    Ok(SessionEvent::SignedIn { .. }) => {}
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "Session event listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

/// Activity catalog entry for the grid header and legend.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityInfo {
    pub key: &'static str,
    pub label: &'static str,
    pub name: &'static str,
}

pub fn activity_catalog() -> Vec<ActivityInfo> {
    Activity::ALL
        .into_iter()
        .map(|a| ActivityInfo {
            key: a.key(),
            label: a.label(),
            name: a.full_name(),
        })
        .collect()
}
