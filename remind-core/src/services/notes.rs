//! Note store
//!
//! Owns the authoritative note collection. Every mutating operation
//! applies its state change, calls [`NoteStore::persist`], and only then
//! asks the notification scheduler to (re)schedule or cancel reminders.
//!
//! Unknown ids are silent no-ops and storage or scheduling failures are
//! logged, never returned: the in-memory collection stays authoritative.

use crate::clock::Clock;
use crate::config::{
    ACTION_SNOOZE_MINUTES, DEFAULT_SNOOZE_HOURS, MAX_ACTIVE_NOTES, NOTES_STORAGE_KEY,
    SHOW_COUNT_ONLY_KEY,
};
use crate::models::{Note, NoteStatus, RiskLevel};
use crate::services::notifications::NotificationScheduler;
use crate::services::status::{menu_bar_title, MenuBarTitle};
use crate::storage::KeyValueStore;
use chrono::{DateTime, Duration, Local, Utc};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Store handle shared between the UI and the notification action dispatcher
pub type SharedStore = Arc<tokio::sync::Mutex<NoteStore>>;

/// Snooze length used by the popover's snooze button
pub fn default_snooze() -> Duration {
    Duration::hours(DEFAULT_SNOOZE_HOURS)
}

/// Snooze length used by the "Snooze 15m" notification action
pub fn action_snooze() -> Duration {
    Duration::minutes(ACTION_SNOOZE_MINUTES)
}

pub struct NoteStore {
    notes: Vec<Note>,
    show_count_only: bool,
    defaults: Arc<dyn KeyValueStore>,
    scheduler: NotificationScheduler,
    clock: Arc<dyn Clock>,
}

impl NoteStore {
    /// Load persisted notes and preferences.
    ///
    /// Missing or unreadable data starts the store empty.
    pub fn load(
        defaults: Arc<dyn KeyValueStore>,
        scheduler: NotificationScheduler,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let notes = load_notes(defaults.as_ref());
        let show_count_only = load_show_count_only(defaults.as_ref());

        tracing::info!(
            "Loaded {} notes ({} active)",
            notes.len(),
            notes.iter().filter(|n| n.is_active()).count()
        );

        Self {
            notes,
            show_count_only,
            defaults,
            scheduler,
            clock,
        }
    }

    /// Wrap the store for sharing with the action dispatcher
    pub fn into_shared(self) -> SharedStore {
        Arc::new(tokio::sync::Mutex::new(self))
    }

    /// Every note, including completed and snoozed ones, in insertion order
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn note(&self, id: Uuid) -> Option<&Note> {
        self.notes.iter().find(|n| n.id() == id)
    }

    /// Active notes, highest risk first; equal risks keep insertion order
    pub fn active_notes(&self) -> Vec<&Note> {
        let mut active: Vec<&Note> = self.notes.iter().filter(|n| n.is_active()).collect();
        active.sort_by(|a, b| b.risk.cmp(&a.risk));
        active
    }

    pub fn highest_risk_note(&self) -> Option<&Note> {
        self.active_notes().into_iter().next()
    }

    pub fn active_count(&self) -> usize {
        self.notes.iter().filter(|n| n.is_active()).count()
    }

    pub fn can_add_note(&self) -> bool {
        self.active_count() < MAX_ACTIVE_NOTES
    }

    /// Add a new active note.
    ///
    /// Returns false, leaving the store untouched, when the active list is
    /// already full. Persists, then schedules the high-risk and due-date
    /// reminders the note qualifies for.
    pub fn add_note(
        &mut self,
        text: impl Into<String>,
        risk: RiskLevel,
        due_date: Option<DateTime<Utc>>,
    ) -> bool {
        if !self.can_add_note() {
            tracing::info!("Active note limit of {} reached", MAX_ACTIVE_NOTES);
            return false;
        }

        let note = Note::new(text, risk, due_date, self.clock.now());
        tracing::info!("Adding note {} with risk {}", note.id(), risk.value());
        self.notes.push(note.clone());
        self.persist();

        self.scheduler.schedule_high_risk_reminder(&note);
        self.scheduler.schedule_due_date_reminders(&note);

        true
    }

    /// Replace a note's text, risk and due date.
    ///
    /// Pending reminders are cancelled and rebuilt from the new values:
    /// active notes get high-risk and due-date reminders, snoozed notes get
    /// their wake alert, completed notes get nothing.
    pub fn update_note(
        &mut self,
        id: Uuid,
        text: impl Into<String>,
        risk: RiskLevel,
        due_date: Option<DateTime<Utc>>,
    ) {
        let Some(note) = self.notes.iter_mut().find(|n| n.id() == id) else {
            tracing::debug!("Ignoring update for unknown note {}", id);
            return;
        };

        note.text = text.into();
        note.risk = risk;
        note.due_date = due_date;
        let note = note.clone();
        tracing::debug!("Updated note {}", id);
        self.persist();

        self.scheduler.cancel_all(id);
        match note.status() {
            NoteStatus::Active => {
                self.scheduler.schedule_high_risk_reminder(&note);
                self.scheduler.schedule_due_date_reminders(&note);
            }
            NoteStatus::Snoozed => self.scheduler.schedule_snooze(&note),
            NoteStatus::Completed => {}
        }
    }

    /// Mark a note completed and cancel its reminders.
    ///
    /// Completing an already completed note keeps the original completion time.
    pub fn complete_note(&mut self, id: Uuid) {
        let now = self.clock.now();
        let Some(note) = self.notes.iter_mut().find(|n| n.id() == id) else {
            tracing::debug!("Ignoring completion for unknown note {}", id);
            return;
        };

        if note.status() == NoteStatus::Completed {
            tracing::debug!("Note {} is already completed", id);
            return;
        }

        note.complete(now);
        tracing::info!("Completed note {}", id);
        self.persist();

        self.scheduler.cancel_all(id);
    }

    /// Snooze a note until `until`, replacing its reminders with a single wake alert
    pub fn snooze_note(&mut self, id: Uuid, until: DateTime<Utc>) {
        let Some(note) = self.notes.iter_mut().find(|n| n.id() == id) else {
            tracing::debug!("Ignoring snooze for unknown note {}", id);
            return;
        };

        note.snooze(until);
        let note = note.clone();
        tracing::info!("Snoozed note {} until {}", id, until);
        self.persist();

        self.scheduler.cancel_all(id);
        self.scheduler.schedule_snooze(&note);
    }

    /// Snooze a note for `duration` from now.
    ///
    /// A wake time past the representable range leaves the note untouched.
    pub fn snooze_note_for(&mut self, id: Uuid, duration: Duration) {
        let Some(until) = self.clock.now().checked_add_signed(duration) else {
            tracing::warn!("Ignoring snooze for note {}, wake time out of range", id);
            return;
        };
        self.snooze_note(id, until);
    }

    /// Remove a note permanently along with its reminders
    pub fn delete_note(&mut self, id: Uuid) {
        let Some(index) = self.notes.iter().position(|n| n.id() == id) else {
            tracing::debug!("Ignoring delete for unknown note {}", id);
            return;
        };

        self.scheduler.cancel_all(id);
        self.notes.remove(index);
        tracing::info!("Deleted note {}", id);
        self.persist();
    }

    /// Return snoozed notes whose wake time has passed to the active list.
    ///
    /// There is no timer behind this: callers run it before showing the
    /// active list. Notes wake earliest wake time first, and only while the
    /// active list has room; the rest stay snoozed until a later refresh
    /// finds space. Persists only when a note woke. Returns how many woke.
    pub fn refresh_snoozed_notes(&mut self) -> usize {
        let now = self.clock.now();
        let mut elapsed: Vec<(DateTime<Utc>, usize)> = self
            .notes
            .iter()
            .enumerate()
            .filter_map(|(index, note)| {
                note.snooze_until()
                    .filter(|until| *until <= now)
                    .map(|until| (until, index))
            })
            .collect();

        if elapsed.is_empty() {
            return 0;
        }

        elapsed.sort();
        let room = MAX_ACTIVE_NOTES.saturating_sub(self.active_count());

        let mut woken = 0;
        for (_, index) in elapsed.iter().take(room) {
            if self.notes[*index].wake_if_due(now) {
                woken += 1;
            }
        }

        let held = elapsed.len() - woken;
        if held > 0 {
            tracing::info!(
                "Active note limit of {} reached, {} snoozed notes stay snoozed",
                MAX_ACTIVE_NOTES,
                held
            );
        }

        if woken > 0 {
            tracing::info!("Woke {} snoozed notes", woken);
            self.persist();
        }

        woken
    }

    pub fn show_count_only(&self) -> bool {
        self.show_count_only
    }

    /// Toggle the menu bar between the top note's text and the active count
    pub fn set_show_count_only(&mut self, show_count_only: bool) {
        self.show_count_only = show_count_only;
        if let Err(e) = self
            .defaults
            .set(SHOW_COUNT_ONLY_KEY, Value::Bool(show_count_only))
        {
            tracing::error!("Failed to save menu bar preference: {}", e);
        }
    }

    /// Title for the status bar item, in the local time zone
    pub fn menu_bar_title(&self) -> MenuBarTitle {
        menu_bar_title(&self.active_notes(), self.show_count_only, &Local)
    }

    /// Write the note collection to storage.
    ///
    /// A failed save is logged; the next successful save catches up.
    pub fn persist(&self) {
        let value = match serde_json::to_value(&self.notes) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize notes: {}", e);
                return;
            }
        };

        if let Err(e) = self.defaults.set(NOTES_STORAGE_KEY, value) {
            tracing::error!("Failed to save notes: {}", e);
        }
    }
}

fn load_notes(defaults: &dyn KeyValueStore) -> Vec<Note> {
    let value = match defaults.get(NOTES_STORAGE_KEY) {
        Ok(Some(value)) => value,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!("Failed to read saved notes, starting empty: {}", e);
            return Vec::new();
        }
    };

    match serde_json::from_value::<Vec<Note>>(value) {
        Ok(notes) => notes,
        Err(e) => {
            tracing::warn!("Saved notes are corrupt, starting empty: {}", e);
            Vec::new()
        }
    }
}

fn load_show_count_only(defaults: &dyn KeyValueStore) -> bool {
    match defaults.get(SHOW_COUNT_ONLY_KEY) {
        Ok(Some(Value::Bool(flag))) => flag,
        Ok(Some(other)) => {
            tracing::warn!("Ignoring non-boolean menu bar preference: {}", other);
            false
        }
        Ok(None) => false,
        Err(e) => {
            tracing::warn!("Failed to read menu bar preference: {}", e);
            false
        }
    }
}
