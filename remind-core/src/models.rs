//! Note models
//!
//! Rust structs representing reminder notes and their lifecycle.
//! All models use serde; the persisted record layout is flat (camelCase
//! keys, optional timestamps), while in memory the status and its
//! timestamps live together in [`NoteState`].

use crate::config::HIGH_RISK_THRESHOLD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Urgency of a note, 1 (low) to 5 (critical)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RiskLevel {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
}

/// Display color associated with a risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskColor {
    Green,
    Yellow,
    Orange,
    Red,
    Purple,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::One,
        RiskLevel::Two,
        RiskLevel::Three,
        RiskLevel::Four,
        RiskLevel::Five,
    ];

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::One => "Low Risk",
            RiskLevel::Two => "Moderate",
            RiskLevel::Three => "High",
            RiskLevel::Four => "Urgent",
            RiskLevel::Five => "Critical",
        }
    }

    pub fn color(self) -> RiskColor {
        match self {
            RiskLevel::One => RiskColor::Green,
            RiskLevel::Two => RiskColor::Yellow,
            RiskLevel::Three => RiskColor::Orange,
            RiskLevel::Four => RiskColor::Red,
            RiskLevel::Five => RiskColor::Purple,
        }
    }

    /// High-risk notes get an hourly repeating reminder
    pub fn is_high(self) -> bool {
        self.value() >= HIGH_RISK_THRESHOLD
    }
}

impl TryFrom<u8> for RiskLevel {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(RiskLevel::One),
            2 => Ok(RiskLevel::Two),
            3 => Ok(RiskLevel::Three),
            4 => Ok(RiskLevel::Four),
            5 => Ok(RiskLevel::Five),
            other => Err(format!("Invalid risk level {}, expected 1-5", other)),
        }
    }
}

impl From<RiskLevel> for u8 {
    fn from(risk: RiskLevel) -> Self {
        risk.value()
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle tag of a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteStatus {
    Active,
    Completed,
    Snoozed,
}

/// Lifecycle state of a note together with the timestamp owned by that state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteState {
    Active,
    Completed { completed_at: DateTime<Utc> },
    Snoozed { until: DateTime<Utc> },
}

impl NoteState {
    pub fn status(&self) -> NoteStatus {
        match self {
            NoteState::Active => NoteStatus::Active,
            NoteState::Completed { .. } => NoteStatus::Completed,
            NoteState::Snoozed { .. } => NoteStatus::Snoozed,
        }
    }
}

/// A short reminder note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "NoteRecord", into = "NoteRecord")]
pub struct Note {
    id: Uuid,
    pub text: String,
    pub risk: RiskLevel,
    created_at: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    state: NoteState,
}

impl Note {
    /// Create a new active note with a fresh id
    pub fn new(
        text: impl Into<String>,
        risk: RiskLevel,
        due_date: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            risk,
            created_at,
            due_date,
            state: NoteState::Active,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn state(&self) -> NoteState {
        self.state
    }

    pub fn status(&self) -> NoteStatus {
        self.state.status()
    }

    pub fn is_active(&self) -> bool {
        self.state == NoteState::Active
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        match self.state {
            NoteState::Completed { completed_at } => Some(completed_at),
            _ => None,
        }
    }

    pub fn snooze_until(&self) -> Option<DateTime<Utc>> {
        match self.state {
            NoteState::Snoozed { until } => Some(until),
            _ => None,
        }
    }

    /// Mark the note completed at `at`
    pub fn complete(&mut self, at: DateTime<Utc>) {
        self.state = NoteState::Completed { completed_at: at };
    }

    /// Put the note to sleep until `until`
    pub fn snooze(&mut self, until: DateTime<Utc>) {
        self.state = NoteState::Snoozed { until };
    }

    /// Return a snoozed note to the active list if its snooze has elapsed.
    ///
    /// Returns true when the note was woken.
    pub fn wake_if_due(&mut self, now: DateTime<Utc>) -> bool {
        match self.state {
            NoteState::Snoozed { until } if until <= now => {
                self.state = NoteState::Active;
                true
            }
            _ => false,
        }
    }
}

/// Flat persisted layout of a note
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NoteRecord {
    id: Uuid,
    text: String,
    risk: RiskLevel,
    status: NoteStatus,
    created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    snooze_until: Option<DateTime<Utc>>,
}

impl From<Note> for NoteRecord {
    fn from(note: Note) -> Self {
        let completed_at = note.completed_at();
        let snooze_until = note.snooze_until();
        Self {
            id: note.id,
            text: note.text,
            risk: note.risk,
            status: note.state.status(),
            created_at: note.created_at,
            completed_at,
            due_date: note.due_date,
            snooze_until,
        }
    }
}

impl From<NoteRecord> for Note {
    fn from(record: NoteRecord) -> Self {
        let state = match record.status {
            NoteStatus::Active => NoteState::Active,
            NoteStatus::Completed => match record.completed_at {
                Some(completed_at) => NoteState::Completed { completed_at },
                None => {
                    tracing::warn!(
                        "Completed note {} has no completion time, using creation time",
                        record.id
                    );
                    NoteState::Completed {
                        completed_at: record.created_at,
                    }
                }
            },
            NoteStatus::Snoozed => match record.snooze_until {
                Some(until) => NoteState::Snoozed { until },
                None => {
                    tracing::warn!("Snoozed note {} has no wake time, reactivating", record.id);
                    NoteState::Active
                }
            },
        };

        if state.status() != NoteStatus::Completed && record.completed_at.is_some() {
            tracing::warn!("Dropping stray completion time on note {}", record.id);
        }
        if state.status() != NoteStatus::Snoozed && record.snooze_until.is_some() {
            tracing::warn!("Dropping stray snooze time on note {}", record.id);
        }

        Self {
            id: record.id,
            text: record.text,
            risk: record.risk,
            created_at: record.created_at,
            due_date: record.due_date,
            state,
        }
    }
}
