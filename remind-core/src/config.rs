//! Application configuration constants
//!
//! Central location for capacity limits, reminder timings, storage keys
//! and notification identifiers used throughout the application.

// ===== Note Limits =====

/// Maximum number of notes that may be active at the same time
pub const MAX_ACTIVE_NOTES: usize = 5;

/// Risk level (inclusive) from which a note counts as high-risk
pub const HIGH_RISK_THRESHOLD: u8 = 4;

// ===== Reminder Timings =====

/// Repeat interval for high-risk reminders in seconds (hourly)
pub const HIGH_RISK_REPEAT_SECS: u64 = 3600;

/// Snooze offset applied by the "Snooze 15m" notification action
pub const ACTION_SNOOZE_MINUTES: i64 = 15;

/// Snooze offset used by the popover's snooze button
pub const DEFAULT_SNOOZE_HOURS: i64 = 1;

// ===== Menu Bar =====

/// Title shown in the menu bar when there are no active notes
pub const MENU_TITLE_EMPTY: &str = " Remind";

/// Longest note text shown in the menu bar before it is cut off with "..."
pub const MENU_TITLE_MAX_CHARS: usize = 25;

// ===== Persistence =====

/// File name of the key-value document inside the app data directory
pub const DEFAULTS_FILE_NAME: &str = "defaults.json";

/// Storage key for the serialized note collection
pub const NOTES_STORAGE_KEY: &str = "remind.notes.v1";

/// Storage key for the "show active count only" menu bar preference
pub const SHOW_COUNT_ONLY_KEY: &str = "remind.settings.showCountOnly";

// ===== Notification Identifiers =====

/// Category attached to reminders that offer complete/snooze/dismiss actions
pub const DUE_REMINDER_CATEGORY: &str = "DUE_REMINDER";

pub const COMPLETE_ACTION: &str = "COMPLETE_ACTION";
pub const SNOOZE_ACTION: &str = "SNOOZE_ACTION";
pub const CANCEL_ACTION: &str = "CANCEL_ACTION";

/// Action reported when the user dismisses a notification without choosing an action
pub const SYSTEM_DISMISS_ACTION: &str = "com.apple.UNNotificationDismissActionIdentifier";

/// Action reported when the user clicks the notification body
pub const SYSTEM_DEFAULT_ACTION: &str = "com.apple.UNNotificationDefaultActionIdentifier";
