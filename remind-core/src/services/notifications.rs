//! Notifications service
//!
//! Translates note state into local notification requests and hands them
//! to the host's notification center. Requests are keyed purely by note id
//! through a reversible identifier scheme:
//!
//! - `<id>`: snooze wake-up
//! - `high_risk_<id>`: hourly reminder for risk >= 4
//! - `due_<lead>_<id>`: due-date reminder, `<lead>` one of `15m`, `1h`, `3h`
//!
//! The note id is always the part after the last `_`.

use crate::clock::Clock;
use crate::config::{
    CANCEL_ACTION, COMPLETE_ACTION, DUE_REMINDER_CATEGORY, HIGH_RISK_REPEAT_SECS, SNOOZE_ACTION,
};
use crate::error::Result;
use crate::models::Note;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

const HIGH_RISK_PREFIX: &str = "high_risk";
const DUE_PREFIX: &str = "due";

/// Offset before a due date at which a reminder fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadInterval {
    FifteenMinutes,
    OneHour,
    ThreeHours,
}

impl LeadInterval {
    pub const ALL: [LeadInterval; 3] = [
        LeadInterval::FifteenMinutes,
        LeadInterval::OneHour,
        LeadInterval::ThreeHours,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            LeadInterval::FifteenMinutes => "15m",
            LeadInterval::OneHour => "1h",
            LeadInterval::ThreeHours => "3h",
        }
    }

    pub fn duration(self) -> Duration {
        match self {
            LeadInterval::FifteenMinutes => Duration::minutes(15),
            LeadInterval::OneHour => Duration::hours(1),
            LeadInterval::ThreeHours => Duration::hours(3),
        }
    }
}

/// Which reminder a notification identifier belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderKind {
    SnoozeEnded,
    HighRisk,
    DueSoon(LeadInterval),
}

impl ReminderKind {
    /// Every kind a note can have pending
    pub const ALL: [ReminderKind; 5] = [
        ReminderKind::SnoozeEnded,
        ReminderKind::HighRisk,
        ReminderKind::DueSoon(LeadInterval::FifteenMinutes),
        ReminderKind::DueSoon(LeadInterval::OneHour),
        ReminderKind::DueSoon(LeadInterval::ThreeHours),
    ];

    pub fn identifier(self, note_id: Uuid) -> String {
        match self {
            ReminderKind::SnoozeEnded => note_id.to_string(),
            ReminderKind::HighRisk => format!("{}_{}", HIGH_RISK_PREFIX, note_id),
            ReminderKind::DueSoon(lead) => format!("{}_{}_{}", DUE_PREFIX, lead.tag(), note_id),
        }
    }
}

/// Every identifier that could be pending for `note_id`
pub fn identifiers_for(note_id: Uuid) -> Vec<String> {
    ReminderKind::ALL
        .iter()
        .map(|kind| kind.identifier(note_id))
        .collect()
}

/// Recover the note id from a notification identifier
pub fn note_id_from_identifier(identifier: &str) -> Option<Uuid> {
    let candidate = match identifier.rfind('_') {
        Some(pos) => &identifier[pos + 1..],
        None => identifier,
    };
    Uuid::parse_str(candidate).ok()
}

/// When a notification fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Fire after `seconds`, optionally repeating at that interval
    TimeInterval { seconds: u64, repeats: bool },
    /// Fire once at a calendar date
    Date { at: DateTime<Utc> },
}

impl Trigger {
    pub fn repeats(&self) -> bool {
        match self {
            Trigger::TimeInterval { repeats, .. } => *repeats,
            Trigger::Date { .. } => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationSound {
    Default,
    DefaultCritical,
}

/// How strongly the notification may break through focus modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptionLevel {
    Passive,
    Active,
    TimeSensitive,
    Critical,
}

/// A local notification to be scheduled by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub identifier: String,
    pub title: String,
    pub body: String,
    pub trigger: Trigger,
    pub sound: NotificationSound,
    pub interruption_level: InterruptionLevel,
    pub category: Option<String>,
}

/// A button offered on a delivered notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationAction {
    pub identifier: String,
    pub title: String,
    /// Bring the app to the foreground when chosen
    pub foreground: bool,
    pub destructive: bool,
}

/// A group of actions attached to notifications by category identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationCategory {
    pub identifier: String,
    pub actions: Vec<NotificationAction>,
    /// Report plain dismissals as an action too
    pub custom_dismiss_action: bool,
}

/// Categories registered at startup
pub fn reminder_categories() -> Vec<NotificationCategory> {
    vec![NotificationCategory {
        identifier: DUE_REMINDER_CATEGORY.to_string(),
        actions: vec![
            NotificationAction {
                identifier: COMPLETE_ACTION.to_string(),
                title: "Complete".to_string(),
                foreground: true,
                destructive: false,
            },
            NotificationAction {
                identifier: SNOOZE_ACTION.to_string(),
                title: "Snooze 15m".to_string(),
                foreground: false,
                destructive: false,
            },
            NotificationAction {
                identifier: CANCEL_ACTION.to_string(),
                title: "Dismiss".to_string(),
                foreground: false,
                destructive: true,
            },
        ],
        custom_dismiss_action: true,
    }]
}

/// The host's local notification subsystem.
///
/// Calls are fire-and-forget: an `Ok` only means the request was handed
/// over, not that it was accepted.
pub trait NotificationCenter: Send + Sync {
    /// Schedule `request`, replacing any pending request with the same identifier
    fn add(&self, request: NotificationRequest) -> Result<()>;

    /// Remove pending requests. Unknown identifiers are ignored.
    fn remove_pending(&self, identifiers: &[String]) -> Result<()>;

    fn set_categories(&self, _categories: &[NotificationCategory]) -> Result<()> {
        Ok(())
    }

    /// Ask the user for permission to show alerts. Returns whether it was granted.
    fn request_authorization(&self) -> Result<bool> {
        Ok(true)
    }
}

/// In-process notification center that tracks pending requests.
///
/// Nothing is ever delivered; hosts without a notification subsystem use it
/// as a sink, and tests use it to observe scheduling.
#[derive(Debug, Default)]
pub struct MemoryNotificationCenter {
    inner: Mutex<MemoryCenterState>,
}

#[derive(Debug, Default)]
struct MemoryCenterState {
    pending: Vec<NotificationRequest>,
    removals: Vec<Vec<String>>,
    categories: Vec<NotificationCategory>,
}

impl MemoryNotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryCenterState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Requests currently pending, in scheduling order
    pub fn pending(&self) -> Vec<NotificationRequest> {
        self.state().pending.clone()
    }

    pub fn pending_identifiers(&self) -> Vec<String> {
        self.state()
            .pending
            .iter()
            .map(|r| r.identifier.clone())
            .collect()
    }

    pub fn find(&self, identifier: &str) -> Option<NotificationRequest> {
        self.state()
            .pending
            .iter()
            .find(|r| r.identifier == identifier)
            .cloned()
    }

    /// Every `remove_pending` call received, in order
    pub fn removals(&self) -> Vec<Vec<String>> {
        self.state().removals.clone()
    }

    pub fn categories(&self) -> Vec<NotificationCategory> {
        self.state().categories.clone()
    }
}

impl NotificationCenter for MemoryNotificationCenter {
    fn add(&self, request: NotificationRequest) -> Result<()> {
        let mut state = self.state();
        state.pending.retain(|r| r.identifier != request.identifier);
        state.pending.push(request);
        Ok(())
    }

    fn remove_pending(&self, identifiers: &[String]) -> Result<()> {
        let mut state = self.state();
        state.pending.retain(|r| !identifiers.contains(&r.identifier));
        state.removals.push(identifiers.to_vec());
        Ok(())
    }

    fn set_categories(&self, categories: &[NotificationCategory]) -> Result<()> {
        self.state().categories = categories.to_vec();
        Ok(())
    }
}

/// Schedules and cancels the reminders belonging to notes
#[derive(Clone)]
pub struct NotificationScheduler {
    center: Arc<dyn NotificationCenter>,
    clock: Arc<dyn Clock>,
}

impl NotificationScheduler {
    pub fn new(center: Arc<dyn NotificationCenter>, clock: Arc<dyn Clock>) -> Self {
        Self { center, clock }
    }

    /// Register categories and ask for permission. Failures are logged.
    pub fn register(&self) {
        if let Err(e) = self.center.set_categories(&reminder_categories()) {
            tracing::error!("Failed to register notification categories: {}", e);
        }

        match self.center.request_authorization() {
            Ok(true) => tracing::info!("Notification permission granted"),
            Ok(false) => tracing::warn!("Notification permission denied"),
            Err(e) => tracing::error!("Failed to request notification permission: {}", e),
        }
    }

    /// Hourly repeating reminder for notes with risk >= 4
    pub fn schedule_high_risk_reminder(&self, note: &Note) {
        if !note.risk.is_high() {
            return;
        }

        self.submit(NotificationRequest {
            identifier: ReminderKind::HighRisk.identifier(note.id()),
            title: "⚠️ High Priority Reminder".to_string(),
            body: note.text.clone(),
            trigger: Trigger::TimeInterval {
                seconds: HIGH_RISK_REPEAT_SECS,
                repeats: true,
            },
            sound: NotificationSound::DefaultCritical,
            interruption_level: InterruptionLevel::TimeSensitive,
            category: Some(DUE_REMINDER_CATEGORY.to_string()),
        });
    }

    /// One reminder per lead interval whose fire time is still ahead.
    ///
    /// Returns how many requests were handed to the center.
    pub fn schedule_due_date_reminders(&self, note: &Note) -> usize {
        let Some(due) = note.due_date else {
            return 0;
        };

        let now = self.clock.now();
        let mut scheduled = 0;

        for lead in LeadInterval::ALL {
            let Some(fire_at) = due.checked_sub_signed(lead.duration()) else {
                tracing::debug!(
                    "Skipping {} reminder for note {}, fire time out of range",
                    lead.tag(),
                    note.id()
                );
                continue;
            };
            if fire_at <= now {
                tracing::debug!(
                    "Skipping {} reminder for note {}, fire time already passed",
                    lead.tag(),
                    note.id()
                );
                continue;
            }

            self.submit(NotificationRequest {
                identifier: ReminderKind::DueSoon(lead).identifier(note.id()),
                title: "Reminder Due Soon".to_string(),
                body: format!("{} is due in {}.", note.text, lead.tag()),
                trigger: Trigger::Date { at: fire_at },
                sound: NotificationSound::Default,
                interruption_level: InterruptionLevel::TimeSensitive,
                category: Some(DUE_REMINDER_CATEGORY.to_string()),
            });
            scheduled += 1;
        }

        scheduled
    }

    /// One-shot alert when a snoozed note wakes up
    pub fn schedule_snooze(&self, note: &Note) {
        let Some(until) = note.snooze_until() else {
            return;
        };

        self.submit(NotificationRequest {
            identifier: ReminderKind::SnoozeEnded.identifier(note.id()),
            title: "Reminder Snooze Ended".to_string(),
            body: note.text.clone(),
            trigger: Trigger::Date { at: until },
            sound: NotificationSound::Default,
            interruption_level: InterruptionLevel::Active,
            category: None,
        });
    }

    /// Remove every reminder that could be pending for `note_id`
    pub fn cancel_all(&self, note_id: Uuid) {
        let identifiers = identifiers_for(note_id);
        match self.center.remove_pending(&identifiers) {
            Ok(()) => tracing::debug!("Cancelled reminders for note {}", note_id),
            Err(e) => tracing::error!("Failed to cancel reminders for note {}: {}", note_id, e),
        }
    }

    fn submit(&self, request: NotificationRequest) {
        let identifier = request.identifier.clone();
        match self.center.add(request) {
            Ok(()) => tracing::debug!("Scheduled notification {}", identifier),
            Err(e) => tracing::error!("Failed to schedule notification {}: {}", identifier, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::AppError;
    use crate::models::RiskLevel;
    use chrono::TimeZone;

    #[derive(Debug, Default)]
    struct UnavailableNotificationCenter;

    impl NotificationCenter for UnavailableNotificationCenter {
        fn add(&self, request: NotificationRequest) -> Result<()> {
            Err(AppError::Notification(format!(
                "Notifications unavailable, dropped {}",
                request.identifier
            )))
        }

        fn remove_pending(&self, _identifiers: &[String]) -> Result<()> {
            Err(AppError::Notification("Notifications unavailable".to_string()))
        }

        fn request_authorization(&self) -> Result<bool> {
            Ok(false)
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap()
    }

    fn create_test_scheduler() -> (NotificationScheduler, Arc<MemoryNotificationCenter>) {
        let center = Arc::new(MemoryNotificationCenter::new());
        let scheduler = NotificationScheduler::new(center.clone(), Arc::new(ManualClock::new(now())));
        (scheduler, center)
    }

    #[test]
    fn test_identifiers_round_trip_to_note_id() {
        let id = Uuid::new_v4();
        for identifier in identifiers_for(id) {
            assert_eq!(note_id_from_identifier(&identifier), Some(id), "{}", identifier);
        }
        assert_eq!(
            identifiers_for(id),
            vec![
                id.to_string(),
                format!("high_risk_{}", id),
                format!("due_15m_{}", id),
                format!("due_1h_{}", id),
                format!("due_3h_{}", id),
            ]
        );
    }

    #[test]
    fn test_malformed_identifiers_resolve_to_nothing() {
        assert_eq!(note_id_from_identifier(""), None);
        assert_eq!(note_id_from_identifier("high_risk_"), None);
        assert_eq!(note_id_from_identifier("due_15m_not-a-uuid"), None);
        assert_eq!(note_id_from_identifier("backup-complete"), None);
    }

    #[test]
    fn test_uppercase_ids_are_accepted() {
        let id = Uuid::new_v4();
        let identifier = format!("high_risk_{}", id.to_string().to_uppercase());
        assert_eq!(note_id_from_identifier(&identifier), Some(id));
    }

    #[test]
    fn test_high_risk_only_for_risk_four_and_up() {
        let (scheduler, center) = create_test_scheduler();

        let low = Note::new("Low", RiskLevel::Three, None, now());
        scheduler.schedule_high_risk_reminder(&low);
        assert!(center.pending().is_empty());

        let high = Note::new("High", RiskLevel::Four, None, now());
        scheduler.schedule_high_risk_reminder(&high);

        let request = center
            .find(&format!("high_risk_{}", high.id()))
            .expect("high risk reminder scheduled");
        assert_eq!(request.body, "High");
        assert!(request.trigger.repeats());
        assert_eq!(
            request.trigger,
            Trigger::TimeInterval {
                seconds: 3600,
                repeats: true
            }
        );
        assert_eq!(request.interruption_level, InterruptionLevel::TimeSensitive);
        assert_eq!(request.category.as_deref(), Some("DUE_REMINDER"));
    }

    #[test]
    fn test_due_reminders_skip_past_lead_times() {
        let (scheduler, center) = create_test_scheduler();

        // 2 hours out: 15m and 1h fire in the future, 3h is already past
        let note = Note::new("Dentist", RiskLevel::Two, Some(now() + Duration::hours(2)), now());
        assert_eq!(scheduler.schedule_due_date_reminders(&note), 2);

        let ids = center.pending_identifiers();
        assert!(ids.contains(&format!("due_15m_{}", note.id())));
        assert!(ids.contains(&format!("due_1h_{}", note.id())));
        assert!(!ids.contains(&format!("due_3h_{}", note.id())));

        let fifteen = center.find(&format!("due_15m_{}", note.id())).unwrap();
        assert_eq!(fifteen.body, "Dentist is due in 15m.");
        assert_eq!(
            fifteen.trigger,
            Trigger::Date {
                at: now() + Duration::minutes(105)
            }
        );
        assert!(!fifteen.trigger.repeats());
    }

    #[test]
    fn test_due_reminder_at_exactly_now_is_skipped() {
        let (scheduler, center) = create_test_scheduler();

        let note = Note::new("Edge", RiskLevel::One, Some(now() + Duration::minutes(15)), now());
        assert_eq!(scheduler.schedule_due_date_reminders(&note), 0);
        assert!(center.pending().is_empty());
    }

    #[test]
    fn test_unrepresentable_fire_times_are_skipped() {
        let (scheduler, center) = create_test_scheduler();

        let note = Note::new("Ancient", RiskLevel::One, Some(DateTime::<Utc>::MIN_UTC), now());
        assert_eq!(scheduler.schedule_due_date_reminders(&note), 0);
        assert!(center.pending().is_empty());
    }

    #[test]
    fn test_no_due_date_schedules_nothing() {
        let (scheduler, center) = create_test_scheduler();
        let note = Note::new("Someday", RiskLevel::One, None, now());
        assert_eq!(scheduler.schedule_due_date_reminders(&note), 0);
        assert!(center.pending().is_empty());
    }

    #[test]
    fn test_snooze_alert_keyed_by_bare_id() {
        let (scheduler, center) = create_test_scheduler();

        let mut note = Note::new("Stretch", RiskLevel::One, None, now());
        scheduler.schedule_snooze(&note);
        assert!(center.pending().is_empty());

        note.snooze(now() + Duration::hours(1));
        scheduler.schedule_snooze(&note);

        let request = center.find(&note.id().to_string()).unwrap();
        assert_eq!(request.title, "Reminder Snooze Ended");
        assert_eq!(
            request.trigger,
            Trigger::Date {
                at: now() + Duration::hours(1)
            }
        );
    }

    #[test]
    fn test_cancel_all_removes_every_variant() {
        let (scheduler, center) = create_test_scheduler();

        let note = Note::new("Taxes", RiskLevel::Five, Some(now() + Duration::hours(5)), now());
        scheduler.schedule_high_risk_reminder(&note);
        scheduler.schedule_due_date_reminders(&note);
        assert_eq!(center.pending().len(), 4);

        scheduler.cancel_all(note.id());
        assert!(center.pending().is_empty());
        assert_eq!(center.removals(), vec![identifiers_for(note.id())]);
    }

    #[test]
    fn test_failures_are_swallowed() {
        let scheduler = NotificationScheduler::new(
            Arc::new(UnavailableNotificationCenter),
            Arc::new(ManualClock::new(now())),
        );
        let note = Note::new("Boom", RiskLevel::Five, Some(now() + Duration::hours(4)), now());

        scheduler.register();
        scheduler.schedule_high_risk_reminder(&note);
        assert_eq!(scheduler.schedule_due_date_reminders(&note), 3);
        scheduler.cancel_all(note.id());
    }

    #[test]
    fn test_register_installs_categories() {
        let (scheduler, center) = create_test_scheduler();
        scheduler.register();

        let categories = center.categories();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].identifier, "DUE_REMINDER");
        let actions: Vec<_> = categories[0]
            .actions
            .iter()
            .map(|a| a.identifier.as_str())
            .collect();
        assert_eq!(actions, vec!["COMPLETE_ACTION", "SNOOZE_ACTION", "CANCEL_ACTION"]);
    }
}
