//! Services module
//!
//! Business logic: the note store, notification scheduling, and the
//! dispatcher that feeds notification actions back into the store.

pub mod actions;
pub mod notes;
pub mod notifications;
pub mod status;

pub use actions::{ActionDispatcher, NotificationResponse, ResponseAction, ResponseSender};
pub use notes::{NoteStore, SharedStore};
pub use notifications::{
    MemoryNotificationCenter, NotificationCenter, NotificationRequest, NotificationScheduler,
};
pub use status::MenuBarTitle;
