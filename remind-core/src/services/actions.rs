//! Notification action dispatcher
//!
//! The host reports user interaction with delivered notifications from
//! whatever thread its notification subsystem uses. Responses are queued
//! on a channel and applied to the store one at a time by a single worker
//! task, which holds the store handle it was given at startup.

use crate::config::{
    CANCEL_ACTION, COMPLETE_ACTION, SNOOZE_ACTION, SYSTEM_DEFAULT_ACTION, SYSTEM_DISMISS_ACTION,
};
use crate::error::{AppError, Result};
use crate::services::notes::{action_snooze, NoteStore, SharedStore};
use crate::services::notifications::note_id_from_identifier;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// What the user did with a delivered notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseAction {
    Complete,
    Snooze,
    Dismiss,
    /// The notification body was clicked
    Open,
}

impl ResponseAction {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            COMPLETE_ACTION | "complete" => Some(ResponseAction::Complete),
            SNOOZE_ACTION | "snooze" => Some(ResponseAction::Snooze),
            CANCEL_ACTION | SYSTEM_DISMISS_ACTION | "dismiss" | "cancel" => {
                Some(ResponseAction::Dismiss)
            }
            SYSTEM_DEFAULT_ACTION | "default" | "open" => Some(ResponseAction::Open),
            _ => None,
        }
    }
}

/// A user response to a delivered notification, as reported by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationResponse {
    pub identifier: String,
    pub action: String,
}

impl NotificationResponse {
    pub fn new(identifier: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            action: action.into(),
        }
    }
}

/// Apply a response to the store.
///
/// Unresolvable identifiers and unknown actions are dropped. Returns the
/// action that was applied, if any.
pub fn apply_response(
    store: &mut NoteStore,
    response: &NotificationResponse,
) -> Option<ResponseAction> {
    let Some(note_id) = note_id_from_identifier(&response.identifier) else {
        tracing::debug!(
            "Dropping response for unrecognised notification {}",
            response.identifier
        );
        return None;
    };

    let Some(action) = ResponseAction::parse(&response.action) else {
        tracing::debug!("Ignoring unknown notification action {}", response.action);
        return None;
    };

    tracing::info!("Notification action {:?} for note {}", action, note_id);

    match action {
        ResponseAction::Complete => store.complete_note(note_id),
        ResponseAction::Snooze => store.snooze_note_for(note_id, action_snooze()),
        ResponseAction::Dismiss | ResponseAction::Open => {}
    }

    Some(action)
}

/// Cloneable handle the host's notification callback uses to report responses
#[derive(Debug, Clone)]
pub struct ResponseSender {
    tx: mpsc::UnboundedSender<NotificationResponse>,
}

impl ResponseSender {
    /// Queue a response. Safe to call from any thread.
    pub fn deliver(&self, identifier: impl Into<String>, action: impl Into<String>) {
        let response = NotificationResponse::new(identifier, action);
        if let Err(e) = self.tx.send(response) {
            tracing::error!(
                "Notification action dispatcher stopped, dropping response for {}",
                e.0.identifier
            );
        }
    }
}

/// Worker that applies notification responses to the shared store
pub struct ActionDispatcher {
    sender: ResponseSender,
    worker: JoinHandle<()>,
}

impl ActionDispatcher {
    /// Start the worker task on the current Tokio runtime.
    ///
    /// Fails when called outside a runtime.
    pub fn spawn(store: SharedStore) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| {
            AppError::Generic(format!(
                "Notification action dispatcher needs a Tokio runtime: {}",
                e
            ))
        })?;
        let (tx, mut rx) = mpsc::unbounded_channel::<NotificationResponse>();

        let worker = runtime.spawn(async move {
            tracing::info!("Notification action dispatcher started");

            while let Some(response) = rx.recv().await {
                let mut guard = store.lock().await;
                apply_response(&mut guard, &response);
            }

            tracing::info!("Notification action dispatcher stopped");
        });

        Ok(Self {
            sender: ResponseSender { tx },
            worker,
        })
    }

    pub fn sender(&self) -> ResponseSender {
        self.sender.clone()
    }

    pub fn deliver(&self, identifier: impl Into<String>, action: impl Into<String>) {
        self.sender.deliver(identifier, action);
    }

    /// Stop accepting responses from this handle and wait until everything
    /// already queued has been applied.
    ///
    /// Senders cloned with [`ActionDispatcher::sender`] keep the worker
    /// alive until they are dropped too.
    pub async fn shutdown(self) {
        drop(self.sender);
        if let Err(e) = self.worker.await {
            tracing::error!("Notification action dispatcher panicked: {}", e);
        }
    }
}
