//! Application state and initialization
//!
//! This module wires the note store, the notification scheduler and the
//! action dispatcher together. The host calls [`setup`] once on launch with
//! its data directory and notification center, and keeps the returned
//! [`AppState`] for the lifetime of the process.

use crate::clock::{Clock, SystemClock};
use crate::config::DEFAULTS_FILE_NAME;
use crate::error::{AppError, Result};
use crate::services::{
    ActionDispatcher, NoteStore, NotificationCenter, NotificationScheduler, SharedStore,
};
use crate::storage::FileDefaults;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Central application state
pub struct AppState {
    pub app_data_dir: PathBuf,
    pub store: SharedStore,
    pub actions: ActionDispatcher,
}

impl AppState {
    /// Stop the action dispatcher, applying anything still queued
    pub async fn shutdown(self) {
        self.actions.shutdown().await;
        tracing::info!("Application shut down");
    }
}

/// Install the global tracing subscriber.
///
/// Honours `RUST_LOG`; defaults to debug output for this crate.
pub fn init_logging() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "remind=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| AppError::Generic(format!("Failed to initialize logging: {}", e)))
}

/// Application setup - called once on startup from within a Tokio runtime.
///
/// Returns an error when no runtime is running.
pub fn setup(app_data_dir: PathBuf, center: Arc<dyn NotificationCenter>) -> Result<AppState> {
    setup_with_clock(app_data_dir, center, Arc::new(SystemClock))
}

/// [`setup`] with an explicit time source
pub fn setup_with_clock(
    app_data_dir: PathBuf,
    center: Arc<dyn NotificationCenter>,
    clock: Arc<dyn Clock>,
) -> Result<AppState> {
    tracing::info!("Initializing application");
    tracing::info!("App data directory: {:?}", app_data_dir);

    std::fs::create_dir_all(&app_data_dir)?;

    let defaults = Arc::new(FileDefaults::new(app_data_dir.join(DEFAULTS_FILE_NAME)));
    let scheduler = NotificationScheduler::new(center, clock.clone());
    scheduler.register();

    let store = NoteStore::load(defaults, scheduler, clock).into_shared();
    let actions = ActionDispatcher::spawn(store.clone())?;

    tracing::info!("Application initialized successfully");

    Ok(AppState {
        app_data_dir,
        store,
        actions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskLevel;
    use crate::services::MemoryNotificationCenter;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_setup_creates_data_dir_and_registers_categories() {
        let temp_dir = TempDir::new().unwrap();
        let app_data_dir = temp_dir.path().join("Remind");
        let center = Arc::new(MemoryNotificationCenter::new());

        let state = setup(app_data_dir.clone(), center.clone()).unwrap();

        assert!(app_data_dir.is_dir());
        assert_eq!(center.categories().len(), 1);
        assert!(state.store.lock().await.notes().is_empty());

        state.shutdown().await;
    }

    #[tokio::test]
    async fn test_notes_survive_restart() {
        let temp_dir = TempDir::new().unwrap();
        let app_data_dir = temp_dir.path().to_path_buf();

        {
            let state =
                setup(app_data_dir.clone(), Arc::new(MemoryNotificationCenter::new())).unwrap();
            assert!(state.store.lock().await.add_note("Renew lease", RiskLevel::Four, None));
            state.store.lock().await.set_show_count_only(true);
            state.shutdown().await;
        }

        let state =
            setup(app_data_dir.clone(), Arc::new(MemoryNotificationCenter::new())).unwrap();
        {
            let store = state.store.lock().await;
            assert_eq!(store.notes().len(), 1);
            assert_eq!(store.notes()[0].text, "Renew lease");
            assert!(store.show_count_only());
        }
        assert!(app_data_dir.join("defaults.json").exists());
        state.shutdown().await;
    }

    #[test]
    fn test_setup_outside_runtime_is_an_error() {
        let temp_dir = TempDir::new().unwrap();

        let result = setup(
            temp_dir.path().to_path_buf(),
            Arc::new(MemoryNotificationCenter::new()),
        );
        assert!(matches!(result, Err(AppError::Generic(_))));
    }
}
