//! Remind library
//!
//! Core of the Remind menu-bar app: a capacity-limited, risk-ranked note
//! store that keeps local notification schedules in sync with note state.

pub mod app;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;
