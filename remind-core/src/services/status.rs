//! Menu bar title
//!
//! Derives what the status bar item shows from the active notes.

use crate::config::{MENU_TITLE_EMPTY, MENU_TITLE_MAX_CHARS};
use crate::models::{Note, RiskColor};
use chrono::TimeZone;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleWeight {
    Regular,
    Medium,
    Bold,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuBarTitle {
    pub text: String,
    /// `None` means the system label color
    pub color: Option<RiskColor>,
    pub weight: TitleWeight,
}

/// Build the title from active notes sorted highest risk first.
///
/// Due times are rendered as `HH:MM` in `tz`.
pub fn menu_bar_title<Tz>(active: &[&Note], show_count_only: bool, tz: &Tz) -> MenuBarTitle
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let Some(highest) = active.first() else {
        return MenuBarTitle {
            text: MENU_TITLE_EMPTY.to_string(),
            color: None,
            weight: TitleWeight::Regular,
        };
    };

    let color = Some(highest.risk.color());

    if show_count_only {
        return MenuBarTitle {
            text: format!(" {}", active.len()),
            color,
            weight: TitleWeight::Bold,
        };
    }

    let mut text = highest.text.trim().to_string();
    if let Some(due) = highest.due_date {
        text = format!("{} - {}", due.with_timezone(tz).format("%H:%M"), text);
    }

    if text.chars().count() > MENU_TITLE_MAX_CHARS {
        text = text.chars().take(MENU_TITLE_MAX_CHARS).collect::<String>() + "...";
    }

    MenuBarTitle {
        text: format!(" {}", text),
        color,
        weight: TitleWeight::Medium,
    }
}
