use serde::{Deserialize, Serialize};

use crate::chain::reconstruct;
use crate::state::TabNavigationState;
use crate::status::{
    is_http_error, is_http_status, is_redirect, is_sentinel_error, is_success, STATUS_LOOP,
    STATUS_PENDING,
};

const MAX_BADGE_TEXT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeColor {
    Neutral,
    Success,
    Redirect,
    Error,
}

impl BadgeColor {
    pub fn hex(self) -> &'static str {
        match self {
            BadgeColor::Neutral => "#6c757d",
            BadgeColor::Success => "#28a745",
            BadgeColor::Redirect => "#ffc107",
            BadgeColor::Error => "#e5534b",
        }
    }
}

/// Compact toolbar status for a tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub text: String,
    pub color: BadgeColor,
}

impl Badge {
    pub fn loading() -> Self {
        Self {
            text: "...".to_string(),
            color: BadgeColor::Neutral,
        }
    }

    /// No badge at all (browser-internal pages).
    pub fn cleared() -> Self {
        Self {
            text: String::new(),
            color: BadgeColor::Neutral,
        }
    }

    pub fn for_status(status: i32) -> Self {
        let text = if is_http_status(status) {
            status.to_string()
        } else if status == STATUS_LOOP {
            "LOOP".to_string()
        } else if is_sentinel_error(status) {
            "ERR".to_string()
        } else if status == STATUS_PENDING {
            "...".to_string()
        } else {
            "?".to_string()
        };

        let color = if is_success(status) {
            BadgeColor::Success
        } else if is_redirect(status) {
            BadgeColor::Redirect
        } else if is_http_error(status) || is_sentinel_error(status) {
            BadgeColor::Error
        } else {
            BadgeColor::Neutral
        };

        Self {
            text: text.chars().take(MAX_BADGE_TEXT).collect(),
            color,
        }
    }
}

/// Derives the badge for a tab from its navigation state.
pub fn derive_badge(state: Option<&TabNavigationState>) -> Badge {
    match state {
        Some(state) if state.has_steps() => Badge::for_status(reconstruct(Some(state)).final_status),
        _ => Badge::loading(),
    }
}

/// Pages the browser does not let extensions inspect.
pub fn is_internal_page(url: &str) -> bool {
    ["chrome://", "about:", "file://"]
        .iter()
        .any(|prefix| url.starts_with(prefix))
}
