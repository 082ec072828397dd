//! One-way notification surface.
//!
//! Every failure and every user-visible acknowledgement goes through
//! [`Notification`]. The [`NotificationCenter`] keeps the ones still on
//! screen and drops them once the display interval and fade have elapsed.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde::Serialize;

use parlor_shared::constants::{NOTIFICATION_DISPLAY_MS, NOTIFICATION_FADE_MS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPhase {
    Visible,
    Fading,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    pub issued_at: Instant,
}

impl Notification {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            issued_at: Instant::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Info)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Success)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Error)
    }

    pub fn phase(&self, now: Instant, display: Duration, fade: Duration) -> NotificationPhase {
        let age = now.saturating_duration_since(self.issued_at);
        if age < display {
            NotificationPhase::Visible
        } else if age < display + fade {
            NotificationPhase::Fading
        } else {
            NotificationPhase::Expired
        }
    }
}

/// Notifications currently on screen, oldest first.
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    active: VecDeque<Notification>,
    display: Duration,
    fade: Duration,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(NOTIFICATION_DISPLAY_MS),
            Duration::from_millis(NOTIFICATION_FADE_MS),
        )
    }
}

impl NotificationCenter {
    pub fn new(display: Duration, fade: Duration) -> Self {
        Self {
            active: VecDeque::new(),
            display,
            fade,
        }
    }

    pub fn push(&mut self, notification: Notification) {
        self.active.push_back(notification);
    }

    /// Drop expired notifications. Returns how many were removed.
    pub fn prune(&mut self, now: Instant) -> usize {
        let before = self.active.len();
        let (display, fade) = (self.display, self.fade);
        self.active
            .retain(|n| n.phase(now, display, fade) != NotificationPhase::Expired);
        before - self.active.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.active.iter()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
