//! Toast notifications for user feedback
//!
//! A pending toast can be replaced in place by its outcome, so one save shows
//! one toast that moves from loading to success or failure.

use chrono::{DateTime, Utc};
use colored::Colorize;
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use tracing::{error, info};
use uuid::Uuid;

/// Shown while a status update is in flight
pub const SAVING_MESSAGE: &str = "Saving status update...";

/// Shown once the backend accepted a status update
pub const SAVED_MESSAGE: &str = "Status updated successfully!";

/// Shown when a status update was rejected and rolled back
pub const SAVE_FAILED_MESSAGE: &str = "Failed to save status update.";

/// Toast identifier
pub type ToastId = Uuid;

/// Toast flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    /// Operation in progress
    Loading,
    /// Operation succeeded
    Success,
    /// Operation failed
    Error,
    /// Informational
    Info,
}

impl fmt::Display for ToastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => write!(f, "loading"),
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single toast
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    /// Identifier, stable across replacement
    pub id: ToastId,
    /// Flavour
    pub kind: ToastKind,
    /// Text
    pub message: String,
    /// When the toast (or its latest replacement) was shown
    pub shown_at: DateTime<Utc>,
}

/// Sink for user-facing notifications
pub trait Notifier: Send + Sync + fmt::Debug {
    /// Show a toast, replacing `replace` in place when given
    fn show(&self, kind: ToastKind, message: &str, replace: Option<ToastId>) -> ToastId;

    /// Remove a toast
    fn dismiss(&self, id: ToastId);

    /// Show a pending toast
    fn loading(&self, message: &str) -> ToastId {
        self.show(ToastKind::Loading, message, None)
    }

    /// Show a success toast
    fn success(&self, message: &str, replace: Option<ToastId>) -> ToastId {
        self.show(ToastKind::Success, message, replace)
    }

    /// Show a failure toast
    fn error(&self, message: &str, replace: Option<ToastId>) -> ToastId {
        self.show(ToastKind::Error, message, replace)
    }

    /// Show an informational toast
    fn info(&self, message: &str) -> ToastId {
        self.show(ToastKind::Info, message, None)
    }
}

/// In-memory toast list
#[derive(Debug, Default)]
pub struct NotificationCenter {
    toasts: Mutex<Vec<Toast>>,
}

impl NotificationCenter {
    /// Empty center
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toasts currently shown, oldest first
    #[must_use]
    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().clone()
    }

    /// Number of shown toasts of one kind
    #[must_use]
    pub fn count(&self, kind: ToastKind) -> usize {
        self.toasts.lock().iter().filter(|t| t.kind == kind).count()
    }

    /// Remove every toast
    pub fn clear(&self) {
        self.toasts.lock().clear();
    }
}

impl Notifier for NotificationCenter {
    fn show(&self, kind: ToastKind, message: &str, replace: Option<ToastId>) -> ToastId {
        let mut toasts = self.toasts.lock();

        if let Some(existing) = replace.and_then(|id| toasts.iter_mut().find(|t| t.id == id)) {
            existing.kind = kind;
            existing.message = message.to_string();
            existing.shown_at = Utc::now();
            return existing.id;
        }

        let toast = Toast {
            id: replace.unwrap_or_else(Uuid::new_v4),
            kind,
            message: message.to_string(),
            shown_at: Utc::now(),
        };
        let id = toast.id;
        toasts.push(toast);
        id
    }

    fn dismiss(&self, id: ToastId) {
        self.toasts.lock().retain(|t| t.id != id);
    }
}

/// Prints toasts to stderr
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn show(&self, kind: ToastKind, message: &str, replace: Option<ToastId>) -> ToastId {
        let line = match kind {
            ToastKind::Loading => format!("… {message}").yellow(),
            ToastKind::Success => format!("✓ {message}").green(),
            ToastKind::Error => format!("✗ {message}").red().bold(),
            ToastKind::Info => format!("• {message}").blue(),
        };
        eprintln!("{line}");

        if kind == ToastKind::Error {
            error!(%kind, text = message, "Notification");
        } else {
            info!(%kind, text = message, "Notification");
        }

        replace.unwrap_or_else(Uuid::new_v4)
    }

    fn dismiss(&self, _id: ToastId) {}
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_replace_keeps_single_toast() {
        let center = NotificationCenter::new();

        let pending = center.loading(SAVING_MESSAGE);
        let done = center.success(SAVED_MESSAGE, Some(pending));

        assert_eq!(pending, done);
        let toasts = center.toasts();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].kind, ToastKind::Success);
        assert_eq!(toasts[0].message, SAVED_MESSAGE);
        assert_eq!(center.count(ToastKind::Loading), 0);
    }

    #[test]
    fn test_replacing_unknown_toast_adds_it() {
        let center = NotificationCenter::new();
        let id = Uuid::new_v4();

        assert_eq!(center.error(SAVE_FAILED_MESSAGE, Some(id)), id);
        assert_eq!(center.count(ToastKind::Error), 1);
    }

    #[test]
    fn test_dismiss_and_clear() {
        let center = NotificationCenter::new();
        let first = center.info("one");
        center.info("two");

        center.dismiss(first);
        assert_eq!(center.toasts().len(), 1);

        center.clear();
        assert!(center.toasts().is_empty());
    }

    #[test]
    fn test_console_notifier_reuses_replaced_id() {
        let notifier = ConsoleNotifier;
        let id = notifier.loading(SAVING_MESSAGE);
        assert_eq!(notifier.success(SAVED_MESSAGE, Some(id)), id);
    }
}
