use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Success,
    Info,
}

/// User-facing toast.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self { severity: Severity::Error, title: title.into(), message: message.into() }
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self { severity: Severity::Warning, title: title.into(), message: message.into() }
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self { severity: Severity::Success, title: title.into(), message: message.into() }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self { severity: Severity::Info, title: title.into(), message: message.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NavigationIntent {
    /// Open the record page of a created or host record.
    #[serde(rename_all = "camelCase")]
    ViewRecord { record_id: String },
    /// Advance the enclosing host flow instead of navigating away.
    ContinueHost,
}

pub trait SignalSink: Send + Sync {
    fn notify(&self, notification: Notification);
    fn navigate(&self, intent: NavigationIntent);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSignalSink;

impl SignalSink for NoopSignalSink {
    fn notify(&self, _notification: Notification) {}
    fn navigate(&self, _intent: NavigationIntent) {}
}

#[derive(Clone, Default)]
pub struct InMemorySignalSink {
    notifications: Arc<Mutex<Vec<Notification>>>,
    navigations: Arc<Mutex<Vec<NavigationIntent>>>,
}

impl InMemorySignalSink {
    pub fn notifications(&self) -> Vec<Notification> {
        match self.notifications.lock() {
            Ok(items) => items.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn navigations(&self) -> Vec<NavigationIntent> {
        match self.navigations.lock() {
            Ok(items) => items.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn with_severity(&self, severity: Severity) -> Vec<Notification> {
        self.notifications().into_iter().filter(|item| item.severity == severity).collect()
    }

    pub fn last_notification(&self) -> Option<Notification> {
        self.notifications().pop()
    }
}

impl SignalSink for InMemorySignalSink {
    fn notify(&self, notification: Notification) {
        match self.notifications.lock() {
            Ok(mut items) => items.push(notification),
            Err(poisoned) => poisoned.into_inner().push(notification),
        }
    }

    fn navigate(&self, intent: NavigationIntent) {
        match self.navigations.lock() {
            Ok(mut items) => items.push(intent),
            Err(poisoned) => poisoned.into_inner().push(intent),
        }
    }
}
