//! Operator notifications
//!
//! Transient messages emitted after every fetch, submit and validation
//! outcome. The surface that displays them is pluggable.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// Message severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Info,
}

/// One message for the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub severity: Severity,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(Severity::Success, title, description)
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(Severity::Error, title, description)
    }

    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(Severity::Info, title, description)
    }

    fn new(severity: Severity, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Notification surface
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, notification: Notification) {
        (**self).notify(notification);
    }
}

/// Routes notifications into the tracing pipeline
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, n: Notification) {
        match n.severity {
            Severity::Success | Severity::Info => {
                tracing::info!(title = %n.title, "{}", n.description);
            }
            Severity::Error => tracing::error!(title = %n.title, "{}", n.description),
        }
    }
}

/// Keeps every notification, in order
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    inner: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded notifications
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.inner.lock().clone()
    }

    /// Most recent notification
    #[must_use]
    pub fn last(&self) -> Option<Notification> {
        self.inner.lock().last().cloned()
    }

    /// Severities in order, for compact assertions
    #[must_use]
    pub fn severities(&self) -> Vec<Severity> {
        self.inner.lock().iter().map(|n| n.severity).collect()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.inner.lock().push(notification);
    }
}
