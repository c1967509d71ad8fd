use std::sync::Mutex;

use serde::Serialize;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Default,
    Destructive,
}

/// A user-facing success or error message.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Toast {
    pub fn success(title: &str, description: &str) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Default,
        }
    }

    pub fn error(title: &str, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Destructive,
        }
    }
}

/// Fire-and-forget sink for toasts.
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}

fn trace_toast(toast: &Toast) {
    match toast.severity {
        Severity::Destructive => {
            tracing::warn!(title = %toast.title, description = %toast.description, "Toast")
        }
        Severity::Default => {
            tracing::info!(title = %toast.title, description = %toast.description, "Toast")
        }
    }
}

/// Collects toasts raised while serving one request so they can be returned
/// with the response.
#[derive(Debug, Default)]
pub struct ToastBuffer {
    toasts: Mutex<Vec<Toast>>,
}

impl ToastBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Toast> {
        match self.toasts.lock() {
            Ok(mut toasts) => std::mem::take(&mut *toasts),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl Notifier for ToastBuffer {
    fn notify(&self, toast: Toast) {
        trace_toast(&toast);
        match self.toasts.lock() {
            Ok(mut toasts) => toasts.push(toast),
            Err(poisoned) => poisoned.into_inner().push(toast),
        }
    }
}

/// Forwards toasts to a live connection.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Toast>,
}

impl ChannelNotifier {
    pub fn new(tx: mpsc::UnboundedSender<Toast>) -> Self {
        Self { tx }
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, toast: Toast) {
        trace_toast(&toast);
        // The connection may already be closing.
        let _ = self.tx.send(toast);
    }
}
