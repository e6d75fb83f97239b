//! Application shell collaborators
//!
//! The access-control core never renders anything itself. Screen changes and
//! user-visible notifications are requests to the surrounding application shell.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}

/// Screen navigation
pub trait Navigator: Send + Sync {
    /// Request a change of the visible screen
    fn navigate(&self, path: &str);

    /// Path of the visible screen
    fn current_path(&self) -> String;
}

/// Toast/alert display
pub trait Notifier: Send + Sync {
    /// Show a notification to the user
    fn notify(&self, message: &str, severity: Severity);
}

/// Navigator and notifier handed to the store and the guards
#[derive(Clone)]
pub struct Shell {
    pub navigator: Arc<dyn Navigator>,
    pub notifier: Arc<dyn Notifier>,
}

impl Shell {
    pub fn new(navigator: Arc<dyn Navigator>, notifier: Arc<dyn Notifier>) -> Self {
        Self { navigator, notifier }
    }

    /// Use one object for both roles
    pub fn from_shared<T: Navigator + Notifier + 'static>(shell: Arc<T>) -> Self {
        Self { navigator: shell.clone(), notifier: shell }
    }
}

/// A recorded notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Default)]
struct RecordedState {
    path: String,
    navigations: Vec<String>,
    notifications: Vec<Notification>,
}

/// Shell that records every request
///
/// Used by tests and the CLI simulator. Navigating also changes the current
/// path, as a router would.
#[derive(Debug, Default)]
pub struct RecordingShell {
    state: Mutex<RecordedState>,
}

impl RecordingShell {
    /// Create a shell showing `path`
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(RecordedState { path: path.into(), ..RecordedState::default() }),
        }
    }

    /// Change the visible path without recording a navigation
    pub fn set_path(&self, path: impl Into<String>) {
        self.lock().path = path.into();
    }

    /// Navigations requested so far
    pub fn navigations(&self) -> Vec<String> {
        self.lock().navigations.clone()
    }

    /// Notifications shown so far
    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().notifications.clone()
    }

    /// Forget recorded navigations and notifications
    pub fn clear(&self) {
        let mut state = self.lock();
        state.navigations.clear();
        state.notifications.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RecordedState> {
        // A panic while holding the lock only loses recordings
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Navigator for RecordingShell {
    fn navigate(&self, path: &str) {
        log::debug!("Navigating to {}", path);
        let mut state = self.lock();
        state.path = path.to_string();
        state.navigations.push(path.to_string());
    }

    fn current_path(&self) -> String {
        self.lock().path.clone()
    }
}

impl Notifier for RecordingShell {
    fn notify(&self, message: &str, severity: Severity) {
        log::debug!("Notification ({}): {}", severity, message);
        self.lock()
            .notifications
            .push(Notification { message: message.to_string(), severity });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_shell() {
        let shell = RecordingShell::new("/assets");
        assert_eq!(shell.current_path(), "/assets");

        shell.navigate("/auth/login");
        shell.notify("Signed out", Severity::Info);

        assert_eq!(shell.current_path(), "/auth/login");
        assert_eq!(shell.navigations(), vec!["/auth/login".to_string()]);
        assert_eq!(
            shell.notifications(),
            vec![Notification { message: "Signed out".to_string(), severity: Severity::Info }]
        );

        shell.set_path("/vendors");
        assert_eq!(shell.current_path(), "/vendors");
        assert_eq!(shell.navigations().len(), 1);

        shell.clear();
        assert!(shell.navigations().is_empty());
        assert!(shell.notifications().is_empty());
    }

    #[test]
    fn test_shared_shell() {
        let recording = Arc::new(RecordingShell::new("/"));
        let shell = Shell::from_shared(recording.clone());

        shell.navigator.navigate("/admin");
        shell.notifier.notify("hello", Severity::Success);

        assert_eq!(recording.navigations(), vec!["/admin".to_string()]);
        assert_eq!(recording.notifications().len(), 1);
    }
}
