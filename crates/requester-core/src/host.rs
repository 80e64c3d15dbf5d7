//! Boundary to the host editor.
//!
//! The engine never touches editor internals directly. It reads the buffer,
//! stores the extracted environment source on the view, writes a status
//! line and shows blocking error messages through [`HostView`].
use crate::data_model::EnvironmentSource;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Status key used by both activity indicators
pub const ACTIVITY_STATUS_KEY: &str = "requester.activity";

/// The view a command runs in, plus the host's modal error reporting.
pub trait HostView: Send + Sync {
    /// Full buffer text
    fn text(&self) -> String;

    /// Backing file of the buffer, if it has been saved
    fn file_name(&self) -> Option<PathBuf>;

    /// True for response and test views opened by Requester itself
    fn is_generated(&self) -> bool;

    /// Environment source last stored on this view
    fn env_source(&self) -> EnvironmentSource;

    fn set_env_source(&self, source: EnvironmentSource);

    /// Set (or clear, with an empty value) a status bar entry
    fn set_status(&self, key: &str, value: &str);

    /// Present a blocking error message to the user
    fn error_message(&self, message: &str);
}

/// In-memory [`HostView`] that records status updates and error messages.
#[derive(Debug, Default)]
pub struct BufferView {
    text: String,
    file_name: Option<PathBuf>,
    generated: bool,
    state: Mutex<BufferState>,
}

#[derive(Debug, Default)]
struct BufferState {
    env_source: EnvironmentSource,
    status: HashMap<String, String>,
    status_history: Vec<String>,
    errors: Vec<String>,
}

impl BufferView {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_file_name(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_name = Some(path.into());
        self
    }

    /// Mark as a response/test view
    pub fn generated(mut self) -> Self {
        self.generated = true;
        self
    }

    pub fn with_env_source(self, source: EnvironmentSource) -> Self {
        self.lock().env_source = source;
        self
    }

    pub fn status(&self, key: &str) -> Option<String> {
        self.lock().status.get(key).cloned()
    }

    /// Every non-empty status value set so far, in order
    pub fn status_history(&self) -> Vec<String> {
        self.lock().status_history.clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.lock().errors.clone()
    }

    fn lock(&self) -> MutexGuard<'_, BufferState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HostView for BufferView {
    fn text(&self) -> String {
        self.text.clone()
    }

    fn file_name(&self) -> Option<PathBuf> {
        self.file_name.clone()
    }

    fn is_generated(&self) -> bool {
        self.generated
    }

    fn env_source(&self) -> EnvironmentSource {
        self.lock().env_source.clone()
    }

    fn set_env_source(&self, source: EnvironmentSource) {
        self.lock().env_source = source;
    }

    fn set_status(&self, key: &str, value: &str) {
        let mut state = self.lock();
        if value.is_empty() {
            state.status.remove(key);
        } else {
            state.status.insert(key.to_string(), value.to_string());
            state.status_history.push(value.to_string());
        }
    }

    fn error_message(&self, message: &str) {
        self.lock().errors.push(message.to_string());
    }
}
