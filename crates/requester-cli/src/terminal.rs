//! [`HostView`] backed by a file on disk, reporting to stderr.
use requester_core::{EnvironmentSource, HostView};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub struct TerminalView {
    text: String,
    file_name: PathBuf,
    state: Mutex<TerminalState>,
}

#[derive(Default)]
struct TerminalState {
    env_source: EnvironmentSource,
    last_status: String,
}

impl TerminalView {
    /// Read `path` into a view. The path is made absolute so relative
    /// `env_file` directives resolve next to the file.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let file_name = std::fs::canonicalize(path)?;
        Ok(Self {
            text,
            file_name,
            state: Mutex::new(TerminalState::default()),
        })
    }

    fn lock(&self) -> MutexGuard<'_, TerminalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HostView for TerminalView {
    fn text(&self) -> String {
        self.text.clone()
    }

    fn file_name(&self) -> Option<PathBuf> {
        Some(self.file_name.clone())
    }

    fn is_generated(&self) -> bool {
        false
    }

    fn env_source(&self) -> EnvironmentSource {
        self.lock().env_source.clone()
    }

    fn set_env_source(&self, source: EnvironmentSource) {
        self.lock().env_source = source;
    }

    fn set_status(&self, _key: &str, value: &str) {
        let mut state = self.lock();
        if state.last_status == value {
            return;
        }
        let mut stderr = std::io::stderr().lock();
        if value.is_empty() {
            let _ = write!(stderr, "\r{}\r", " ".repeat(state.last_status.len()));
        } else {
            let _ = write!(stderr, "\r{}", value);
        }
        let _ = stderr.flush();
        state.last_status = value.to_string();
    }

    fn error_message(&self, message: &str) {
        eprintln!("{}", message);
    }
}
