//! Per-invocation state shared by both polling loops
use crate::settings::Settings;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Correlates log lines of one command invocation
    pub batch_id: String,
    pub settings: Settings,
    pub started_at: DateTime<Utc>,
}

impl CommandContext {
    pub fn new(settings: Settings) -> Self {
        Self {
            batch_id: uuid::Uuid::new_v4().to_string(),
            settings,
            started_at: Utc::now(),
        }
    }

    /// Milliseconds since the command started.
    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.started_at).num_milliseconds()
    }
}
