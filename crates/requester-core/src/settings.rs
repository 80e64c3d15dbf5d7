//! Engine settings, read once per command invocation.
//!
//! Settings files are JSON (the editor's settings format) or YAML, picked by
//! file extension. JSON may carry `//` and `/* */` comments and trailing
//! commas, as editor settings files do. Every field has a default so an
//! empty object is valid.
use crate::error::RequesterError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding `timeout_env`
pub const TIMEOUT_ENV_VAR: &str = "REQUESTER_TIMEOUT_ENV";

/// The environment loop polls this many times per request-loop period.
pub const ENV_REFRESH_MULTIPLIER: u64 = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Seconds allowed for environment resolution; unset means no limit
    #[serde(default)]
    pub timeout_env: Option<f64>,

    /// Maximum number of requests executing at once
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Period of the response polling loop, in milliseconds
    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,

    /// Width of the activity indicator
    #[serde(default = "default_activity_spaces")]
    pub activity_spaces: usize,
}

fn default_max_workers() -> usize {
    10
}

fn default_refresh_ms() -> u64 {
    200
}

fn default_activity_spaces() -> usize {
    9
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout_env: None,
            max_workers: default_max_workers(),
            refresh_ms: default_refresh_ms(),
            activity_spaces: default_activity_spaces(),
        }
    }
}

impl Settings {
    /// Load settings from a `.json`/`.sublime-settings` or `.yaml`/`.yml` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RequesterError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RequesterError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            _ => Self::from_json(&content),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, RequesterError> {
        let settings: Settings = serde_json::from_str(&relax_json(json))
            .map_err(|e| RequesterError::Config(format!("invalid settings JSON: {}", e)))?;
        settings.validate()
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, RequesterError> {
        let settings: Settings = serde_yaml::from_str(yaml)
            .map_err(|e| RequesterError::Config(format!("invalid settings YAML: {}", e)))?;
        settings.validate()
    }

    /// Apply `REQUESTER_TIMEOUT_ENV` if it is set.
    pub fn with_env_overrides(mut self) -> Result<Self, RequesterError> {
        if let Ok(raw) = std::env::var(TIMEOUT_ENV_VAR) {
            let seconds: f64 = raw.trim().parse().map_err(|_| {
                RequesterError::Config(format!("{} must be a number, got {:?}", TIMEOUT_ENV_VAR, raw))
            })?;
            self.timeout_env = Some(seconds);
        }
        self.validate()
    }

    pub fn validate(self) -> Result<Self, RequesterError> {
        if let Some(timeout) = self.timeout_env {
            if !timeout.is_finite() || timeout < 0.0 {
                return Err(RequesterError::Config(format!(
                    "timeout_env must be a non-negative number of seconds, got {}",
                    timeout
                )));
            }
        }
        if self.max_workers == 0 {
            return Err(RequesterError::Config("max_workers must be at least 1".to_string()));
        }
        if self.refresh_ms == 0 {
            return Err(RequesterError::Config("refresh_ms must be at least 1".to_string()));
        }
        if self.activity_spaces == 0 {
            return Err(RequesterError::Config(
                "activity_spaces must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }

    /// Delay between two ticks of the response loop.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }

    /// Delay between two ticks of the environment loop.
    pub fn env_poll_interval(&self) -> Duration {
        Duration::from_millis((self.refresh_ms / ENV_REFRESH_MULTIPLIER).max(1))
    }

    pub fn env_timeout(&self) -> Option<Duration> {
        self.timeout_env
            .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
    }
}

/// Remove comments and trailing commas outside string literals.
fn relax_json(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                while chars.peek().is_some_and(|&next| next != '\n') {
                    chars.next();
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            '}' | ']' => {
                let trimmed = out.trim_end().len();
                if out[..trimmed].ends_with(',') {
                    out.truncate(trimmed - 1);
                }
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_object() {
        let settings = Settings::from_json("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.max_workers, 10);
        assert_eq!(settings.env_poll_interval(), Duration::from_millis(50));
        assert_eq!(settings.env_timeout(), None);
    }

    #[test]
    fn test_yaml_settings() {
        let settings = Settings::from_yaml("timeout_env: 1.5\nmax_workers: 3\n").unwrap();
        assert_eq!(settings.env_timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(settings.max_workers, 3);
        assert_eq!(settings.refresh_ms, 200);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Settings::from_json(r#"{"max_workers": 0}"#).is_err());
        assert!(Settings::from_json(r#"{"timeout_env": -1}"#).is_err());
        assert!(Settings::from_json(r#"{"activity_spaces": 0}"#).is_err());
        assert!(matches!(
            Settings::from_json("not json"),
            Err(RequesterError::Config(_))
        ));
    }

    #[test]
    fn test_load_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("Requester.sublime-settings");
        std::fs::write(&json_path, r#"{"timeout_env": 2}"#).unwrap();
        assert_eq!(Settings::load(&json_path).unwrap().timeout_env, Some(2.0));

        let yaml_path = dir.path().join("requester.yaml");
        std::fs::write(&yaml_path, "refresh_ms: 100\n").unwrap();
        let settings = Settings::load(&yaml_path).unwrap();
        assert_eq!(settings.refresh_interval(), Duration::from_millis(100));
        assert_eq!(settings.env_poll_interval(), Duration::from_millis(25));
    }

    #[test]
    fn test_editor_settings_allow_comments_and_trailing_commas() {
        let json = r#"
            // Requester settings
            {
                "timeout_env": 3, /* seconds */
                "max_workers": 4,
            }
        "#;
        let settings = Settings::from_json(json).unwrap();
        assert_eq!(settings.timeout_env, Some(3.0));
        assert_eq!(settings.max_workers, 4);
    }

    #[test]
    fn test_comment_markers_inside_strings_are_kept() {
        assert_eq!(
            relax_json(r#"{"url": "http://x/*y*/", "s": "a\"//b",}"#),
            r#"{"url": "http://x/*y*/", "s": "a\"//b"}"#
        );
        assert_eq!(relax_json("[1, 2 , ]"), "[1, 2 ]");
    }

    #[test]
    fn test_timeout_env_override() {
        // only test touching the variable; all cases run sequentially
        let from_file = Settings::from_json(r#"{"timeout_env": 10}"#).unwrap();

        std::env::set_var(TIMEOUT_ENV_VAR, " 0.5 ");
        let overridden = from_file.clone().with_env_overrides();

        std::env::set_var(TIMEOUT_ENV_VAR, "soon");
        let not_a_number = from_file.clone().with_env_overrides();

        std::env::set_var(TIMEOUT_ENV_VAR, "-2");
        let negative = from_file.clone().with_env_overrides();

        std::env::remove_var(TIMEOUT_ENV_VAR);
        let unset = from_file.clone().with_env_overrides();

        assert_eq!(overridden.unwrap().env_timeout(), Some(Duration::from_millis(500)));
        assert!(matches!(not_a_number, Err(RequesterError::Config(msg)) if msg.contains(TIMEOUT_ENV_VAR)));
        assert!(matches!(negative, Err(RequesterError::Config(msg)) if msg.contains("non-negative")));
        assert_eq!(unset.unwrap(), from_file);
    }
}
