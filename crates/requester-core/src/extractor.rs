//! Environment source extraction from buffer text.
//!
//! A buffer can carry its environment inline, between two `###env` lines,
//! and/or point to an env file with an `env_file = <expression>` line.
use crate::data_model::EnvironmentSource;
use crate::host::HostView;
use lazy_static::lazy_static;
use regex::Regex;
use requester_env::{to_display_string, ENV_MODULE_NAME};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Line that opens and closes an inline environment block
pub const ENV_DELIMITER: &str = "###env";

/// Variable name reserved for the env file directive
pub const ENV_FILE_VAR: &str = "env_file";

lazy_static! {
    /// Matches at the start of a line only
    static ref ENV_FILE_DIRECTIVE: Regex = Regex::new(r"^\s*env_file\s*=.*").unwrap();
}

/// Extract both environment sources from `text`.
///
/// `file_name` is the buffer's backing file, used to resolve a relative
/// `env_file` path.
pub fn extract(text: &str, file_name: Option<&Path>) -> EnvironmentSource {
    EnvironmentSource {
        inline_text: extract_inline(text),
        file_path: extract_file_path(text, file_name),
    }
}

/// Lines strictly between the first `###env` line and the next one.
///
/// An unterminated or empty block yields `None`.
pub fn extract_inline(text: &str) -> Option<String> {
    let mut in_block = false;
    let mut closed = false;
    let mut lines = Vec::new();

    for line in text.lines() {
        if in_block {
            if line == ENV_DELIMITER {
                closed = true;
                break;
            }
            lines.push(line);
        } else if line == ENV_DELIMITER {
            in_block = true;
        }
    }

    if !closed || lines.is_empty() {
        return None;
    }
    Some(lines.join("\n"))
}

/// Evaluate the first `env_file = ...` line and resolve the resulting path.
///
/// Evaluation failures, falsy values and relative paths in buffers without
/// a backing file all mean "no env file".
pub fn extract_file_path(text: &str, file_name: Option<&Path>) -> Option<PathBuf> {
    let line = text.lines().find(|line| ENV_FILE_DIRECTIVE.is_match(line))?;

    let namespace = match requester_env::execute(ENV_MODULE_NAME, line.trim_start()) {
        Ok(namespace) => namespace,
        Err(err) => {
            tracing::debug!(error = %err, "ignoring env_file directive that failed to evaluate");
            return None;
        }
    };

    let value = namespace.get(ENV_FILE_VAR)?;
    if !is_truthy(value) {
        return None;
    }
    let path = PathBuf::from(to_display_string(value));
    if path.is_absolute() {
        return Some(path);
    }
    let base = file_name?.parent()?;
    Some(base.join(path))
}

/// Refresh the source stored on `view`, unless Requester generated the view.
///
/// Generated views keep the source they were created with.
pub fn refresh_view_source(view: &dyn HostView) -> EnvironmentSource {
    if view.is_generated() {
        return view.env_source();
    }
    let file_name = view.file_name();
    let source = extract(&view.text(), file_name.as_deref());
    view.set_env_source(source.clone());
    source
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
