//! Data Model: Environment, EnvironmentSource, ResponseRecord
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Resolved variable bindings available to requests.
///
/// Built once per command invocation and never mutated afterwards; requests
/// share it through an `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    bindings: BTreeMap<String, Value>,
}

impl Environment {
    pub fn new(bindings: BTreeMap<String, Value>) -> Self {
        Self { bindings }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Merge `other` on top of `self`; `other` wins on key collisions.
    pub fn merged_with(mut self, other: BTreeMap<String, Value>) -> Self {
        self.bindings.extend(other);
        self
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.bindings.clone().into_iter().collect())
    }
}

/// Where the environment for a buffer comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSource {
    /// Raw text between the `###env` delimiters
    pub inline_text: Option<String>,
    /// Absolute path of the env file named by the `env_file` directive
    pub file_path: Option<PathBuf>,
}

impl EnvironmentSource {
    pub fn is_empty(&self) -> bool {
        self.inline_text.is_none() && self.file_path.is_none()
    }
}

/// Outcome of one request, produced by the worker pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    /// Original request text
    pub request: String,
    /// Position of the request in the submitted list
    pub ordering: usize,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub elapsed_ms: u64,
    pub completed_at: DateTime<Utc>,
}

impl ResponseRecord {
    pub fn success(request: String, ordering: usize, result: Value, elapsed_ms: u64) -> Self {
        Self {
            request,
            ordering,
            result: Some(result),
            error: None,
            elapsed_ms,
            completed_at: Utc::now(),
        }
    }

    pub fn failure(request: String, ordering: usize, error: String, elapsed_ms: u64) -> Self {
        Self {
            request,
            ordering,
            result: None,
            error: Some(error),
            elapsed_ms,
            completed_at: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Everything a finished batch produced, sorted by ordering index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_id: String,
    pub environment: Option<Environment>,
    pub records: Vec<ResponseRecord>,
    pub ticks: u64,
}

impl BatchReport {
    pub fn errors(&self) -> impl Iterator<Item = &ResponseRecord> {
        self.records.iter().filter(|r| r.is_error())
    }
}
