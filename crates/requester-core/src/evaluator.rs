//! Environment evaluation: inline block and env file, each in its own
//! fresh namespace, merged with the file taking precedence.
use crate::data_model::{Environment, EnvironmentSource};
use crate::error::RequesterError;
use requester_env::{Namespace, ENV_MODULE_NAME};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Result of evaluating an [`EnvironmentSource`].
///
/// Errors from one source never prevent the other from contributing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    /// `None` only when the source named neither inline text nor a file
    pub environment: Option<Environment>,
    pub errors: Vec<RequesterError>,
}

pub fn evaluate(source: &EnvironmentSource) -> Evaluation {
    if source.is_empty() {
        return Evaluation::default();
    }

    let mut errors = Vec::new();
    let mut environment = Environment::default();

    if let Some(text) = &source.inline_text {
        match evaluate_inline(text) {
            Ok(bindings) => environment = environment.merged_with(bindings),
            Err(err) => errors.push(err),
        }
    }

    if let Some(path) = &source.file_path {
        match evaluate_file(path) {
            Ok(bindings) => environment = environment.merged_with(bindings),
            Err(err) => errors.push(err),
        }
    }

    if environment.is_empty() && !errors.is_empty() {
        tracing::warn!(errors = errors.len(), "no environment bindings survived evaluation");
    }

    Evaluation {
        environment: Some(environment),
        errors,
    }
}

/// Execute inline environment text in a fresh namespace.
pub fn evaluate_inline(text: &str) -> Result<BTreeMap<String, Value>, RequesterError> {
    let mut namespace = Namespace::new(ENV_MODULE_NAME);
    namespace
        .execute(text)
        .map_err(|e| RequesterError::EnvBlock(e.to_string()))?;
    Ok(namespace.into_exported())
}

/// Read and execute an env file in a fresh namespace.
pub fn evaluate_file(path: &Path) -> Result<BTreeMap<String, Value>, RequesterError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| RequesterError::EnvFile(format!("{}: {}", path.display(), e)))?;
    let mut namespace = Namespace::for_file(ENV_MODULE_NAME, path);
    namespace
        .execute(&content)
        .map_err(|e| RequesterError::EnvFile(format!("{}: {}", path.display(), e)))?;
    Ok(namespace.into_exported())
}
