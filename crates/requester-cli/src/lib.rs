//! Requester CLI: a terminal host for request files
pub mod terminal;

use anyhow::Context;
use requester_core::env_runner::resolve_environment;
use requester_core::extractor::refresh_view_source;
use requester_core::{CommandContext, EnvironmentSource, HostView, Settings};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;

pub use terminal::TerminalView;

/// Load settings from `path` (defaults when absent) and apply the
/// environment overrides.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let settings = match path {
        Some(path) => Settings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    Ok(settings.with_env_overrides()?)
}

/// Environment sources named by the view's text.
pub fn extract_sources(view: &dyn HostView) -> EnvironmentSource {
    refresh_view_source(view)
}

/// Resolve the view's environment under `settings`.
///
/// Returns `null` when the file names no environment source.
pub async fn resolve_env(view: Arc<dyn HostView>, settings: Settings) -> anyhow::Result<Value> {
    let ctx = CommandContext::new(settings);
    let source = refresh_view_source(view.as_ref());
    let env = resolve_environment(source, &ctx, view).await?;
    Ok(env.map_or(Value::Null, |env| env.to_json()))
}

/// JSON rendering of an [`EnvironmentSource`] for the `extract` command.
pub fn source_json(source: &EnvironmentSource) -> Value {
    json!({
        "inline_text": source.inline_text,
        "file_path": source.file_path.as_ref().map(|p| p.display().to_string()),
    })
}
