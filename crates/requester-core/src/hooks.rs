//! Extension points of a request command.
//!
//! Commands customise behaviour by implementing [`RequestHooks`] and
//! injecting it into the command. Every method has a default, so an
//! implementation only overrides what it needs.
use crate::data_model::ResponseRecord;
use crate::host::HostView;

pub trait RequestHooks: Send + Sync {
    /// Requests to execute once the environment is resolved
    fn requests(&self) -> Vec<String> {
        Vec::new()
    }

    /// Called on every tick of the response loop with the pending requests,
    /// the tick and the rendered activity glyph
    fn on_pending_activity(&self, _pending: &[String], _tick: u64, _activity: &str) {}

    /// Called for each record as soon as it is drained from the pool
    fn on_response(&self, _record: &ResponseRecord, _num_requests: usize) {}

    /// Called for each drained record that carries an error
    fn on_error(&self, _record: &ResponseRecord, _num_requests: usize) {}

    /// Called once with all records, sorted by ordering index
    fn on_responses(&self, _records: &[ResponseRecord]) {}

    /// Called once with all records, sorted by ordering index, after
    /// [`on_responses`](RequestHooks::on_responses). By default every error
    /// is shown in a single blocking report.
    fn on_errors(&self, records: &[ResponseRecord], view: &dyn HostView) {
        if let Some(report) = error_report(records) {
            view.error_message(&report);
        }
    }
}

/// Join all errored records as `"<request>\n<error>"` blocks separated by
/// blank lines, or `None` if no record failed.
pub fn error_report(records: &[ResponseRecord]) -> Option<String> {
    let errors: Vec<String> = records
        .iter()
        .filter_map(|r| r.error.as_ref().map(|e| format!("{}\n{}", r.request, e)))
        .collect();
    if errors.is_empty() {
        None
    } else {
        Some(errors.join("\n\n"))
    }
}

/// Hooks that only supply a fixed request list.
#[derive(Debug, Clone, Default)]
pub struct StaticRequests(pub Vec<String>);

impl RequestHooks for StaticRequests {
    fn requests(&self) -> Vec<String> {
        self.0.clone()
    }
}
