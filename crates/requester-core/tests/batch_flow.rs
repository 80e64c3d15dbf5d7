//! Integration tests for request execution and response gathering.
//!
//! These drive full commands against an in-memory view with senders that
//! complete out of order, fail, or read the environment.

use requester_core::{
    BufferView, Environment, RequestCommand, RequestHooks, RequestSender, ResponseRecord,
    SendError, Settings, StaticRequests, ACTIVITY_STATUS_KEY,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn fast_settings() -> Settings {
    Settings {
        refresh_ms: 20,
        ..Settings::default()
    }
}

fn requests(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("get('/items/{}')", i)).collect()
}

/// Hooks that remember every callback invocation.
#[derive(Default)]
struct RecordingHooks {
    requests: Vec<String>,
    arrivals: Mutex<Vec<usize>>,
    errors: Mutex<Vec<usize>>,
    totals: Mutex<Vec<usize>>,
    batch: Mutex<Option<Vec<ResponseRecord>>>,
    ticks: Mutex<Vec<u64>>,
    pending_counts: Mutex<Vec<usize>>,
}

impl RecordingHooks {
    fn new(requests: Vec<String>) -> Self {
        Self {
            requests,
            ..Self::default()
        }
    }
}

impl RequestHooks for RecordingHooks {
    fn requests(&self) -> Vec<String> {
        self.requests.clone()
    }

    fn on_pending_activity(&self, pending: &[String], tick: u64, activity: &str) {
        assert!(activity.starts_with('[') && activity.ends_with(']'));
        self.ticks.lock().unwrap().push(tick);
        self.pending_counts.lock().unwrap().push(pending.len());
    }

    fn on_response(&self, record: &ResponseRecord, num_requests: usize) {
        self.arrivals.lock().unwrap().push(record.ordering);
        self.totals.lock().unwrap().push(num_requests);
    }

    fn on_error(&self, record: &ResponseRecord, _num_requests: usize) {
        self.errors.lock().unwrap().push(record.ordering);
    }

    fn on_responses(&self, records: &[ResponseRecord]) {
        *self.batch.lock().unwrap() = Some(records.to_vec());
    }
}

/// Later requests finish first.
fn reversed_sender(n: usize) -> Arc<dyn RequestSender> {
    Arc::new(move |request: &str, _env: Option<&Environment>| -> Result<Value, SendError> {
        let index: usize = request
            .trim_start_matches("get('/items/")
            .trim_end_matches("')")
            .parse()?;
        std::thread::sleep(Duration::from_millis(((n - index) * 15) as u64));
        Ok(json!({ "status": 200, "index": index }))
    })
}

#[tokio::test]
async fn test_batch_records_are_sorted_by_submission_order() {
    let n = 6;
    let view = Arc::new(BufferView::new("get('/items/0')"));
    let hooks = Arc::new(RecordingHooks::new(requests(n)));
    let command = RequestCommand::new(view.clone(), hooks.clone(), reversed_sender(n), fast_settings());

    let report = command.run().await.unwrap().unwrap();

    let orderings: Vec<usize> = report.records.iter().map(|r| r.ordering).collect();
    assert_eq!(orderings, (0..n).collect::<Vec<_>>());
    assert!(report.records.iter().all(|r| r.error.is_none()));

    let batch = hooks.batch.lock().unwrap().clone().unwrap();
    assert_eq!(batch, report.records);

    let mut arrivals = hooks.arrivals.lock().unwrap().clone();
    assert_eq!(arrivals.len(), n);
    arrivals.sort_unstable();
    assert_eq!(arrivals, (0..n).collect::<Vec<_>>());
    assert!(hooks.totals.lock().unwrap().iter().all(|&t| t == n));

    let counts = hooks.pending_counts.lock().unwrap().clone();
    assert!(counts.len() > 1);
    assert!(counts[0] <= n);
    assert!(counts.windows(2).all(|pair| pair[1] <= pair[0]));
    assert_eq!(counts.last(), Some(&0));
}

#[tokio::test]
async fn test_one_failing_request_does_not_abort_the_batch() {
    let sender: Arc<dyn RequestSender> =
        Arc::new(|request: &str, _env: Option<&Environment>| -> Result<Value, SendError> {
            if request.ends_with("/1')") {
                return Err("ConnectionError: refused".into());
            }
            Ok(json!(200))
        });
    let view = Arc::new(BufferView::new(""));
    let hooks = Arc::new(RecordingHooks::new(requests(3)));
    let command = RequestCommand::new(view.clone(), hooks.clone(), sender, fast_settings());

    let report = command.run().await.unwrap().unwrap();

    assert_eq!(report.records.len(), 3);
    let errored: Vec<usize> = report.errors().map(|r| r.ordering).collect();
    assert_eq!(errored, vec![1]);
    assert_eq!(*hooks.errors.lock().unwrap(), vec![1]);

    // default batch error handling: one blocking report
    assert_eq!(
        view.errors(),
        vec!["get('/items/1')\nConnectionError: refused".to_string()]
    );
}

#[tokio::test]
async fn test_activity_indicator_runs_and_is_cleared() {
    let view = Arc::new(BufferView::new(""));
    let hooks = Arc::new(RecordingHooks::new(requests(3)));
    let command = RequestCommand::new(view.clone(), hooks.clone(), reversed_sender(3), fast_settings());

    let report = command.run().await.unwrap().unwrap();

    assert!(report.ticks >= 1);
    assert_eq!(view.status(ACTIVITY_STATUS_KEY), None);
    assert!(view
        .status_history()
        .iter()
        .any(|s| s.starts_with("Requester [")));

    let ticks = hooks.ticks.lock().unwrap().clone();
    assert_eq!(ticks, (0..=report.ticks).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_requests_see_the_resolved_environment() {
    let text = "###env\nbase = 'http://localhost:8000'\n###env\nget(base + '/ping')\n";
    let sender: Arc<dyn RequestSender> =
        Arc::new(|_request: &str, env: Option<&Environment>| -> Result<Value, SendError> {
            let env = env.ok_or("no environment")?;
            Ok(env.get("base").cloned().unwrap_or(Value::Null))
        });
    let view = Arc::new(BufferView::new(text));
    let hooks = Arc::new(StaticRequests(vec!["get(base + '/ping')".to_string()]));
    let command = RequestCommand::new(view.clone(), hooks, sender, fast_settings());

    let report = command.run().await.unwrap().unwrap();

    assert_eq!(report.records[0].result, Some(json!("http://localhost:8000")));
    assert_eq!(
        report.environment.unwrap().to_json(),
        json!({ "base": "http://localhost:8000" })
    );
}

#[tokio::test]
async fn test_empty_request_list_finishes_with_empty_report() {
    let view = Arc::new(BufferView::new(""));
    let command = RequestCommand::new(
        view.clone(),
        Arc::new(StaticRequests::default()),
        reversed_sender(0),
        fast_settings(),
    );

    let report = command.run().await.unwrap().unwrap();

    assert!(report.records.is_empty());
    assert!(report.environment.is_none());
    assert!(view.errors().is_empty());
}
