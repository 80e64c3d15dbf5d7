//! Bounded worker pool that executes requests and queues their records.
//!
//! The pool is the only concurrently mutated state in a batch. Workers push
//! completed records; the response loop only takes [`PoolSnapshot`]s.
use crate::data_model::{Environment, ResponseRecord};
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub type SendError = Box<dyn std::error::Error + Send + Sync>;

/// Executes a single request against the resolved environment.
///
/// Implementations block; the pool runs them on tokio's blocking threads.
pub trait RequestSender: Send + Sync {
    fn send(&self, request: &str, env: Option<&Environment>) -> Result<Value, SendError>;
}

impl<F> RequestSender for F
where
    F: Fn(&str, Option<&Environment>) -> Result<Value, SendError> + Send + Sync,
{
    fn send(&self, request: &str, env: Option<&Environment>) -> Result<Value, SendError> {
        self(request, env)
    }
}

/// One consistent read of the pool: nothing appears both pending and drained.
#[derive(Debug, Clone, Default)]
pub struct PoolSnapshot {
    /// Requests not completed yet, in submission order
    pub pending: Vec<String>,
    /// Records completed since the previous snapshot, in arrival order
    pub drained: Vec<ResponseRecord>,
    /// No work is in flight and every record has been drained
    pub is_done: bool,
}

#[derive(Debug, Default)]
struct PoolState {
    pending: BTreeMap<usize, String>,
    completed: VecDeque<ResponseRecord>,
    is_done: bool,
}

#[derive(Clone)]
pub struct ResponsePool {
    requests: Arc<Vec<String>>,
    env: Option<Arc<Environment>>,
    max_workers: usize,
    sender: Arc<dyn RequestSender>,
    state: Arc<Mutex<PoolState>>,
}

impl ResponsePool {
    pub fn new(
        requests: Vec<String>,
        env: Option<Arc<Environment>>,
        max_workers: usize,
        sender: Arc<dyn RequestSender>,
    ) -> Self {
        let state = PoolState {
            pending: requests.iter().cloned().enumerate().collect(),
            ..PoolState::default()
        };
        Self {
            requests: Arc::new(requests),
            env,
            max_workers: max_workers.max(1),
            sender,
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn num_requests(&self) -> usize {
        self.requests.len()
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Execute every request, at most `max_workers` at a time.
    ///
    /// Each request gets exactly one record. Sender errors and panics are
    /// captured in the record and never abort the rest of the batch.
    pub async fn run(self) {
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut workers = JoinSet::new();

        for (ordering, request) in self.requests.iter().cloned().enumerate() {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let sender = Arc::clone(&self.sender);
            let env = self.env.clone();
            let state = Arc::clone(&self.state);

            workers.spawn(async move {
                let started = Instant::now();
                let outcome = tokio::task::spawn_blocking({
                    let request = request.clone();
                    move || sender.send(&request, env.as_deref())
                })
                .await;
                let elapsed_ms = started.elapsed().as_millis() as u64;

                let record = match outcome {
                    Ok(Ok(result)) => ResponseRecord::success(request, ordering, result, elapsed_ms),
                    Ok(Err(err)) => {
                        ResponseRecord::failure(request, ordering, err.to_string(), elapsed_ms)
                    }
                    Err(err) => ResponseRecord::failure(
                        request,
                        ordering,
                        format!("request worker failed: {}", err),
                        elapsed_ms,
                    ),
                };
                tracing::debug!(
                    ordering,
                    elapsed_ms,
                    failed = record.is_error(),
                    "request completed"
                );

                let mut state = lock(&state);
                state.pending.remove(&ordering);
                state.completed.push_back(record);
                drop(state);
                drop(permit);
            });
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                tracing::error!(error = %err, "request worker task aborted");
            }
        }
        lock(&self.state).is_done = true;
    }

    /// Drain completed records and read pending work under one lock.
    pub fn snapshot(&self) -> PoolSnapshot {
        let mut state = lock(&self.state);
        let is_done = state.is_done;
        let drained = state.completed.drain(..).collect();
        PoolSnapshot {
            pending: state.pending.values().cloned().collect(),
            drained,
            is_done,
        }
    }
}

fn lock(state: &Mutex<PoolState>) -> MutexGuard<'_, PoolState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
