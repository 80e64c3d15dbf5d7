//! Batch driver: hands the resolved environment and the requests to a
//! worker pool and gathers the responses.
use crate::context::CommandContext;
use crate::data_model::{BatchReport, Environment};
use crate::gatherer::gather_responses;
use crate::hooks::RequestHooks;
use crate::host::HostView;
use crate::pool::{RequestSender, ResponsePool};
use std::sync::Arc;

pub struct BatchDriver {
    ctx: CommandContext,
    view: Arc<dyn HostView>,
    hooks: Arc<dyn RequestHooks>,
    sender: Arc<dyn RequestSender>,
}

impl BatchDriver {
    pub fn new(
        ctx: CommandContext,
        view: Arc<dyn HostView>,
        hooks: Arc<dyn RequestHooks>,
        sender: Arc<dyn RequestSender>,
    ) -> Self {
        Self {
            ctx,
            view,
            hooks,
            sender,
        }
    }

    /// Execute `requests` concurrently against `env`.
    ///
    /// The pool runs on its own task so the caller's task only ever polls.
    /// Consumes the driver: a command makes requests at most once.
    pub async fn make_requests(self, requests: Vec<String>, env: Option<Environment>) -> BatchReport {
        let env = env.map(Arc::new);
        let pool = ResponsePool::new(
            requests,
            env.clone(),
            self.ctx.settings.max_workers,
            self.sender,
        );
        tracing::info!(
            batch_id = %self.ctx.batch_id,
            requests = pool.num_requests(),
            max_workers = pool.max_workers(),
            has_env = env.is_some(),
            "starting batch"
        );

        let worker = tokio::spawn(pool.clone().run());
        let gathered =
            gather_responses(&pool, &self.ctx, self.view.as_ref(), self.hooks.as_ref()).await;
        if let Err(err) = worker.await {
            tracing::error!(batch_id = %self.ctx.batch_id, error = %err, "worker pool task failed");
        }

        BatchReport {
            batch_id: self.ctx.batch_id,
            environment: env.as_deref().cloned(),
            records: gathered.records,
            ticks: gathered.ticks,
        }
    }
}
