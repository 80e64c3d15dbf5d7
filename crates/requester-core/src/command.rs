//! Request command: the full lifecycle of one invocation.
//!
//! ```text
//! refresh env source → resolve env (thread + poll) → hooks.requests()
//!                                                   → BatchDriver → gather
//! ```
use crate::context::CommandContext;
use crate::data_model::BatchReport;
use crate::driver::BatchDriver;
use crate::env_runner::resolve_environment;
use crate::error::RequesterError;
use crate::extractor::refresh_view_source;
use crate::hooks::RequestHooks;
use crate::host::{HostView, ACTIVITY_STATUS_KEY};
use crate::pool::RequestSender;
use crate::settings::Settings;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::Instrument;

pub struct RequestCommand {
    view: Arc<dyn HostView>,
    hooks: Arc<dyn RequestHooks>,
    sender: Arc<dyn RequestSender>,
    settings: Settings,
}

impl RequestCommand {
    pub fn new(
        view: Arc<dyn HostView>,
        hooks: Arc<dyn RequestHooks>,
        sender: Arc<dyn RequestSender>,
        settings: Settings,
    ) -> Self {
        Self {
            view,
            hooks,
            sender,
            settings,
        }
    }

    /// Start the command and return immediately.
    ///
    /// Must be called from within a tokio runtime. There is no cancel
    /// operation; the handle only reports the outcome.
    pub fn run(self) -> JoinHandle<Result<BatchReport, RequesterError>> {
        tokio::spawn(self.execute())
    }

    /// Run the whole lifecycle on the current task.
    pub async fn execute(self) -> Result<BatchReport, RequesterError> {
        let ctx = CommandContext::new(self.settings);
        let span = tracing::info_span!("requester_command", batch_id = %ctx.batch_id);

        async move {
            let source = refresh_view_source(self.view.as_ref());
            let env = resolve_environment(source, &ctx, Arc::clone(&self.view)).await?;

            let requests = self.hooks.requests();
            self.view.set_status(ACTIVITY_STATUS_KEY, "");

            let driver = BatchDriver::new(ctx, self.view, self.hooks, self.sender);
            Ok::<_, RequesterError>(driver.make_requests(requests, env).await)
        }
        .instrument(span)
        .await
    }
}
