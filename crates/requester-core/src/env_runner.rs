//! Asynchronous environment resolution.
//!
//! Evaluation runs on a dedicated thread while the calling task polls it at
//! `refresh_ms / 4`, shows the `RequesterEnv` indicator and enforces
//! `timeout_env`. A timed out evaluation thread is abandoned, not killed.
use crate::activity;
use crate::context::CommandContext;
use crate::data_model::{Environment, EnvironmentSource};
use crate::error::RequesterError;
use crate::evaluator::evaluate;
use crate::host::{HostView, ACTIVITY_STATUS_KEY};
use crate::settings::{Settings, ENV_REFRESH_MULTIPLIER};
use std::sync::Arc;

const ENV_ACTIVITY_LABEL: &str = "RequesterEnv";

/// What the environment loop does after one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvStep {
    /// Keep polling; show the glyph if there is one
    Wait(Option<String>),
    TimedOut,
    Done,
}

/// Explicit state of the environment loop between ticks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvWait {
    pub tick: u64,
}

impl EnvWait {
    /// Advance one tick given whether the evaluation thread has finished.
    ///
    /// The first tick never shows an indicator, so fast evaluations do not
    /// flicker the status bar.
    pub fn step(&mut self, finished: bool, settings: &Settings) -> EnvStep {
        if finished {
            return EnvStep::Done;
        }
        if let Some(timeout) = settings.env_timeout() {
            let waited = settings.env_poll_interval().as_micros() * u128::from(self.tick);
            if waited > timeout.as_micros() {
                return EnvStep::TimedOut;
            }
        }
        let glyph = (self.tick > 0).then(|| {
            activity::render(self.tick / ENV_REFRESH_MULTIPLIER, settings.activity_spaces)
        });
        self.tick += 1;
        EnvStep::Wait(glyph)
    }
}

/// Evaluate `source` off the calling task, reporting evaluation errors
/// through `view` as soon as they happen.
pub async fn resolve_environment(
    source: EnvironmentSource,
    ctx: &CommandContext,
    view: Arc<dyn HostView>,
) -> Result<Option<Environment>, RequesterError> {
    let reporter = Arc::clone(&view);
    resolve_with(ctx, view.as_ref(), move || {
        let evaluation = evaluate(&source);
        for err in &evaluation.errors {
            tracing::warn!(error = %err, "environment source failed to evaluate");
            reporter.error_message(&err.to_string());
        }
        evaluation.environment
    })
    .await
}

/// Run `job` on a background thread and poll it until it finishes or the
/// configured timeout elapses.
pub async fn resolve_with<F>(
    ctx: &CommandContext,
    view: &dyn HostView,
    job: F,
) -> Result<Option<Environment>, RequesterError>
where
    F: FnOnce() -> Option<Environment> + Send + 'static,
{
    let handle = std::thread::Builder::new()
        .name("requester-env".to_string())
        .spawn(job)
        .map_err(|e| RequesterError::Worker(format!("failed to spawn environment thread: {}", e)))?;

    let settings = &ctx.settings;
    let mut wait = EnvWait::default();
    loop {
        match wait.step(handle.is_finished(), settings) {
            EnvStep::Wait(glyph) => {
                if let Some(glyph) = glyph {
                    view.set_status(
                        ACTIVITY_STATUS_KEY,
                        &format!("{} {}", ENV_ACTIVITY_LABEL, glyph),
                    );
                }
                tokio::time::sleep(settings.env_poll_interval()).await;
            }
            EnvStep::TimedOut => {
                tracing::warn!(
                    batch_id = %ctx.batch_id,
                    ticks = wait.tick,
                    "environment resolution timed out"
                );
                let err = RequesterError::EnvTimeout;
                view.error_message(&err.to_string());
                view.set_status(ACTIVITY_STATUS_KEY, "");
                return Err(err);
            }
            EnvStep::Done => {
                view.set_status(ACTIVITY_STATUS_KEY, "");
                let environment = handle.join().map_err(|_| {
                    RequesterError::Worker("environment evaluation panicked".to_string())
                })?;
                tracing::debug!(
                    batch_id = %ctx.batch_id,
                    ticks = wait.tick,
                    bindings = environment.as_ref().map_or(0, Environment::len),
                    "environment resolved"
                );
                return Ok(environment);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with_timeout(seconds: f64) -> Settings {
        Settings {
            timeout_env: Some(seconds),
            ..Settings::default()
        }
    }

    #[test]
    fn test_first_tick_shows_no_indicator() {
        let mut wait = EnvWait::default();
        assert_eq!(wait.step(false, &Settings::default()), EnvStep::Wait(None));
        assert!(matches!(wait.step(false, &Settings::default()), EnvStep::Wait(Some(_))));
        assert_eq!(wait.tick, 2);
    }

    #[test]
    fn test_indicator_advances_every_fourth_tick() {
        let settings = Settings::default();
        let mut wait = EnvWait { tick: 4 };
        let EnvStep::Wait(Some(glyph)) = wait.step(false, &settings) else {
            panic!("expected glyph");
        };
        assert_eq!(glyph, activity::render(1, 9));
    }

    #[test]
    fn test_finished_thread_is_done_regardless_of_timeout() {
        let mut wait = EnvWait { tick: 1_000 };
        assert_eq!(wait.step(true, &settings_with_timeout(0.0)), EnvStep::Done);
    }

    #[test]
    fn test_times_out_after_deadline() {
        // 1 second at 50ms per tick: tick 20 is exactly on the deadline
        let settings = settings_with_timeout(1.0);
        let mut wait = EnvWait { tick: 20 };
        assert!(matches!(wait.step(false, &settings), EnvStep::Wait(_)));
        assert_eq!(wait.step(false, &settings), EnvStep::TimedOut);
    }

    #[test]
    fn test_no_timeout_configured_waits_forever() {
        let mut wait = EnvWait { tick: u32::MAX as u64 };
        assert!(matches!(wait.step(false, &Settings::default()), EnvStep::Wait(_)));
    }
}
