//! Response gathering loop.
//!
//! Polls the pool every `refresh_ms`, hands each newly completed record to
//! the hooks as it arrives, and once the pool is done reports the whole
//! batch in submission order.
use crate::activity;
use crate::context::CommandContext;
use crate::data_model::ResponseRecord;
use crate::hooks::RequestHooks;
use crate::host::{HostView, ACTIVITY_STATUS_KEY};
use crate::pool::{PoolSnapshot, ResponsePool};

const ACTIVITY_LABEL: &str = "Requester";

/// Explicit state of the response loop between ticks.
#[derive(Debug, Clone, Default)]
pub struct GatherState {
    pub tick: u64,
    pub collected: Vec<ResponseRecord>,
}

impl GatherState {
    /// Records every drained record in arrival order and returns them for
    /// per-record callbacks.
    pub fn absorb(&mut self, drained: Vec<ResponseRecord>) -> &[ResponseRecord] {
        let start = self.collected.len();
        self.collected.extend(drained);
        &self.collected[start..]
    }

    /// All collected records, sorted by ordering index.
    pub fn finish(self) -> Vec<ResponseRecord> {
        let mut records = self.collected;
        records.sort_by_key(|record| record.ordering);
        records
    }
}

/// Final result of a gathering loop.
#[derive(Debug, Clone)]
pub struct Gathered {
    pub records: Vec<ResponseRecord>,
    pub ticks: u64,
}

/// Poll `pool` until it is done.
pub async fn gather_responses(
    pool: &ResponsePool,
    ctx: &CommandContext,
    view: &dyn HostView,
    hooks: &dyn RequestHooks,
) -> Gathered {
    let settings = &ctx.settings;
    let num_requests = pool.num_requests();
    let mut state = GatherState::default();

    loop {
        let PoolSnapshot {
            pending,
            drained,
            is_done,
        } = pool.snapshot();

        let glyph = activity::render(state.tick, settings.activity_spaces);
        view.set_status(ACTIVITY_STATUS_KEY, &format!("{} {}", ACTIVITY_LABEL, glyph));
        hooks.on_pending_activity(&pending, state.tick, &glyph);

        for record in state.absorb(drained) {
            hooks.on_response(record, num_requests);
            if record.is_error() {
                hooks.on_error(record, num_requests);
            }
        }

        if is_done {
            let ticks = state.tick;
            let records = state.finish();
            tracing::info!(
                batch_id = %ctx.batch_id,
                requests = num_requests,
                errors = records.iter().filter(|r| r.is_error()).count(),
                ticks,
                elapsed_ms = ctx.elapsed_ms(),
                "batch finished"
            );
            hooks.on_responses(&records);
            hooks.on_errors(&records, view);
            view.set_status(ACTIVITY_STATUS_KEY, "");
            return Gathered { records, ticks };
        }

        state.tick += 1;
        tokio::time::sleep(settings.refresh_interval()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(ordering: usize) -> ResponseRecord {
        ResponseRecord::success(format!("r{}", ordering), ordering, json!(ordering), 1)
    }

    #[test]
    fn test_absorb_returns_only_new_records() {
        let mut state = GatherState::default();
        assert_eq!(state.absorb(vec![record(2)]).len(), 1);
        let fresh: Vec<usize> = state
            .absorb(vec![record(0), record(1)])
            .iter()
            .map(|r| r.ordering)
            .collect();
        assert_eq!(fresh, vec![0, 1]);
        assert_eq!(state.collected.len(), 3);
    }

    #[test]
    fn test_finish_restores_submission_order() {
        let mut state = GatherState::default();
        state.absorb(vec![record(3), record(0), record(2), record(1)]);
        let orderings: Vec<usize> = state.finish().iter().map(|r| r.ordering).collect();
        assert_eq!(orderings, vec![0, 1, 2, 3]);
    }
}
