//! Timer scanner worker
//!
//! A held button produces no further edges, so HOLD and REPEAT must come
//! from a time-driven scan. Each tick re-evaluates every line under its
//! lock; per-line work is O(1) and the cadence is configured well below the
//! hold threshold and repeat interval, which bounds emission jitter to
//! roughly one scan interval.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, trace};

use super::EngineShared;

pub(super) fn run(shared: Arc<EngineShared>) {
    debug!(
        interval_ms = shared.scan_interval.as_millis() as u64,
        "scanner worker started"
    );

    while shared.running.load(Ordering::Acquire) {
        let now = Instant::now();

        for index in 0..shared.lines.len() {
            let emitted = {
                let mut state = shared.lines[index].lock();
                state.on_tick(now, &shared.timing)
            };
            if let Some(event) = emitted {
                trace!(index, %event, "tick emission");
                shared.dispatcher.dispatch(&[event], index);
            }
        }

        std::thread::sleep(shared.scan_interval);
    }

    debug!("scanner worker stopped");
}
