//! Edge reader worker
//!
//! Blocks on the edge source with a short timeout (so the stop flag is
//! observed promptly), then drains every pending edge and feeds them through
//! the state machine in arrival order. Draining fully before re-blocking is
//! a correctness requirement: kernel edge buffers are finite and an
//! overflowed buffer loses transitions irrecoverably.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, trace, warn};

use crate::gpio::{Drain, EdgeSource, RawEdge};

use super::error::EngineError;
use super::EngineShared;

/// Wait timeout per cycle; bounds shutdown latency.
const WAIT_TIMEOUT: Duration = Duration::from_millis(100);

/// Consecutive failures after which the engine is faulted.
const MAX_FAILURE_STREAK: u32 = 10;

pub(super) fn run(shared: Arc<EngineShared>, mut source: Box<dyn EdgeSource>) {
    debug!("reader worker started");
    let mut failure_streak = 0u32;

    while shared.running.load(Ordering::Acquire) {
        match source.wait_and_drain(WAIT_TIMEOUT) {
            Ok(Drain::Timeout) => {
                failure_streak = 0;
            }
            Ok(Drain::Edges(edges)) => {
                failure_streak = 0;
                for edge in edges {
                    process_edge(&shared, edge);
                }
            }
            Err(e) => {
                // Single transient failures self-heal; a sustained streak
                // means the source is gone and the caller must restart.
                failure_streak += 1;
                warn!(
                    streak = failure_streak,
                    "edge source read failed: {e}"
                );
                if failure_streak >= MAX_FAILURE_STREAK {
                    error!(
                        streak = failure_streak,
                        "edge source failure streak; stopping engine"
                    );
                    shared.record_fault(EngineError::ReadFailureStreak(failure_streak));
                    break;
                }
            }
        }
    }

    // Source handle is released here, after the loop exits.
    drop(source);
    debug!("reader worker stopped");
}

fn process_edge(shared: &EngineShared, edge: RawEdge) {
    let Some(index) = shared.registry.index_of(edge.offset) else {
        // Hardware layers may coalesce or report extra lines; an edge for an
        // unregistered line is dropped by policy, not an error.
        trace!(offset = edge.offset, "edge on unregistered line dropped");
        return;
    };

    // Index came from the registry, so both lookups are in range.
    let active_low = shared.registry.get(index).map(|l| l.active_low).unwrap_or(true);

    let emitted = {
        let mut state = shared.lines[index].lock();
        state.on_raw_edge(active_low, edge.rising, edge.timestamp, &shared.timing)
    };

    if !emitted.is_empty() {
        trace!(index, rising = edge.rising, ?emitted, "edge processed");
        shared.dispatcher.dispatch(&emitted, index);
    }
}
