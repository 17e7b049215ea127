//! Button Event Engine
//!
//! Turns raw GPIO edges into logical button events (PRESS / RELEASE / CLICK
//! / HOLD / REPEAT) and delivers them to a caller-supplied callback.
//!
//! # Architecture
//!
//! ```text
//! Edge Source ──wait/drain──> Reader worker ──┐
//!                                             ├──> per-line LineState ──> Dispatcher ──> callback
//!            10ms cadence ──> Scanner worker ─┘        (locked)
//! ```
//!
//! Two workers run for the engine's lifetime. The reader blocks on the edge
//! source and feeds debounced press/release transitions; the scanner ticks
//! on a fixed cadence to fire the purely time-driven HOLD/REPEAT
//! transitions. Both mutate the same per-line state table, each line behind
//! its own lock so the five state fields always update as a unit.
//!
//! Shutdown signals both workers, joins them, and releases the edge source
//! handle. All interval arithmetic uses the monotonic clock.

pub mod error;
pub mod event;
pub mod registry;
pub mod state;

mod reader;
mod scanner;

pub use error::{EngineError, Result};
pub use event::{ButtonEvent, EventCallback};
pub use registry::{LineConfig, LineRegistry};
pub use state::{LineState, Timing};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::gpio::EdgeSource;

use event::Dispatcher;

/// Shared state between the engine handle and its two workers.
pub(crate) struct EngineShared {
    pub(crate) registry: LineRegistry,
    pub(crate) timing: Timing,
    pub(crate) scan_interval: Duration,
    pub(crate) lines: Vec<Mutex<LineState>>,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) running: AtomicBool,
    pub(crate) fault: Mutex<Option<EngineError>>,
}

impl EngineShared {
    /// Record a fatal runtime fault and stop both workers.
    pub(crate) fn record_fault(&self, err: EngineError) {
        *self.fault.lock() = Some(err);
        self.running.store(false, Ordering::Release);
    }
}

/// The button event engine.
///
/// Owns the per-line state table and the two worker threads. Construct with
/// [`ButtonEngine::start`], stop with [`ButtonEngine::shutdown`]; dropping a
/// running engine performs a best-effort shutdown.
pub struct ButtonEngine {
    shared: Arc<EngineShared>,
    reader: Option<JoinHandle<()>>,
    scanner: Option<JoinHandle<()>>,
}

impl ButtonEngine {
    /// Start the engine over an already-opened edge source.
    ///
    /// The registry must describe the same lines the source was opened for;
    /// edges for anything else are silently dropped. The callback runs
    /// synchronously on the worker threads and must not block.
    pub fn start(
        registry: LineRegistry,
        timing: Timing,
        scan_interval: Duration,
        source: Box<dyn EdgeSource>,
        callback: EventCallback,
    ) -> Result<Self> {
        let lines = (0..registry.len())
            .map(|_| Mutex::new(LineState::new()))
            .collect();

        let shared = Arc::new(EngineShared {
            registry,
            timing,
            scan_interval,
            lines,
            dispatcher: Dispatcher::new(callback),
            running: AtomicBool::new(true),
            fault: Mutex::new(None),
        });

        let reader_shared = shared.clone();
        let reader = std::thread::Builder::new()
            .name("btn-reader".into())
            .spawn(move || reader::run(reader_shared, source))
            .map_err(|source| EngineError::Spawn {
                worker: "reader",
                source,
            })?;

        let scanner_shared = shared.clone();
        let scanner = match std::thread::Builder::new()
            .name("btn-scanner".into())
            .spawn(move || scanner::run(scanner_shared))
        {
            Ok(handle) => handle,
            Err(source) => {
                // Unwind the reader before surfacing the failure.
                shared.running.store(false, Ordering::Release);
                let _ = reader.join();
                return Err(EngineError::Spawn {
                    worker: "scanner",
                    source,
                });
            }
        };

        info!(
            lines = shared.registry.len(),
            debounce_ms = shared.timing.debounce.as_millis() as u64,
            hold_ms = shared.timing.hold.as_millis() as u64,
            repeat_ms = shared
                .timing
                .repeat
                .map(|r| r.as_millis() as u64)
                .unwrap_or(0),
            "button engine started"
        );

        Ok(Self {
            shared,
            reader: Some(reader),
            scanner: Some(scanner),
        })
    }

    /// Snapshot of a line's debounced press state.
    ///
    /// Eventually consistent: an edge drained but not yet processed is not
    /// reflected. Out-of-range indices are a contract error, not UB.
    pub fn is_pressed(&self, index: usize) -> Result<bool> {
        let count = self.shared.lines.len();
        let line = self
            .shared
            .lines
            .get(index)
            .ok_or(EngineError::InvalidIndex { index, count })?;
        Ok(line.lock().is_pressed())
    }

    /// Whether both workers are still running.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Take the fault that stopped the engine, if any.
    pub fn take_fault(&self) -> Option<EngineError> {
        self.shared.fault.lock().take()
    }

    /// Number of configured lines.
    pub fn line_count(&self) -> usize {
        self.shared.lines.len()
    }

    /// Signal both workers to stop, join them, and release the edge source.
    pub fn shutdown(mut self) {
        self.stop_and_join();
        info!("button engine stopped");
    }

    fn stop_and_join(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        if let Some(reader) = self.reader.take() {
            if reader.join().is_err() {
                warn!("reader worker panicked");
            }
        }
        if let Some(scanner) = self.scanner.take() {
            if scanner.join().is_err() {
                warn!("scanner worker panicked");
            }
        }
    }
}

impl Drop for ButtonEngine {
    fn drop(&mut self) {
        if self.reader.is_some() || self.scanner.is_some() {
            self.stop_and_join();
        }
    }
}
