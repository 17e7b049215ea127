//! GPIO Edge Source
//!
//! Abstracts the hardware side of the engine: a set of monitored input lines
//! that report rising/falling transitions. The engine only ever talks to the
//! [`EdgeSource`] trait; the production implementation ([`CdevEdgeSource`])
//! sits on the Linux GPIO character device, and tests substitute scripted
//! sources.
//!
//! The adapter is deliberately dumb: it opens the lines once, then serves
//! `wait_and_drain` calls. All debounce/polarity interpretation happens in
//! the engine's state machine.

mod cdev;

pub use cdev::CdevEdgeSource;

use std::time::{Duration, Instant};
use thiserror::Error;

/// Result type for GPIO operations
pub type Result<T> = std::result::Result<T, GpioError>;

/// GPIO adapter error types
///
/// Startup classification matters to callers: busy / not-found / permission
/// are all fatal to engine construction, while [`GpioError::Io`] during
/// operation is transient and retried by the reader worker.
#[derive(Error, Debug)]
pub enum GpioError {
    /// GPIO chip device does not exist
    #[error("GPIO chip not found: {0}")]
    DeviceNotFound(String),

    /// Insufficient permissions to open the chip
    #[error("permission denied opening GPIO chip {0} (is the user in the gpio group?)")]
    PermissionDenied(String),

    /// Line request rejected, typically because another process holds the lines
    #[error("GPIO line request failed (lines may be claimed elsewhere): {0}")]
    Busy(#[source] gpiocdev::Error),

    /// Transient I/O failure on an open request
    #[error("GPIO I/O error: {0}")]
    Io(#[source] gpiocdev::Error),

    /// Chip inspection failed for a reason other than not-found/permission
    #[error("failed to inspect GPIO chip {chip}: {source}")]
    Chip {
        /// Chip device path
        chip: String,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

/// Internal pull resistor policy for one line.
///
/// Derived from the caller's `active_low`/`enable_pull` pair: an active-low
/// button wants a pull-up, an active-high one a pull-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    /// No bias requested
    None,
    /// Pull-up resistor
    Up,
    /// Pull-down resistor
    Down,
}

/// Per-line parameters for opening an edge source.
#[derive(Debug, Clone, Copy)]
pub struct LineRequest {
    /// Hardware line offset on the chip
    pub offset: u32,
    /// Pull resistor policy
    pub pull: Pull,
}

/// A single raw edge reported by the hardware.
///
/// `rising` is the physical direction; polarity correction (active-low)
/// happens later in the state machine. The timestamp is taken on the
/// monotonic clock at drain time.
#[derive(Debug, Clone, Copy)]
pub struct RawEdge {
    /// Hardware line offset as reported by the kernel
    pub offset: u32,
    /// Physical rising (true) or falling (false) transition
    pub rising: bool,
    /// Monotonic timestamp of the drain that observed this edge
    pub timestamp: Instant,
}

/// Outcome of a single wait-and-drain cycle.
#[derive(Debug)]
pub enum Drain {
    /// One or more edges arrived, in kernel arrival order
    Edges(Vec<RawEdge>),
    /// The wait timed out with no pending edges
    Timeout,
}

/// Source of raw edge events for a fixed set of lines.
///
/// Implementations own whatever handle the hardware requires and release it
/// on drop. `wait_and_drain` must return every pending edge before the next
/// wait: kernel edge buffers are finite and an un-drained backlog loses
/// events irrecoverably.
pub trait EdgeSource: Send {
    /// Block for up to `timeout` waiting for edges, then drain all of them.
    fn wait_and_drain(&mut self, timeout: Duration) -> Result<Drain>;
}
