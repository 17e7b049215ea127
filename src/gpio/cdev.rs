//! Linux GPIO character device edge source
//!
//! One `gpiocdev` request covers all monitored lines: both-edge detection,
//! per-line bias, and a kernel-side debounce period. The engine's software
//! debounce still applies on top; the kernel filter just thins out the worst
//! of the contact bounce before it reaches userspace.

use std::io::ErrorKind;
use std::time::{Duration, Instant};

use gpiocdev::line::{Bias, EdgeDetection, EdgeKind};
use gpiocdev::Request;
use tracing::{debug, info};

use super::{Drain, EdgeSource, GpioError, LineRequest, Pull, RawEdge, Result};

const CONSUMER: &str = "gpio-keypadd";

/// Edge source backed by `/dev/gpiochipN`.
#[derive(Debug)]
pub struct CdevEdgeSource {
    request: Request,
    chip: String,
}

impl CdevEdgeSource {
    /// Open the given lines for both-edge event monitoring.
    ///
    /// Fatal failures are classified for the caller: missing chip,
    /// insufficient permissions, or a rejected line request (most commonly
    /// because another process already claimed a line).
    pub fn open(chip: &str, lines: &[LineRequest], hw_debounce: Duration) -> Result<Self> {
        classify_chip(chip)?;

        let mut builder = Request::builder();
        builder.on_chip(chip).with_consumer(CONSUMER);

        for line in lines {
            builder
                .with_line(line.offset)
                .as_input()
                .with_edge_detection(EdgeDetection::BothEdges)
                .with_debounce_period(hw_debounce);
            match line.pull {
                Pull::Up => {
                    builder.with_bias(Bias::PullUp);
                }
                Pull::Down => {
                    builder.with_bias(Bias::PullDown);
                }
                Pull::None => {}
            }
        }

        let request = builder.request().map_err(GpioError::Busy)?;

        info!(
            chip,
            lines = lines.len(),
            hw_debounce_us = hw_debounce.as_micros() as u64,
            "GPIO lines requested"
        );

        Ok(Self {
            request,
            chip: chip.to_string(),
        })
    }

    /// Chip device path this source was opened on.
    pub fn chip(&self) -> &str {
        &self.chip
    }
}

impl EdgeSource for CdevEdgeSource {
    fn wait_and_drain(&mut self, timeout: Duration) -> Result<Drain> {
        if !self.request.wait_edge_event(timeout).map_err(GpioError::Io)? {
            return Ok(Drain::Timeout);
        }

        // Stamp the whole batch once; the spacing the debounce logic cares
        // about is far coarser than the drain loop.
        let now = Instant::now();
        let mut edges = Vec::new();
        loop {
            let event = self.request.read_edge_event().map_err(GpioError::Io)?;
            edges.push(RawEdge {
                offset: event.offset,
                rising: matches!(event.kind, EdgeKind::Rising),
                timestamp: now,
            });
            if !self.request.has_edge_event().map_err(GpioError::Io)? {
                break;
            }
        }

        debug!(count = edges.len(), "drained edge events");
        Ok(Drain::Edges(edges))
    }
}

/// Map a chip access failure onto the startup error taxonomy.
fn classify_chip(chip: &str) -> Result<()> {
    match std::fs::metadata(chip) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(GpioError::DeviceNotFound(chip.to_string()))
        }
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            Err(GpioError::PermissionDenied(chip.to_string()))
        }
        Err(source) => Err(GpioError::Chip {
            chip: chip.to_string(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_chip_is_not_found() {
        let err = classify_chip("/dev/gpiochip-does-not-exist").unwrap_err();
        assert!(matches!(err, GpioError::DeviceNotFound(_)));
    }

    #[test]
    fn test_open_missing_chip_fails() {
        let lines = [LineRequest {
            offset: 4,
            pull: Pull::Up,
        }];
        let err = CdevEdgeSource::open(
            "/dev/gpiochip-does-not-exist",
            &lines,
            Duration::from_millis(10),
        )
        .unwrap_err();
        assert!(matches!(err, GpioError::DeviceNotFound(_)));
    }
}
