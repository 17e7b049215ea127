//! Configuration management
//!
//! Handles loading, validation, and conversion of configuration from:
//! - TOML files
//! - CLI argument overrides
//!
//! The shipped default maps six buttons on a Raspberry Pi header to the
//! arrow/enter/escape keys, active-low with internal pull-ups.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

pub mod types;

pub use types::{BehaviorConfig, DeviceConfig, EngineConfig, LineEntry};

use crate::engine::{LineConfig, Timing};
use crate::keypad::{parse_key, KeypadOptions};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// GPIO chip and virtual device identification
    #[serde(default)]
    pub device: DeviceConfig,

    /// Engine timing
    #[serde(default)]
    pub engine: EngineConfig,

    /// Keypad behavior toggles
    #[serde(default)]
    pub behavior: BehaviorConfig,

    /// Monitored lines, in key-table order
    #[serde(default)]
    pub lines: Vec<LineEntry>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Default configuration: the six-button BCM pin map.
    pub fn default_config() -> Result<Self> {
        let pin = |offset: u32, key: &str| LineEntry {
            offset,
            active_low: true,
            enable_pull: true,
            key: key.to_string(),
        };

        let config = Config {
            device: DeviceConfig::default(),
            engine: EngineConfig::default(),
            behavior: BehaviorConfig::default(),
            lines: vec![
                pin(25, "KEY_UP"),
                pin(6, "KEY_DOWN"),
                pin(3, "KEY_LEFT"),
                pin(7, "KEY_RIGHT"),
                pin(5, "KEY_ENTER"),
                pin(27, "KEY_ESC"),
            ],
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI overrides on top of the loaded file.
    pub fn with_overrides(mut self, chip: Option<String>) -> Self {
        if let Some(chip) = chip {
            self.device.chip = chip;
        }
        self
    }

    /// Validate configuration consistency.
    pub fn validate(&self) -> Result<()> {
        if self.lines.is_empty() {
            bail!("no lines configured; at least one [[lines]] entry is required");
        }

        let mut seen = HashSet::new();
        for line in &self.lines {
            if !seen.insert(line.offset) {
                bail!("line offset {} configured more than once", line.offset);
            }
            parse_key(&line.key)
                .with_context(|| format!("line offset {}: bad key name", line.offset))?;
        }

        if self.engine.hold_ms == 0 {
            bail!("hold_ms must be greater than zero");
        }
        if self.engine.scan_interval_ms == 0 {
            bail!("scan_interval_ms must be greater than zero");
        }
        if self.engine.scan_interval_ms >= self.engine.hold_ms {
            bail!(
                "scan_interval_ms ({}) must be smaller than hold_ms ({})",
                self.engine.scan_interval_ms,
                self.engine.hold_ms
            );
        }
        if self.engine.repeat_ms != 0 && self.engine.scan_interval_ms > self.engine.repeat_ms {
            bail!(
                "scan_interval_ms ({}) must not exceed repeat_ms ({})",
                self.engine.scan_interval_ms,
                self.engine.repeat_ms
            );
        }

        if self.behavior.hold_marker {
            parse_key(&self.behavior.hold_marker_key).context("bad hold_marker_key")?;
        }

        Ok(())
    }

    /// Engine timing parameters.
    pub fn timing(&self) -> Timing {
        Timing {
            debounce: Duration::from_millis(self.engine.debounce_ms),
            hold: Duration::from_millis(self.engine.hold_ms),
            repeat: if self.engine.repeat_ms == 0 {
                None
            } else {
                Some(Duration::from_millis(self.engine.repeat_ms))
            },
        }
    }

    /// Scanner cadence.
    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.engine.scan_interval_ms)
    }

    /// Hardware debounce period requested from the kernel.
    ///
    /// Mirrors the software window, with a 10 ms fallback when software
    /// debounce is disabled.
    pub fn hw_debounce(&self) -> Duration {
        let ms = if self.engine.debounce_ms == 0 {
            10
        } else {
            self.engine.debounce_ms
        };
        Duration::from_millis(ms)
    }

    /// Per-line engine configuration, in file order.
    pub fn line_configs(&self) -> Vec<LineConfig> {
        self.lines
            .iter()
            .map(|line| LineConfig {
                offset: line.offset,
                active_low: line.active_low,
                enable_pull: line.enable_pull,
            })
            .collect()
    }

    /// Per-line keycodes, in the same order as [`Config::line_configs`].
    ///
    /// Infallible after [`Config::validate`] has passed.
    pub fn keycodes(&self) -> Result<Vec<evdev::Key>> {
        self.lines
            .iter()
            .map(|line| {
                parse_key(&line.key)
                    .with_context(|| format!("line offset {}: bad key name", line.offset))
            })
            .collect()
    }

    /// Keypad behavior options.
    pub fn keypad_options(&self) -> Result<KeypadOptions> {
        Ok(KeypadOptions {
            shift_on_hold: self.behavior.shift_on_hold,
            hold_marker: self.behavior.hold_marker,
            hold_marker_key: parse_key(&self.behavior.hold_marker_key)
                .context("bad hold_marker_key")?,
        })
    }
}
