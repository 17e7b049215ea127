//! Configuration type definitions

use serde::{Deserialize, Serialize};

/// GPIO chip and virtual device identification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// GPIO character device path
    #[serde(default = "default_chip")]
    pub chip: String,

    /// Name the virtual keyboard registers under
    #[serde(default = "default_device_name")]
    pub name: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            chip: default_chip(),
            name: default_device_name(),
        }
    }
}

fn default_chip() -> String {
    "/dev/gpiochip0".to_string()
}

fn default_device_name() -> String {
    "GPIO Keypad (gpio-keypadd)".to_string()
}

/// Engine timing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Software debounce window in milliseconds (8-20 recommended)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Continuous-press duration before HOLD fires, milliseconds
    #[serde(default = "default_hold_ms")]
    pub hold_ms: u64,

    /// REPEAT spacing after HOLD, milliseconds (0 = disabled)
    #[serde(default = "default_repeat_ms")]
    pub repeat_ms: u64,

    /// Scanner cadence, milliseconds; must stay well below hold/repeat
    #[serde(default = "default_scan_interval_ms")]
    pub scan_interval_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            hold_ms: default_hold_ms(),
            repeat_ms: default_repeat_ms(),
            scan_interval_ms: default_scan_interval_ms(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    12
}

fn default_hold_ms() -> u64 {
    600
}

fn default_repeat_ms() -> u64 {
    200
}

fn default_scan_interval_ms() -> u64 {
    10
}

/// Keypad behavior toggles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorConfig {
    /// Hold Left-Shift for the rest of a press once HOLD fires
    #[serde(default = "default_true")]
    pub shift_on_hold: bool,

    /// Tap a marker key when HOLD fires
    #[serde(default)]
    pub hold_marker: bool,

    /// Marker key name
    #[serde(default = "default_hold_marker_key")]
    pub hold_marker_key: String,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            shift_on_hold: true,
            hold_marker: false,
            hold_marker_key: default_hold_marker_key(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_hold_marker_key() -> String {
    "KEY_F13".to_string()
}

/// One monitored line and its key association
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineEntry {
    /// Hardware line offset on the chip
    pub offset: u32,

    /// Button wired to ground (pressed pulls the line low)
    #[serde(default = "default_true")]
    pub active_low: bool,

    /// Request the internal pull resistor matching the polarity
    #[serde(default = "default_true")]
    pub enable_pull: bool,

    /// evdev key name ("KEY_UP") or numeric keycode
    pub key: String,
}
