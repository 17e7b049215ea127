//! Virtual keyboard emitter
//!
//! Consumes [`ButtonEvent`]s and drives a uinput virtual keyboard so that
//! ordinary applications see the physical buttons as a standard keyboard:
//!
//! - PRESS  → key-down for the line's key
//! - RELEASE → key-up (plus releasing an engaged Shift)
//! - HOLD   → optionally engage Left-Shift for the rest of the press,
//!   and/or tap a marker key
//! - REPEAT → tap the line's key again
//! - CLICK  → nothing extra; the short press already produced down+up
//!
//! Emission failures after the device exists are logged and swallowed: a
//! dropped key event is recoverable, tearing down the engine for it is not.

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent, Key};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::engine::ButtonEvent;

/// Result type for keypad operations
pub type Result<T> = std::result::Result<T, KeypadError>;

/// Virtual keyboard error types
#[derive(Error, Debug)]
pub enum KeypadError {
    /// uinput device creation failed (startup-fatal)
    #[error("failed to create uinput device (is /dev/uinput accessible?): {0}")]
    DeviceCreate(#[source] std::io::Error),

    /// Key name in the configuration is not a known evdev key
    #[error("unknown key name: {0}")]
    UnknownKey(String),
}

/// Behavior toggles carried over from the keypad configuration.
#[derive(Debug, Clone, Copy)]
pub struct KeypadOptions {
    /// Hold Left-Shift for the remainder of a press once HOLD fires
    pub shift_on_hold: bool,
    /// Tap a marker key when HOLD fires
    pub hold_marker: bool,
    /// The marker key (default F13)
    pub hold_marker_key: Key,
}

impl Default for KeypadOptions {
    fn default() -> Self {
        Self {
            shift_on_hold: true,
            hold_marker: false,
            hold_marker_key: Key::KEY_F13,
        }
    }
}

/// Parse an evdev key name ("KEY_UP") or a bare numeric code.
pub fn parse_key(name: &str) -> Result<Key> {
    if let Ok(code) = name.parse::<u16>() {
        return Ok(Key::new(code));
    }
    name.parse::<Key>()
        .map_err(|_| KeypadError::UnknownKey(name.to_string()))
}

/// Virtual keyboard bound to one key per engine line index.
pub struct Keypad {
    device: VirtualDevice,
    keycodes: Vec<Key>,
    shift_engaged: Vec<bool>,
    options: KeypadOptions,
}

impl Keypad {
    /// Create the uinput device with every key it may ever emit registered
    /// up front (per-line keys, Shift, marker).
    pub fn open(name: &str, keycodes: Vec<Key>, options: KeypadOptions) -> Result<Self> {
        let mut keys = AttributeSet::<Key>::new();
        for key in &keycodes {
            keys.insert(*key);
        }
        if options.shift_on_hold {
            keys.insert(Key::KEY_LEFTSHIFT);
        }
        if options.hold_marker {
            keys.insert(options.hold_marker_key);
        }

        let device = VirtualDeviceBuilder::new()
            .map_err(KeypadError::DeviceCreate)?
            .name(name)
            .with_keys(&keys)
            .map_err(KeypadError::DeviceCreate)?
            .build()
            .map_err(KeypadError::DeviceCreate)?;

        info!(name, keys = keycodes.len(), "virtual keyboard created");

        let shift_engaged = vec![false; keycodes.len()];
        Ok(Self {
            device,
            keycodes,
            shift_engaged,
            options,
        })
    }

    /// Translate one engine emission into key events.
    ///
    /// Indices outside the keycode table are ignored; the engine only
    /// produces indices for registered lines, but the table is caller-owned.
    pub fn handle(&mut self, event: ButtonEvent, index: usize) {
        let Some(&key) = self.keycodes.get(index) else {
            warn!(index, "event for line with no key mapping");
            return;
        };

        debug!(%event, index, code = key.code(), "keypad event");

        match event {
            ButtonEvent::Press => self.key_down(key),
            ButtonEvent::Release => {
                self.key_up(key);
                if self.shift_engaged[index] {
                    self.key_up(Key::KEY_LEFTSHIFT);
                    self.shift_engaged[index] = false;
                }
            }
            ButtonEvent::Hold => {
                if self.options.shift_on_hold && !self.shift_engaged[index] {
                    self.key_down(Key::KEY_LEFTSHIFT);
                    self.shift_engaged[index] = true;
                }
                if self.options.hold_marker {
                    self.key_tap(self.options.hold_marker_key);
                }
            }
            ButtonEvent::Repeat => self.key_tap(key),
            ButtonEvent::Click => {}
        }
    }

    fn emit(&mut self, key: Key, value: i32) {
        let event = InputEvent::new(EventType::KEY, key.code(), value);
        if let Err(e) = self.device.emit(&[event]) {
            warn!(code = key.code(), value, "uinput emit failed: {e}");
        }
    }

    fn key_down(&mut self, key: Key) {
        self.emit(key, 1);
    }

    fn key_up(&mut self, key: Key) {
        self.emit(key, 0);
    }

    fn key_tap(&mut self, key: Key) {
        self.key_down(key);
        self.key_up(key);
    }
}
