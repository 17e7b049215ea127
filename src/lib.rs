//! # gpio-keypadd
//!
//! Turns discrete button presses on GPIO lines into logical input events
//! (press, release, short-click, long-hold, auto-repeat) and forwards them
//! as key-down/key-up events to a uinput virtual keyboard, so ordinary
//! applications perceive physical buttons as a standard keyboard.
//!
//! # Architecture
//!
//! ```text
//! gpio-keypadd
//!   ├─> Edge Source   (GPIO character device, both-edge events)
//!   ├─> Button Engine (debounce + timing state machine, two workers)
//!   └─> Keypad        (uinput virtual keyboard emitter)
//! ```
//!
//! # Data Flow
//!
//! **Edge Path:** GPIO chip → reader worker → per-line state machine →
//! callback → virtual keyboard
//!
//! **Timer Path:** scanner worker (fixed cadence) → per-line state machine →
//! callback → virtual keyboard (HOLD/REPEAT for steady presses)

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Daemon configuration
pub mod config;

/// Button event engine (debounce, hold, repeat)
pub mod engine;

/// GPIO edge source abstraction and Linux cdev implementation
pub mod gpio;

/// uinput virtual keyboard emitter
pub mod keypad;
