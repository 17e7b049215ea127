//! Per-line button state machine
//!
//! Pure transition logic, no I/O and no locking. The two entry points mirror
//! the two workers that drive a line:
//!
//! - [`LineState::on_raw_edge`] — called by the reader for every hardware
//!   edge; performs debounce, polarity correction, and the press/release
//!   transitions (PRESS, RELEASE, CLICK).
//! - [`LineState::on_tick`] — called by the scanner on a fixed cadence;
//!   performs the time-driven transitions (HOLD, REPEAT) that a steady press
//!   can never trigger through edges alone.
//!
//! CLICK is decided retroactively at release time (release before the hold
//! threshold) rather than by a short-press timer, so a late release and an
//! early timer can never race. HOLD and CLICK are mutually exclusive
//! outcomes of one press.

use std::time::{Duration, Instant};

use super::event::ButtonEvent;

/// Global timing parameters shared by every line.
#[derive(Debug, Clone, Copy)]
pub struct Timing {
    /// Minimum spacing between accepted edges on one line
    pub debounce: Duration,
    /// Continuous-press duration at which HOLD fires
    pub hold: Duration,
    /// Spacing of REPEAT emissions after HOLD; `None` disables repeat
    pub repeat: Option<Duration>,
}

/// Mutable runtime state for one monitored line.
///
/// Shared between the reader and scanner workers; the engine wraps each
/// instance in its own lock so the five fields always update as a unit.
#[derive(Debug, Clone, Copy)]
pub struct LineState {
    /// Debounced logical press state
    pressed: bool,
    /// Time of the most recently accepted (post-debounce) edge
    last_edge: Option<Instant>,
    /// Time the current press began; `Some` only while `pressed`
    pressed_at: Option<Instant>,
    /// Whether HOLD already fired for the current press
    hold_fired: bool,
    /// Time of the last HOLD/REPEAT emission for the current press
    last_repeat: Option<Instant>,
}

impl LineState {
    /// Initial (released) state.
    pub fn new() -> Self {
        Self {
            pressed: false,
            last_edge: None,
            pressed_at: None,
            hold_fired: false,
            last_repeat: None,
        }
    }

    /// Current debounced press state.
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Process one hardware edge.
    ///
    /// Returns the emissions in order (at most RELEASE then CLICK). An edge
    /// inside the debounce window is dropped entirely: no emission, no state
    /// change, and the stored edge timestamp keeps its old value so a bounce
    /// burst cannot keep extending the window.
    pub fn on_raw_edge(
        &mut self,
        active_low: bool,
        rising: bool,
        now: Instant,
        timing: &Timing,
    ) -> Vec<ButtonEvent> {
        if let Some(last) = self.last_edge {
            if now.duration_since(last) < timing.debounce {
                return Vec::new();
            }
        }
        self.last_edge = Some(now);

        let effective_pressed = if active_low { !rising } else { rising };

        if effective_pressed && !self.pressed {
            self.pressed = true;
            self.pressed_at = Some(now);
            self.hold_fired = false;
            self.last_repeat = Some(now);
            return vec![ButtonEvent::Press];
        }

        if !effective_pressed && self.pressed {
            let short = match self.pressed_at {
                Some(at) => now.duration_since(at) < timing.hold,
                None => false,
            };
            self.pressed = false;
            self.pressed_at = None;
            self.hold_fired = false;
            self.last_repeat = None;

            let mut emitted = vec![ButtonEvent::Release];
            if short {
                emitted.push(ButtonEvent::Click);
            }
            return emitted;
        }

        // Same-direction edge: no logical transition.
        Vec::new()
    }

    /// Re-evaluate hold/repeat deadlines for the scanner.
    ///
    /// Emits at most one event per tick: HOLD when the press first crosses
    /// the threshold (`duration >= hold`), then REPEAT at multiples of the
    /// repeat interval while still pressed.
    pub fn on_tick(&mut self, now: Instant, timing: &Timing) -> Option<ButtonEvent> {
        if !self.pressed {
            return None;
        }
        let pressed_at = self.pressed_at?;

        if !self.hold_fired {
            if now.duration_since(pressed_at) >= timing.hold {
                self.hold_fired = true;
                self.last_repeat = Some(now);
                return Some(ButtonEvent::Hold);
            }
            return None;
        }

        let repeat = timing.repeat?;
        let last = self.last_repeat?;
        if now.duration_since(last) >= repeat {
            self.last_repeat = Some(now);
            return Some(ButtonEvent::Repeat);
        }
        None
    }
}

impl Default for LineState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn timing(debounce_ms: u64, hold_ms: u64, repeat_ms: u64) -> Timing {
        Timing {
            debounce: Duration::from_millis(debounce_ms),
            hold: Duration::from_millis(hold_ms),
            repeat: if repeat_ms == 0 {
                None
            } else {
                Some(Duration::from_millis(repeat_ms))
            },
        }
    }

    /// Fixed time base so tests are fully deterministic.
    fn base() -> Instant {
        Instant::now()
    }

    fn at(base: Instant, ms: u64) -> Instant {
        base + Duration::from_millis(ms)
    }

    // active_low = true throughout: falling = press, rising = release,
    // matching the default pull-up wiring.

    #[test]
    fn test_press_release_under_hold_is_click() {
        // debounce=12, hold=600, repeat off: press@0 release@150
        let t = timing(12, 600, 0);
        let b = base();
        let mut state = LineState::new();

        assert_eq!(
            state.on_raw_edge(true, false, at(b, 0), &t),
            vec![ButtonEvent::Press]
        );
        assert!(state.is_pressed());

        assert_eq!(
            state.on_raw_edge(true, true, at(b, 150), &t),
            vec![ButtonEvent::Release, ButtonEvent::Click]
        );
        assert!(!state.is_pressed());
    }

    #[test]
    fn test_bounce_within_window_is_dropped() {
        // Two rapid edges at 0ms and 5ms with debounce=12ms: one PRESS only.
        let t = timing(12, 600, 0);
        let b = base();
        let mut state = LineState::new();

        assert_eq!(
            state.on_raw_edge(true, false, at(b, 0), &t),
            vec![ButtonEvent::Press]
        );
        assert!(state.on_raw_edge(true, true, at(b, 5), &t).is_empty());
        // Bounce must not toggle the debounced state.
        assert!(state.is_pressed());
    }

    #[test]
    fn test_bounce_does_not_extend_window() {
        // Dropped edge keeps the old timestamp, so an edge one window after
        // the accepted edge is accepted even if a bounce landed in between.
        let t = timing(12, 600, 0);
        let b = base();
        let mut state = LineState::new();

        state.on_raw_edge(true, false, at(b, 0), &t);
        assert!(state.on_raw_edge(true, true, at(b, 5), &t).is_empty());
        assert_eq!(
            state.on_raw_edge(true, true, at(b, 12), &t),
            vec![ButtonEvent::Release, ButtonEvent::Click]
        );
    }

    #[test]
    fn test_same_direction_edge_is_noop() {
        let t = timing(12, 600, 0);
        let b = base();
        let mut state = LineState::new();

        state.on_raw_edge(true, false, at(b, 0), &t);
        // Another press-direction edge outside the window: no emission.
        assert!(state.on_raw_edge(true, false, at(b, 50), &t).is_empty());
        assert!(state.is_pressed());

        state.on_raw_edge(true, true, at(b, 100), &t);
        // Release-direction edge while already released.
        assert!(state.on_raw_edge(true, true, at(b, 200), &t).is_empty());
        assert!(!state.is_pressed());
    }

    #[test]
    fn test_active_high_polarity() {
        let t = timing(12, 600, 0);
        let b = base();
        let mut state = LineState::new();

        assert_eq!(
            state.on_raw_edge(false, true, at(b, 0), &t),
            vec![ButtonEvent::Press]
        );
        assert_eq!(
            state.on_raw_edge(false, false, at(b, 100), &t),
            vec![ButtonEvent::Release, ButtonEvent::Click]
        );
    }

    #[test]
    fn test_hold_fires_once_at_threshold() {
        let t = timing(12, 600, 0);
        let b = base();
        let mut state = LineState::new();

        state.on_raw_edge(true, false, at(b, 0), &t);

        // Ticks before the threshold emit nothing.
        assert_eq!(state.on_tick(at(b, 590), &t), None);
        // duration == hold_threshold fires HOLD (>= convention).
        assert_eq!(state.on_tick(at(b, 600), &t), Some(ButtonEvent::Hold));
        // One-shot: later ticks with repeat disabled emit nothing.
        assert_eq!(state.on_tick(at(b, 610), &t), None);
        assert_eq!(state.on_tick(at(b, 2000), &t), None);
    }

    #[test]
    fn test_release_after_hold_has_no_click() {
        let t = timing(12, 600, 0);
        let b = base();
        let mut state = LineState::new();

        state.on_raw_edge(true, false, at(b, 0), &t);
        assert_eq!(state.on_tick(at(b, 600), &t), Some(ButtonEvent::Hold));
        assert_eq!(
            state.on_raw_edge(true, true, at(b, 700), &t),
            vec![ButtonEvent::Release]
        );
    }

    #[test]
    fn test_hold_then_repeats_at_interval() {
        // debounce=12, hold=600, repeat=200; press@0, ticks every 10ms
        // through 1000ms: HOLD@600, REPEAT@800, REPEAT@1000.
        let t = timing(12, 600, 200);
        let b = base();
        let mut state = LineState::new();

        state.on_raw_edge(true, false, at(b, 0), &t);

        let mut emitted = Vec::new();
        let mut ms = 0;
        while ms <= 1000 {
            if let Some(event) = state.on_tick(at(b, ms), &t) {
                emitted.push((event, ms));
            }
            ms += 10;
        }

        assert_eq!(
            emitted,
            vec![
                (ButtonEvent::Hold, 600),
                (ButtonEvent::Repeat, 800),
                (ButtonEvent::Repeat, 1000),
            ]
        );

        assert_eq!(
            state.on_raw_edge(true, true, at(b, 1000), &t),
            vec![ButtonEvent::Release]
        );
    }

    #[test]
    fn test_repeat_count_matches_duration() {
        // floor((D - hold) / R) repeats for a press of duration D.
        let t = timing(5, 100, 30);
        let b = base();

        for duration_ms in [100u64, 129, 130, 200, 310] {
            let mut state = LineState::new();
            state.on_raw_edge(true, false, at(b, 0), &t);

            let mut repeats = 0u64;
            let mut holds = 0u64;
            // 1ms cadence so tick boundaries line up exactly.
            for ms in 0..=duration_ms {
                match state.on_tick(at(b, ms), &t) {
                    Some(ButtonEvent::Hold) => holds += 1,
                    Some(ButtonEvent::Repeat) => repeats += 1,
                    Some(other) => panic!("unexpected emission {other}"),
                    None => {}
                }
            }

            assert_eq!(holds, 1, "duration {duration_ms}");
            assert_eq!(repeats, (duration_ms - 100) / 30, "duration {duration_ms}");
        }
    }

    #[test]
    fn test_tick_while_released_is_noop() {
        let t = timing(12, 600, 200);
        let b = base();
        let mut state = LineState::new();

        assert_eq!(state.on_tick(at(b, 1000), &t), None);
        assert!(!state.is_pressed());
    }

    #[test]
    fn test_second_press_rearms_hold() {
        let t = timing(12, 100, 0);
        let b = base();
        let mut state = LineState::new();

        state.on_raw_edge(true, false, at(b, 0), &t);
        assert_eq!(state.on_tick(at(b, 100), &t), Some(ButtonEvent::Hold));
        state.on_raw_edge(true, true, at(b, 200), &t);

        // New press starts with hold_fired cleared.
        assert_eq!(
            state.on_raw_edge(true, false, at(b, 300), &t),
            vec![ButtonEvent::Press]
        );
        assert_eq!(state.on_tick(at(b, 350), &t), None);
        assert_eq!(state.on_tick(at(b, 400), &t), Some(ButtonEvent::Hold));
    }

    proptest! {
        /// Alternating edges spaced at least one debounce window apart
        /// always produce PRESS, RELEASE, (CLICK iff short), repeated.
        #[test]
        fn prop_alternating_edges_alternate_events(
            gaps in prop::collection::vec(12u64..2000, 1..40),
        ) {
            let t = timing(12, 600, 0);
            let b = base();
            let mut state = LineState::new();

            let mut now_ms = 0u64;
            let mut pressed_at_ms = 0u64;
            for (i, gap) in gaps.iter().enumerate() {
                let press = i % 2 == 0;
                let emitted = state.on_raw_edge(true, !press, at(b, now_ms), &t);

                if press {
                    prop_assert_eq!(emitted, vec![ButtonEvent::Press]);
                    pressed_at_ms = now_ms;
                } else {
                    let short = now_ms - pressed_at_ms < 600;
                    if short {
                        prop_assert_eq!(
                            emitted,
                            vec![ButtonEvent::Release, ButtonEvent::Click]
                        );
                    } else {
                        prop_assert_eq!(emitted, vec![ButtonEvent::Release]);
                    }
                }
                prop_assert_eq!(state.is_pressed(), press);
                now_ms += gap;
            }
        }

        /// Edges inside the debounce window never emit and never toggle the
        /// debounced state, regardless of direction.
        #[test]
        fn prop_bounce_never_toggles(
            bounce_gaps in prop::collection::vec(0u64..12, 1..20),
            directions in prop::collection::vec(any::<bool>(), 20),
        ) {
            let t = timing(12, 600, 0);
            let b = base();
            let mut state = LineState::new();

            state.on_raw_edge(true, false, at(b, 0), &t);
            prop_assert!(state.is_pressed());

            // All bounces land inside the window of the accepted edge.
            let mut now_ms = 0u64;
            for (gap, rising) in bounce_gaps.iter().zip(directions.iter()) {
                now_ms = (now_ms + gap).min(11);
                let emitted = state.on_raw_edge(true, *rising, at(b, now_ms), &t);
                prop_assert!(emitted.is_empty());
                prop_assert!(state.is_pressed());
            }
        }
    }
}
