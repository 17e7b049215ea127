//! Logical button events and callback dispatch

use std::fmt;

/// Logical events produced by the per-line state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    /// Debounced transition to pressed
    Press,
    /// Debounced transition to released
    Release,
    /// Release that happened before the hold threshold; always follows
    /// the matching [`ButtonEvent::Release`]
    Click,
    /// Press crossed the hold threshold (at most once per press)
    Hold,
    /// Periodic re-fire after [`ButtonEvent::Hold`] while still pressed
    Repeat,
}

impl fmt::Display for ButtonEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ButtonEvent::Press => "PRESS",
            ButtonEvent::Release => "RELEASE",
            ButtonEvent::Click => "CLICK",
            ButtonEvent::Hold => "HOLD",
            ButtonEvent::Repeat => "REPEAT",
        };
        f.write_str(name)
    }
}

/// Caller-supplied event sink.
///
/// Invoked synchronously on the worker thread that produced the event, once
/// per emission, in production order. It must be fast and non-blocking; a
/// slow callback stalls debounce and tick timing for every line.
pub type EventCallback = Box<dyn Fn(ButtonEvent, usize) + Send + Sync>;

/// Stateless fan-out from the workers to the caller's callback.
pub(crate) struct Dispatcher {
    callback: EventCallback,
}

impl Dispatcher {
    pub(crate) fn new(callback: EventCallback) -> Self {
        Self { callback }
    }

    /// Deliver a batch of emissions for one line, preserving order.
    pub(crate) fn dispatch(&self, events: &[ButtonEvent], index: usize) {
        for event in events {
            (self.callback)(*event, index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_dispatch_preserves_order_and_count() {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let counter = Arc::new(AtomicUsize::new(0));

        let seen_cb = seen.clone();
        let counter_cb = counter.clone();
        let dispatcher = Dispatcher::new(Box::new(move |event, index| {
            seen_cb.lock().push((event, index));
            counter_cb.fetch_add(1, Ordering::SeqCst);
        }));

        dispatcher.dispatch(&[ButtonEvent::Release, ButtonEvent::Click], 3);

        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(
            *seen.lock(),
            vec![(ButtonEvent::Release, 3), (ButtonEvent::Click, 3)]
        );
    }

    #[test]
    fn test_event_display() {
        assert_eq!(ButtonEvent::Press.to_string(), "PRESS");
        assert_eq!(ButtonEvent::Repeat.to_string(), "REPEAT");
    }
}
