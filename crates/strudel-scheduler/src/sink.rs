//! Abstract backend interface.
//!
//! The scheduler knows nothing about audio, MIDI or OSC; it only knows how
//! to hand a merged control value and a deadline to whatever implements
//! this trait. Concrete sinks are external collaborators.

use crate::error::SinkError;
use strudel_core::{TimeSpan, Value};

/// Consumer of timed events produced by a [`crate::Scheduler`].
pub trait Sink: Send + Sync {
    /// Dispatch one event. `deadline_seconds` is wall-clock time (same
    /// epoch as the scheduler's clock) at which the event should sound;
    /// `cycles_per_second` is the tempo in effect when it was computed.
    fn on_event(
        &self,
        value: Value,
        whole: Option<TimeSpan>,
        part: TimeSpan,
        deadline_seconds: f64,
        cycles_per_second: f64,
    ) -> Result<(), SinkError>;

    /// Flush any held state: note-offs for MIDI, voice cancellation for
    /// audio, cancel in-flight OSC bundles, and so on.
    fn on_hush(&self);
}

/// A sink that records every dispatched event instead of forwarding it
/// anywhere. Useful for tests and for the `strudel-mini` CLI's dry-run
/// playback demo.
#[derive(Default)]
pub struct LoggingSink {
    events: parking_lot::Mutex<Vec<DispatchedEvent>>,
    hushes: std::sync::atomic::AtomicUsize,
}

/// A single dispatch recorded by [`LoggingSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchedEvent {
    pub value: Value,
    pub whole: Option<TimeSpan>,
    pub part: TimeSpan,
    pub deadline_seconds: f64,
    pub cycles_per_second: f64,
}

impl LoggingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything dispatched so far, in dispatch order.
    pub fn events(&self) -> Vec<DispatchedEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    pub fn hush_count(&self) -> usize {
        self.hushes.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl Sink for LoggingSink {
    fn on_event(
        &self,
        value: Value,
        whole: Option<TimeSpan>,
        part: TimeSpan,
        deadline_seconds: f64,
        cycles_per_second: f64,
    ) -> Result<(), SinkError> {
        tracing::debug!(?value, deadline_seconds, "dispatching event");
        self.events.lock().push(DispatchedEvent {
            value,
            whole,
            part,
            deadline_seconds,
            cycles_per_second,
        });
        Ok(())
    }

    fn on_hush(&self) {
        tracing::debug!("hush");
        self.events.lock().clear();
        self.hushes.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}
