//! Lookahead scheduler for Strudel patterns.
//!
//! This crate owns the one piece of the system that touches a real clock:
//! it repeatedly queries a [`strudel_core::Pattern`] over a small window
//! ahead of now and hands the resulting events to a [`Sink`] at their
//! wall-clock deadlines. It does not know how to make sound, send MIDI, or
//! send OSC — those are sinks a host plugs in.

pub mod clock;
pub mod command;
pub mod error;
pub mod scheduler;
pub mod sink;

pub use clock::{Clock, ManualClock, SystemClock};
pub use command::{Command, SchedulerHandle};
pub use error::{SchedulerError, SinkError};
pub use scheduler::{Dispatch, LatePolicy, Scheduler, SchedulerConfig};
pub use sink::{DispatchedEvent, LoggingSink, Sink};

pub use strudel_core::{Fraction, Hap, Pattern, State, TimeSpan, Value};
