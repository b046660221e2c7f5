//! Error taxonomy for the scheduler.
//!
//! Nothing here is fatal except `ClockUnavailable`: parse errors are a
//! mini-notation concern, query errors are caught per-tick and logged, and
//! sink errors are the sink's problem to report, not the scheduler's to
//! propagate.

/// Error surfaced by a [`crate::Sink`] while handling a dispatched event.
///
/// Sink implementations return their own error type converted to a string;
/// the scheduler never inspects the cause, only logs it and continues.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct SinkError(pub String);

impl SinkError {
    pub fn new(msg: impl Into<String>) -> Self {
        SinkError(msg.into())
    }
}

/// Fatal or reportable scheduler errors.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// The monotonic clock could not be read. Per the error taxonomy this is
    /// the only fatal case: the scheduler stops and the sink is hushed.
    #[error("monotonic clock unavailable: {0}")]
    ClockUnavailable(String),

    /// A rational-time computation overflowed or divided by zero while
    /// mapping beats to wall time. Promoted from `strudel_core::TimeError`.
    #[error("time computation failed: {0}")]
    Time(#[from] strudel_core::TimeError),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
