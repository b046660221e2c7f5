//! Control operations, per the single-writer/multi-reader model: callers
//! never mutate scheduler state directly, they enqueue a command that the
//! tick thread drains at the top of its next iteration.

use strudel_core::Pattern;

pub enum Command {
    SetPattern(Pattern),
    SetCps(f64),
    Start,
    Stop,
    Hush,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::SetPattern(_) => write!(f, "SetPattern(..)"),
            Command::SetCps(cps) => write!(f, "SetCps({cps})"),
            Command::Start => write!(f, "Start"),
            Command::Stop => write!(f, "Stop"),
            Command::Hush => write!(f, "Hush"),
        }
    }
}

/// Cloneable handle used by callers (a REPL, a UI thread) to drive a
/// running [`crate::Scheduler`] without touching its state directly.
#[derive(Clone)]
pub struct SchedulerHandle {
    pub(crate) tx: crossbeam_channel::Sender<Command>,
}

impl SchedulerHandle {
    /// Atomically swap the pattern the scheduler queries on subsequent
    /// ticks. Already-dispatched events are unaffected. Pair with
    /// [`SchedulerHandle::hush`] for a clean swap that also cancels
    /// whatever the previous pattern had sustaining.
    pub fn set_pattern(&self, pattern: Pattern) {
        let _ = self.tx.send(Command::SetPattern(pattern));
    }

    /// Re-anchor the beat/time mapping and change tempo.
    pub fn set_cps(&self, cps: f64) {
        let _ = self.tx.send(Command::SetCps(cps));
    }

    pub fn start(&self) {
        let _ = self.tx.send(Command::Start);
    }

    pub fn stop(&self) {
        let _ = self.tx.send(Command::Stop);
    }

    /// Silence all sustained events on the sink without stopping the tick.
    pub fn hush(&self) {
        let _ = self.tx.send(Command::Hush);
    }
}
