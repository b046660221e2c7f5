//! The lookahead scheduler: the only component that makes timing real.
//!
//! A periodic tick queries the current pattern over a small window ahead of
//! now and hands the resulting haps to a [`crate::Sink`] at their wall-clock
//! deadlines. Everything here is pure except the tick loop itself; pattern
//! evaluation never touches shared state.

use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use strudel_core::{silence, Fraction, Pattern, State, TimeSpan, Value};

use crate::clock::{Clock, SystemClock};
use crate::command::{Command, SchedulerHandle};
use crate::sink::Sink;

/// What happens to a hap whose deadline has already passed by the time the
/// tick gets around to dispatching it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatePolicy {
    /// Drop the hap and log a warning (the spec's default).
    Drop,
    /// Dispatch it immediately instead of at its nominal deadline.
    DispatchImmediately,
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Wall-clock seconds between ticks.
    pub interval: Duration,
    /// Wall-clock seconds the tick queries ahead of `now`.
    pub lookahead: Duration,
    /// Starting tempo in cycles per second.
    pub cps: f64,
    pub late_policy: LatePolicy,
    /// Haps whose deadline is more than this many seconds in the past are
    /// logged at a lower severity; they're dropped either way.
    pub drop_threshold: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            interval: Duration::from_millis(50),
            lookahead: Duration::from_millis(100),
            cps: 0.5,
            late_policy: LatePolicy::Drop,
            drop_threshold: 1.0,
        }
    }
}

/// One hap paired with the deadline it was resolved to, ready for dispatch.
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub value: Value,
    pub whole: Option<TimeSpan>,
    pub part: TimeSpan,
    pub deadline_seconds: f64,
}

/// Drives a [`Pattern`] forward in time and hands its events to a [`Sink`].
///
/// Owns its state exclusively; the only way in from another thread is
/// through a [`SchedulerHandle`], whose commands are drained at the top of
/// each tick. `cps`, `phase`, `start_time` and `start_beat` are never
/// touched except by whichever thread is ticking.
pub struct Scheduler<C: Clock = SystemClock> {
    clock: C,
    config: SchedulerConfig,
    commands: crossbeam_channel::Receiver<Command>,

    pattern: Pattern,
    cps: f64,
    start_time: f64,
    start_beat: Fraction,
    phase: Fraction,
    running: bool,
    exit_requested: bool,
}

impl Scheduler<SystemClock> {
    pub fn new(config: SchedulerConfig) -> (Self, SchedulerHandle) {
        Self::with_clock(config, SystemClock::new())
    }
}

impl<C: Clock> Scheduler<C> {
    pub fn with_clock(config: SchedulerConfig, clock: C) -> (Self, SchedulerHandle) {
        if config.lookahead < config.interval * 2 {
            tracing::warn!(
                interval = ?config.interval,
                lookahead = ?config.lookahead,
                "lookahead should be at least 2x the tick interval to absorb jitter"
            );
        }
        let (tx, rx) = crossbeam_channel::unbounded();
        let now = clock.now();
        let cps = config.cps;
        let scheduler = Scheduler {
            clock,
            config,
            commands: rx,
            pattern: silence(),
            cps,
            start_time: now,
            start_beat: Fraction::from_int(0),
            phase: Fraction::from_int(0),
            running: false,
            exit_requested: false,
        };
        (scheduler, SchedulerHandle { tx })
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn phase(&self) -> Fraction {
        self.phase
    }

    pub fn cps(&self) -> f64 {
        self.cps
    }

    /// `beats_to_time(b) = (b - start_beat) / cps + start_time`
    pub fn beats_to_time(&self, b: Fraction) -> f64 {
        (b.to_float() - self.start_beat.to_float()) / self.cps + self.start_time
    }

    /// `time_to_beats(t) = (t - start_time) * cps + start_beat`
    pub fn time_to_beats(&self, t: f64) -> Fraction {
        Fraction::from_float((t - self.start_time) * self.cps) + self.start_beat
    }

    fn drain_commands(&mut self, sink: &dyn Sink) {
        while let Ok(cmd) = self.commands.try_recv() {
            match cmd {
                Command::SetPattern(p) => {
                    tracing::debug!("pattern swapped");
                    self.pattern = p;
                }
                Command::SetCps(cps) => {
                    // Re-anchor so the beat/time mapping stays continuous
                    // across the tempo change instead of jumping.
                    let now = self.clock.now();
                    self.start_time = now;
                    self.start_beat = self.phase;
                    self.cps = cps;
                    tracing::info!(cps, "tempo changed");
                }
                Command::Start => {
                    if !self.running {
                        let now = self.clock.now();
                        self.start_time = now;
                        self.start_beat = self.phase;
                        self.running = true;
                        tracing::info!("scheduler started");
                    }
                }
                Command::Stop => {
                    self.running = false;
                    self.exit_requested = true;
                    tracing::info!("scheduler stopped");
                }
                Command::Hush => {
                    sink.on_hush();
                    tracing::info!("hush");
                }
            }
        }
    }

    /// Run one tick against the given sink. Returns the haps dispatched
    /// this tick, in ascending deadline order, for callers that want to
    /// inspect what happened (tests, a visualizer feed).
    ///
    /// Safe to call whether or not the scheduler is running: commands are
    /// always drained, but the query/dispatch step only runs while
    /// `running` is true, so an idle scheduler still responds to
    /// `start`/`set_pattern` sent before playback begins.
    pub fn tick(&mut self, sink: &dyn Sink) -> Vec<Dispatch> {
        self.drain_commands(sink);
        if !self.running {
            return Vec::new();
        }

        let now = self.clock.now();
        let window_end = now + self.config.lookahead.as_secs_f64();

        let b0 = self.phase;
        let mut b1 = self.time_to_beats(window_end);
        if b1 <= b0 {
            // Guards the monotone-progress invariant against a tempo of
            // zero or a clock that hasn't moved since the last tick.
            b1 = b0 + Fraction::new(1, 1_000_000);
        }

        let span = TimeSpan::new(b0, b1);
        let haps = self.query_safely(span);

        let mut dispatches: Vec<Dispatch> = Vec::with_capacity(haps.len());
        for hap in haps {
            let deadline = self.beats_to_time(hap.part.begin);
            if deadline < now {
                match self.config.late_policy {
                    LatePolicy::Drop => {
                        if now - deadline > self.config.drop_threshold {
                            tracing::debug!(deadline, now, "dropping stale late event");
                        } else {
                            tracing::warn!(deadline, now, "dropping late event");
                        }
                        continue;
                    }
                    LatePolicy::DispatchImmediately => {
                        dispatches.push(Dispatch {
                            value: hap.value,
                            whole: hap.whole,
                            part: hap.part,
                            deadline_seconds: now,
                        });
                        continue;
                    }
                }
            }
            dispatches.push(Dispatch {
                value: hap.value,
                whole: hap.whole,
                part: hap.part,
                deadline_seconds: deadline,
            });
        }

        dispatches.sort_by(|a, b| {
            a.deadline_seconds
                .partial_cmp(&b.deadline_seconds)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        for d in &dispatches {
            if let Err(e) = sink.on_event(
                d.value.clone(),
                d.whole,
                d.part,
                d.deadline_seconds,
                self.cps,
            ) {
                tracing::error!(error = %e, "sink rejected event");
            }
        }

        self.phase = b1;
        dispatches
    }

    /// Query the pattern, catching panics from malformed combinators so a
    /// single bad subtree never takes the scheduler down. Per the failure
    /// semantics, that tick simply yields an empty result for the query.
    fn query_safely(&self, span: TimeSpan) -> Vec<strudel_core::Hap> {
        let pattern = &self.pattern;
        let state = State::new(span);
        match panic::catch_unwind(AssertUnwindSafe(|| pattern.query(state))) {
            Ok(haps) => haps,
            Err(_) => {
                tracing::error!("pattern query panicked; yielding empty result for this tick");
                Vec::new()
            }
        }
    }

    /// Block the current thread, ticking at `config.interval` until a
    /// [`Command::Stop`] is drained. Intended to run on its own dedicated
    /// thread; hosts with their own audio callback can call
    /// [`Scheduler::tick`] directly instead and drive the interval
    /// themselves.
    pub fn run(mut self, sink: impl Sink + 'static) {
        loop {
            self.tick(&sink);
            if self.exit_requested {
                break;
            }
            std::thread::sleep(self.config.interval);
        }
    }
}
