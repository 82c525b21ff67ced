//! The timer engine
//!
//! A small state machine over `Idle`, `Running` and `Finished`. While running
//! it stores an absolute deadline instead of a counter, and every poll
//! recomputes the remaining time from the caller's clock. Late, bunched or
//! missing polls therefore never make the countdown drift.
//!
//! Every time-dependent operation takes `now` from the caller; the engine
//! never reads a clock itself.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::durations::Durations;
use crate::error::{EngineError, EngineResult};
use crate::phase::{Phase, Status};

/// Engine state, with the data that is valid in each status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle {
        remaining: u64,
    },
    Running {
        deadline: DateTime<Utc>,
        /// Last value computed by `poll`; informational only
        remaining: u64,
    },
    Finished,
}

/// Result of a single [`TimerEngine::poll`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Not running; nothing to do
    Idle,
    /// Still counting down
    Running { remaining: u64 },
    /// The deadline passed on this poll. Reported once per completion.
    Completed { phase: Phase },
    /// Already finished on an earlier poll
    AlreadyFinished,
}

/// Read-only view of the engine for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub status: Status,
    pub remaining_seconds: u64,
    pub clock: String,
    pub sessions_completed: u32,
    /// Fraction of the current phase elapsed, in `[0, 1]`
    pub progress: f64,
    pub work_minutes: u32,
    pub break_minutes: u32,
}

/// Alternating work/break countdown
#[derive(Debug, Clone)]
pub struct TimerEngine {
    durations: Durations,
    phase: Phase,
    state: State,
    sessions_completed: u32,
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(Durations::default())
    }
}

impl TimerEngine {
    /// Create an idle engine at the start of a work phase
    pub fn new(durations: Durations) -> Self {
        Self {
            durations,
            phase: Phase::Work,
            state: State::Idle {
                remaining: durations.seconds(Phase::Work),
            },
            sessions_completed: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn durations(&self) -> Durations {
        self.durations
    }

    pub fn sessions_completed(&self) -> u32 {
        self.sessions_completed
    }

    pub fn status(&self) -> Status {
        match self.state {
            State::Idle { .. } => Status::Idle,
            State::Running { .. } => Status::Running,
            State::Finished => Status::Finished,
        }
    }

    /// Length of the current phase in seconds
    pub fn phase_seconds(&self) -> u64 {
        self.durations.seconds(self.phase)
    }

    /// Deadline of the running countdown, if any
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        match self.state {
            State::Running { deadline, .. } => Some(deadline),
            _ => None,
        }
    }

    /// Remaining seconds as of `now`.
    ///
    /// While running this is derived from the deadline rather than from the
    /// value cached by the last poll.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> u64 {
        match self.state {
            State::Idle { remaining } => remaining,
            State::Running { deadline, .. } => self.clamp_remaining(seconds_until(deadline, now)),
            State::Finished => 0,
        }
    }

    /// Fraction of the current phase elapsed as of `now`, in `[0, 1]`
    pub fn progress_at(&self, now: DateTime<Utc>) -> f64 {
        let total = self.phase_seconds();
        if total == 0 {
            return 1.0;
        }
        let elapsed = total.saturating_sub(self.remaining_at(now));
        (elapsed as f64 / total as f64).clamp(0.0, 1.0)
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> Snapshot {
        let remaining_seconds = self.remaining_at(now);
        Snapshot {
            phase: self.phase,
            status: self.status(),
            remaining_seconds,
            clock: pomo_core::format_clock(remaining_seconds),
            sessions_completed: self.sessions_completed,
            progress: self.progress_at(now),
            work_minutes: self.durations.work_minutes(),
            break_minutes: self.durations.break_minutes(),
        }
    }

    /// Idle -> Running. The deadline is `now` plus the stored remaining time.
    pub fn start(&mut self, now: DateTime<Utc>) -> EngineResult<()> {
        let State::Idle { remaining } = self.state else {
            return Err(self.invalid("start"));
        };

        let deadline = now + Duration::seconds(remaining as i64);
        self.state = State::Running {
            deadline,
            remaining,
        };
        debug!(phase = %self.phase, remaining, %deadline, "timer started");
        Ok(())
    }

    /// Running -> Idle, freezing the time left on the deadline
    pub fn pause(&mut self, now: DateTime<Utc>) -> EngineResult<()> {
        let State::Running { deadline, .. } = self.state else {
            return Err(self.invalid("pause"));
        };

        let remaining = self.clamp_remaining(seconds_until(deadline, now));
        self.state = State::Idle { remaining };
        debug!(phase = %self.phase, remaining, "timer paused");
        Ok(())
    }

    /// Idle/Finished -> Idle with a full phase. The phase is kept.
    pub fn reset(&mut self) -> EngineResult<()> {
        if matches!(self.state, State::Running { .. }) {
            return Err(self.invalid("reset"));
        }

        self.state = State::Idle {
            remaining: self.phase_seconds(),
        };
        debug!(phase = %self.phase, "timer reset");
        Ok(())
    }

    /// Jump to the other phase from any state. Never counts a session.
    pub fn skip(&mut self) -> Phase {
        let from = self.phase;
        self.enter_phase(from.next());
        debug!(from = %from, to = %self.phase, "phase skipped");
        self.phase
    }

    /// Finished -> Idle at the start of the next phase
    pub fn advance(&mut self) -> EngineResult<Phase> {
        if self.state != State::Finished {
            return Err(self.invalid("advance"));
        }

        let from = self.phase;
        self.enter_phase(from.next());
        debug!(from = %from, to = %self.phase, "phase advanced");
        Ok(self.phase)
    }

    /// Replace the phase lengths.
    ///
    /// An idle timer is rescaled to the new length of its phase at once. A
    /// running countdown keeps its deadline; the new lengths apply from the
    /// next phase on.
    pub fn configure(&mut self, work_minutes: u32, break_minutes: u32) -> EngineResult<()> {
        let durations = Durations::new(work_minutes, break_minutes)?;
        self.durations = durations;

        if let State::Idle { .. } = self.state {
            self.state = State::Idle {
                remaining: self.phase_seconds(),
            };
        }

        debug!(work_minutes, break_minutes, status = %self.status(), "durations configured");
        Ok(())
    }

    /// Recompute the countdown against `now`.
    ///
    /// The Running -> Finished transition happens here and only here, so the
    /// session counter and the `Completed` outcome fire once per phase.
    pub fn poll(&mut self, now: DateTime<Utc>) -> PollOutcome {
        let deadline = match self.state {
            State::Idle { .. } => return PollOutcome::Idle,
            State::Finished => return PollOutcome::AlreadyFinished,
            State::Running { deadline, .. } => deadline,
        };

        let left = seconds_until(deadline, now);
        if left > 0 {
            let remaining = self.clamp_remaining(left);
            self.state = State::Running {
                deadline,
                remaining,
            };
            return PollOutcome::Running { remaining };
        }

        self.state = State::Finished;
        if self.phase == Phase::Work {
            self.sessions_completed += 1;
        }
        info!(
            phase = %self.phase,
            sessions_completed = self.sessions_completed,
            late_by_ms = (now - deadline).num_milliseconds(),
            "phase complete"
        );
        PollOutcome::Completed { phase: self.phase }
    }

    fn enter_phase(&mut self, phase: Phase) {
        self.phase = phase;
        self.state = State::Idle {
            remaining: self.phase_seconds(),
        };
    }

    fn clamp_remaining(&self, seconds: i64) -> u64 {
        (seconds.max(0) as u64).min(self.phase_seconds())
    }

    fn invalid(&self, operation: &'static str) -> EngineError {
        EngineError::InvalidTransition {
            operation,
            status: self.status(),
        }
    }
}

/// Whole seconds from `now` until `deadline`, rounded up.
///
/// Zero or negative once the deadline has been reached.
fn seconds_until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (deadline - now).num_milliseconds();
    millis.div_euclid(1000) + i64::from(millis.rem_euclid(1000) > 0)
}
