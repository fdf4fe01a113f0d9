#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure playback scheduler that owns round-advance timing.
//!
//! The scheduler is a small state machine over injected time deltas; it
//! never touches the wall clock itself, so its transitions replay
//! deterministically in tests. It decides *when* the next round should be
//! processed; the driver loads the snapshot, runs reconciliation, and
//! reports back with [`Playback::advance_confirmed`] or
//! [`Playback::finish`].

use std::time::Duration;

/// Cadence used when the rate control sits at its maximum.
const FASTEST_INTERVAL: Duration = Duration::from_millis(1);

/// Rate control position the scheduler boots with.
const DEFAULT_RATE: f32 = 0.5;

/// Lifecycle states of a playback session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlaybackState {
    /// Awaiting a start command; no rounds are processed.
    Idle,
    /// Rounds advance automatically or through manual steps.
    Running,
    /// Terminal; every further tick or step request is a no-op.
    Finished,
}

/// Permission to process one round, granted by the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundAdvance {
    /// Round the driver should load and reconcile next.
    pub round: u32,
}

/// Scheduler that advances rounds either automatically at a configurable
/// cadence or one manual step at a time.
#[derive(Clone, Debug)]
pub struct Playback {
    state: PlaybackState,
    round: u32,
    interval: Option<Duration>,
    accumulator: Duration,
}

impl Default for Playback {
    fn default() -> Self {
        Self::new()
    }
}

impl Playback {
    /// Creates an idle scheduler positioned before round zero with the
    /// default rate.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: PlaybackState::Idle,
            round: 0,
            interval: interval_for(DEFAULT_RATE),
            accumulator: Duration::ZERO,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> PlaybackState {
        self.state
    }

    /// Round that will be granted by the next advance.
    #[must_use]
    pub const fn next_round(&self) -> u32 {
        self.round
    }

    /// Automatic cadence currently in effect; `None` means manual stepping
    /// only.
    #[must_use]
    pub const fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Begins playback. Only an idle scheduler starts; a finished session
    /// requires [`Playback::restart`] first.
    pub fn start(&mut self) {
        if self.state == PlaybackState::Idle {
            self.state = PlaybackState::Running;
            self.accumulator = Duration::ZERO;
        }
    }

    /// Reconfigures the cadence from a normalized control value in `[0, 1]`.
    ///
    /// At the maximum the interval collapses to the fastest automatic
    /// cadence; at the minimum it becomes zero, which means manual stepping
    /// only; in between the interval is `1 - control` seconds.
    pub fn set_rate(&mut self, control: f32) {
        self.interval = interval_for(control.clamp(0.0, 1.0));
    }

    /// Feeds elapsed time into the scheduler, granting at most one round
    /// advance once the configured interval has elapsed.
    pub fn tick(&mut self, dt: Duration) -> Option<RoundAdvance> {
        if self.state != PlaybackState::Running {
            return None;
        }
        let interval = self.interval?;

        self.accumulator = self.accumulator.saturating_add(dt);
        if self.accumulator < interval {
            return None;
        }

        self.accumulator = Duration::ZERO;
        Some(RoundAdvance { round: self.round })
    }

    /// Grants exactly one round advance regardless of the configured rate.
    /// No-op unless the session is running.
    pub fn step(&mut self) -> Option<RoundAdvance> {
        if self.state != PlaybackState::Running {
            return None;
        }
        self.accumulator = Duration::ZERO;
        Some(RoundAdvance { round: self.round })
    }

    /// Records that the granted round was processed, moving the counter to
    /// the next round. Rounds are strictly sequential; the counter never
    /// skips or repeats.
    pub fn advance_confirmed(&mut self) {
        self.round = self.round.saturating_add(1);
    }

    /// Ends the session. A missing round (normal end of match) and a fatal
    /// snapshot error both land here.
    pub fn finish(&mut self) {
        self.state = PlaybackState::Finished;
    }

    /// Resets the scheduler to idle at round zero, keeping the configured
    /// rate.
    pub fn restart(&mut self) {
        self.state = PlaybackState::Idle;
        self.round = 0;
        self.accumulator = Duration::ZERO;
    }
}

fn interval_for(control: f32) -> Option<Duration> {
    if control >= 1.0 {
        Some(FASTEST_INTERVAL)
    } else if control <= 0.0 {
        None
    } else {
        Some(Duration::from_secs_f32(1.0 - control))
    }
}
