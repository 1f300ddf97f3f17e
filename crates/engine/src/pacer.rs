//! Software vertical-blank pacing.
//!
//! The pacer splits each timing unit into `ticks_per_unit` ticks. Tick `n`
//! ends at `n * unit / ticks_per_unit` nanoseconds into the unit, computed with
//! integer truncation from the unit start, so the per-tick rounding remainder
//! carries into the next tick and the ticks of one unit always add up to
//! exactly one unit.
//!
//! Wall time is tracked as `last_wall`, the instant the previous tick was
//! scheduled to end. A cycle that finishes before its tick ends waits for it;
//! a cycle that overruns consumes further ticks without presenting (skips)
//! until it catches up. After [`MAX_CATCH_UP_SKIPS`] consecutive skips, or when
//! the clock is observed running backwards, `last_wall` is moved so that the
//! current tick counts as exactly on time (resynchronization).
//!
//! The pacer never reads a clock itself; callers pass in samples. This keeps
//! it deterministic under test.

use crate::config::SchedulerConfig;
use crate::types::MAX_CATCH_UP_SKIPS;

/// Mutable pacing state, reset at the start of every session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PacerState {
    /// Tick within the current unit, `1..=ticks_per_unit`.
    pub tick_index: u32,
    /// Nanoseconds of the current unit already handed out to earlier ticks.
    pub tick_accumulated: i64,
    /// Ticks consumed without presenting since the last present.
    pub skipped: u32,
    /// Scheduled end of the previous tick, in clock nanoseconds.
    pub last_wall: i64,
}

/// Elapsed wall time since `last_wall`, after any resynchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elapsed {
    pub nanos: i64,
    pub resynced: bool,
}

#[derive(Debug, Clone)]
pub struct Pacer {
    ticks_per_unit: u32,
    unit_nanos: i64,
    state: PacerState,
}

impl Pacer {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            ticks_per_unit: config.ticks_per_unit(),
            unit_nanos: config.unit_nanos(),
            state: PacerState {
                tick_index: 1,
                ..PacerState::default()
            },
        }
    }

    pub fn reset(&mut self, now: i64) {
        self.state = PacerState {
            tick_index: 1,
            tick_accumulated: 0,
            skipped: 0,
            last_wall: now,
        };
    }

    pub fn state(&self) -> PacerState {
        self.state
    }

    /// Length of the next tick in nanoseconds; advances the tick counter.
    pub fn next_tick_duration(&mut self) -> i64 {
        let s = &mut self.state;
        let end = (s.tick_index as i128 * self.unit_nanos as i128 / self.ticks_per_unit as i128) as i64;
        let duration = end - s.tick_accumulated;

        let wrapped = s.tick_index % self.ticks_per_unit;
        s.tick_accumulated = if wrapped == 0 {
            0
        } else {
            s.tick_accumulated + duration
        };
        s.tick_index = wrapped + 1;
        duration
    }

    /// Elapsed time at the top of a pacing step.
    ///
    /// Resynchronizes on a backwards clock or once the skip limit is reached.
    pub fn measure(&mut self, now: i64, target: i64) -> Elapsed {
        let elapsed = now - self.state.last_wall;
        if elapsed < 0 || self.state.skipped >= MAX_CATCH_UP_SKIPS {
            return self.resync(elapsed, target);
        }
        Elapsed {
            nanos: elapsed,
            resynced: false,
        }
    }

    /// Elapsed time re-sampled after a pacing sleep.
    ///
    /// Only a backwards clock resynchronizes here.
    pub fn measure_after_wait(&mut self, now: i64, target: i64) -> Elapsed {
        let elapsed = now - self.state.last_wall;
        if elapsed < 0 {
            return self.resync(elapsed, target);
        }
        Elapsed {
            nanos: elapsed,
            resynced: false,
        }
    }

    fn resync(&mut self, elapsed: i64, target: i64) -> Elapsed {
        self.state.last_wall += elapsed - target;
        Elapsed {
            nanos: target,
            resynced: true,
        }
    }

    /// The tick ended on time: move `last_wall` to its scheduled end.
    pub fn commit(&mut self, target: i64) {
        self.state.last_wall += target;
    }

    /// The tick was overrun: count a skip and move on to the next tick.
    pub fn skip(&mut self, target: i64) {
        self.state.skipped += 1;
        self.state.last_wall += target;
    }

    /// Skips since the last present; resets the count.
    pub fn take_skipped(&mut self) -> u32 {
        std::mem::take(&mut self.state.skipped)
    }
}
