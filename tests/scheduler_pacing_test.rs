//! Deterministic pacing tests: the session loop driven by a simulated clock

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use vsync_tiles::engine::{
    run_session, Clock, FrameHandler, FrameStatsSnapshot, PresentSurface, SchedulerConfig,
    SessionControl, SessionParts, StopSignal, SurfaceError,
};

const MS: i64 = 1_000_000;

/// Time only moves when the loop sleeps or a frame "costs" something.
#[derive(Clone, Default)]
struct SimClock {
    now: Arc<AtomicI64>,
}

impl SimClock {
    fn advance(&self, nanos: i64) {
        self.now.fetch_add(nanos, Ordering::SeqCst);
    }
}

impl Clock for SimClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }

    fn sleep(&self, nanos: i64, _stop: &StopSignal) {
        self.advance(nanos);
    }
}

/// Remembers at what time each present happened.
#[derive(Default)]
struct TimedSurface {
    clock: SimClock,
    presents: Vec<i64>,
    syncs: usize,
    fail_present: bool,
    frame: u64,
}

impl PresentSurface for TimedSurface {
    type Canvas = u64;

    fn allocate(&mut self) -> Result<(), SurfaceError> {
        Ok(())
    }

    fn back_buffer(&mut self) -> &mut u64 {
        &mut self.frame
    }

    fn contents_lost(&mut self) -> bool {
        false
    }

    fn sync(&mut self) -> Result<(), SurfaceError> {
        self.syncs += 1;
        Ok(())
    }

    fn present(&mut self) -> Result<(), SurfaceError> {
        if self.fail_present {
            return Err(SurfaceError::NotAllocated);
        }
        self.presents.push(self.clock.now());
        Ok(())
    }

    fn release(&mut self) {}
}

/// Per-cycle frame costs; stops once they run out.
struct CostedFrames {
    clock: SimClock,
    stop: StopSignal,
    costs: Vec<i64>,
    skipped: Vec<u32>,
    rendered: u64,
}

impl FrameHandler<u64> for CostedFrames {
    fn update(&mut self, skipped: u32) {
        let cycle = self.skipped.len();
        self.skipped.push(skipped);
        match self.costs.get(cycle) {
            Some(&cost) => self.clock.advance(cost),
            None => self.stop.raise(),
        }
    }

    fn render(&mut self, frame: &mut u64) {
        self.rendered += 1;
        *frame = self.rendered;
    }
}

struct Outcome {
    skipped: Vec<u32>,
    presents: Vec<i64>,
    stats: FrameStatsSnapshot,
    syncs: usize,
}

fn simulate(config: SchedulerConfig, costs: Vec<i64>, fail_present: bool) -> Outcome {
    let clock = SimClock::default();
    let control = SessionControl::new();
    let mut parts = SessionParts {
        surface: TimedSurface {
            clock: clock.clone(),
            fail_present,
            ..TimedSurface::default()
        },
        handler: CostedFrames {
            clock: clock.clone(),
            stop: control.stop_signal().clone(),
            costs,
            skipped: Vec::new(),
            rendered: 0,
        },
        clock,
    };
    run_session(&mut parts, config, &control);
    Outcome {
        skipped: parts.handler.skipped,
        presents: parts.surface.presents,
        stats: control.stats().snapshot(),
        syncs: parts.surface.syncs,
    }
}

#[test]
fn test_presents_land_on_exact_tick_boundaries() {
    let out = simulate(SchedulerConfig::new(3, 1000).unwrap(), vec![0; 6], false);
    assert_eq!(
        out.presents,
        vec![
            333_333_333,
            666_666_666,
            1_000_000_000,
            1_333_333_333,
            1_666_666_666,
            2_000_000_000,
        ]
    );
    assert_eq!(out.syncs, 6);
}

#[test]
fn test_no_drift_over_many_units() {
    for (ticks, unit_ms) in [(60, 1000), (7, 1000), (50, 834)] {
        let units = 5;
        let cycles = (ticks * units) as usize;
        let config = SchedulerConfig::new(ticks, unit_ms).unwrap();
        let out = simulate(config, vec![0; cycles], false);
        assert_eq!(out.presents.len(), cycles);
        assert_eq!(
            *out.presents.last().unwrap(),
            units as i64 * unit_ms as i64 * MS,
            "{ticks} per {unit_ms}ms"
        );
    }
}

#[test]
fn test_frame_cost_under_one_tick_does_not_shift_deadlines() {
    let costs = vec![30 * MS, 99 * MS, 0, 100 * MS];
    let out = simulate(SchedulerConfig::new(10, 1000).unwrap(), costs, false);
    assert_eq!(out.presents, vec![100 * MS, 200 * MS, 300 * MS, 400 * MS]);
    assert_eq!(out.stats.skipped, 0);
}

#[test]
fn test_k_overruns_are_reported_on_next_update() {
    // Each costly frame overruns by a whole number of 100ms ticks plus a bit.
    let costs = vec![0, 250 * MS, 0, 420 * MS, 0];
    let out = simulate(SchedulerConfig::new(10, 1000).unwrap(), costs, false);
    assert_eq!(out.skipped, vec![0, 0, 2, 0, 4, 0]);
    assert_eq!(out.stats.skipped, 6);
    assert_eq!(out.stats.resyncs, 0);
    // Deadlines stay on the tick grid after catching up.
    assert!(out.presents.iter().all(|t| t % (100 * MS) == 0));
}

#[test]
fn test_sustained_overload_resynchronizes_instead_of_spiraling() {
    let costs = vec![0, 5_000 * MS, 0, 0];
    let out = simulate(SchedulerConfig::new(10, 1000).unwrap(), costs, false);
    assert_eq!(out.skipped, vec![0, 0, 8, 0, 0]);
    assert_eq!(out.stats.resyncs, 1);

    // After the resync the loop runs on time from the stall onwards.
    let after = &out.presents[1..];
    assert_eq!(after[0], 5_100 * MS);
    assert_eq!(after[1] - after[0], 100 * MS);
    assert_eq!(after[2] - after[1], 100 * MS);
}

#[test]
fn test_clock_going_backwards_is_absorbed() {
    let costs = vec![0, -500 * MS, 0];
    let out = simulate(SchedulerConfig::new(10, 1000).unwrap(), costs, false);
    assert_eq!(out.skipped, vec![0, 0, 0, 0]);
    assert_eq!(out.stats.resyncs, 1);
    assert_eq!(out.stats.presented, 3);
    // Spacing is preserved from the new, earlier time base.
    assert_eq!(out.presents[2] - out.presents[1], 100 * MS);
}

#[test]
fn test_present_failures_are_counted_not_fatal() {
    let out = simulate(SchedulerConfig::default(), vec![0; 4], true);
    assert_eq!(out.stats.present_errors, 4);
    assert_eq!(out.stats.presented, 0);
    assert_eq!(out.stats.cycles, 5);
}

#[test]
fn test_stop_from_callback_ends_session_before_present() {
    let out = simulate(SchedulerConfig::default(), vec![], false);
    assert_eq!(out.skipped, vec![0]);
    assert!(out.presents.is_empty());
    assert_eq!(out.stats.cycles, 1);
}
