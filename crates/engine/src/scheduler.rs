//! Frame scheduler: drives update, render and present at a fixed rate.
//!
//! # Threading
//!
//! While stopped, the [`FrameScheduler`] owns the surface, the handler and the
//! clock. [`FrameScheduler::start`] moves them onto a dedicated frame thread,
//! and [`FrameScheduler::stop`] joins that thread and takes them back. Scene
//! state living inside the handler is therefore only ever touched by one
//! thread at a time: the host between sessions, the update callback during a
//! session. Cross-thread input goes through lock-free types such as the game
//! pad.
//!
//! # Session loop
//!
//! ```text
//! loop {
//!     activate?        pending focus change
//!     update(skipped)  skips since the previous present
//!     render(back)     draw into the back buffer
//!     pace:
//!         target = next tick duration
//!         elapsed <= target  -> wait for the deadline, present, next cycle
//!         elapsed >  target  -> skip this tick, try the next one
//! }
//! ```
//!
//! The stop signal is checked before every pacing step, after every sleep and
//! right before presenting, and it interrupts the sleep itself.

use std::any::Any;
use std::io;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, MonotonicClock, StopSignal};
use crate::config::SchedulerConfig;
use crate::pacer::Pacer;
use crate::surface::{FrameHandler, PresentSurface, SurfaceError};

const WORKER_NAME: &str = "vsync-tiles-frame";

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error("frame thread panicked: {0}")]
    WorkerPanicked(String),
    #[error("scheduler is unusable after a frame thread failure")]
    Poisoned,
    #[error("failed to spawn frame thread: {0}")]
    Spawn(#[source] io::Error),
}

/// Frame counters of the current (or last) session.
#[derive(Debug, Default)]
pub struct FrameStats {
    cycles: AtomicU64,
    presented: AtomicU64,
    skipped: AtomicU64,
    resyncs: AtomicU64,
    lost: AtomicU64,
    present_errors: AtomicU64,
}

/// Point-in-time copy of [`FrameStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStatsSnapshot {
    /// Update/render passes run.
    pub cycles: u64,
    pub presented: u64,
    /// Ticks consumed without presenting.
    pub skipped: u64,
    pub resyncs: u64,
    /// Presents dropped because the back buffer was invalidated.
    pub lost: u64,
    pub present_errors: u64,
}

impl FrameStats {
    pub fn snapshot(&self) -> FrameStatsSnapshot {
        FrameStatsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            presented: self.presented.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            resyncs: self.resyncs.load(Ordering::Relaxed),
            lost: self.lost.load(Ordering::Relaxed),
            present_errors: self.present_errors.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        for counter in [
            &self.cycles,
            &self.presented,
            &self.skipped,
            &self.resyncs,
            &self.lost,
            &self.present_errors,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Pending focus change, delivered to the handler at the start of a cycle.
#[derive(Debug, Default)]
struct ActivityFlag(AtomicU8);

impl ActivityFlag {
    const NONE: u8 = 0;
    const ACTIVE: u8 = 1;
    const INACTIVE: u8 = 2;

    fn set(&self, active: bool) {
        let v = if active { Self::ACTIVE } else { Self::INACTIVE };
        self.0.store(v, Ordering::Release);
    }

    fn take(&self) -> Option<bool> {
        match self.0.swap(Self::NONE, Ordering::AcqRel) {
            Self::ACTIVE => Some(true),
            Self::INACTIVE => Some(false),
            _ => None,
        }
    }
}

/// State shared between the owner and the frame thread.
#[derive(Debug, Default)]
pub struct SessionControl {
    stop: StopSignal,
    stats: FrameStats,
    activity: ActivityFlag,
}

impl SessionControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Queue a focus change for the handler's `activate` hook.
    pub fn set_active(&self, active: bool) {
        self.activity.set(active);
    }
}

/// Everything a session runs against.
#[derive(Debug)]
pub struct SessionParts<S, H, K> {
    pub surface: S,
    pub handler: H,
    pub clock: K,
}

/// Run one session until the stop signal is raised.
///
/// The surface must already be allocated. This is the body of the frame
/// thread; it is public so the loop can be driven with a fake clock and
/// surface.
pub fn run_session<S, H, K>(
    parts: &mut SessionParts<S, H, K>,
    config: SchedulerConfig,
    control: &SessionControl,
) where
    S: PresentSurface,
    H: FrameHandler<S::Canvas>,
    K: Clock,
{
    let SessionParts {
        surface,
        handler,
        clock,
    } = parts;
    let mut pacer = Pacer::new(config);
    pacer.reset(clock.now());
    info!(
        ticks_per_unit = config.ticks_per_unit(),
        unit_ms = config.unit_ms(),
        "frame session started"
    );

    while !control.stop.is_raised() {
        if let Some(active) = control.activity.take() {
            handler.activate(active);
        }

        handler.update(pacer.take_skipped());
        handler.render(surface.back_buffer());
        FrameStats::bump(&control.stats.cycles);

        if !pace_and_present(&mut pacer, surface, clock, control) {
            break;
        }
    }

    let stats = control.stats.snapshot();
    info!(
        cycles = stats.cycles,
        presented = stats.presented,
        skipped = stats.skipped,
        resyncs = stats.resyncs,
        "frame session stopped"
    );
}

/// Wait for the next tick deadline and present, skipping overrun ticks.
///
/// Returns `false` when the stop signal interrupted pacing.
fn pace_and_present<S, K>(
    pacer: &mut Pacer,
    surface: &mut S,
    clock: &K,
    control: &SessionControl,
) -> bool
where
    S: PresentSurface + ?Sized,
    K: Clock + ?Sized,
{
    let stop = &control.stop;
    let stats = &control.stats;

    loop {
        if stop.is_raised() {
            return false;
        }

        let target = pacer.next_tick_duration();
        let skipped_before = pacer.state().skipped;
        let mut elapsed = pacer.measure(clock.now(), target);
        if elapsed.resynced {
            FrameStats::bump(&stats.resyncs);
            debug!(
                skipped = skipped_before,
                tick_nanos = target,
                "frame pacing resynchronized"
            );
        }

        if elapsed.nanos > target {
            pacer.skip(target);
            FrameStats::bump(&stats.skipped);
            continue;
        }

        while elapsed.nanos < target {
            clock.sleep(target - elapsed.nanos, stop);
            if stop.is_raised() {
                return false;
            }
            elapsed = pacer.measure_after_wait(clock.now(), target);
            if elapsed.resynced {
                FrameStats::bump(&stats.resyncs);
                debug!(tick_nanos = target, "clock went backwards during frame wait");
            }
        }
        pacer.commit(target);
        if stop.is_raised() {
            return false;
        }

        present(surface, stats);
        return true;
    }
}

fn present<S: PresentSurface + ?Sized>(surface: &mut S, stats: &FrameStats) {
    if surface.contents_lost() {
        FrameStats::bump(&stats.lost);
        warn!("back buffer contents lost, present skipped");
        return;
    }
    match surface.sync().and_then(|()| surface.present()) {
        Ok(()) => FrameStats::bump(&stats.presented),
        Err(err) => {
            FrameStats::bump(&stats.present_errors);
            warn!(error = %err, "present failed");
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Runs a [`FrameHandler`] against a [`PresentSurface`] on a dedicated thread.
pub struct FrameScheduler<S, H, K = MonotonicClock>
where
    S: PresentSurface + 'static,
    H: FrameHandler<S::Canvas> + 'static,
    K: Clock + 'static,
{
    config: SchedulerConfig,
    control: Arc<SessionControl>,
    /// Present while stopped; moved onto the frame thread while running.
    parts: Option<SessionParts<S, H, K>>,
    worker: Option<JoinHandle<SessionParts<S, H, K>>>,
    initialized: bool,
    poisoned: bool,
}

impl<S, H> FrameScheduler<S, H, MonotonicClock>
where
    S: PresentSurface + 'static,
    H: FrameHandler<S::Canvas> + 'static,
{
    pub fn new(config: SchedulerConfig, surface: S, handler: H) -> Self {
        Self::with_clock(config, surface, handler, MonotonicClock::new())
    }
}

impl<S, H, K> FrameScheduler<S, H, K>
where
    S: PresentSurface + 'static,
    H: FrameHandler<S::Canvas> + 'static,
    K: Clock + 'static,
{
    pub fn with_clock(config: SchedulerConfig, surface: S, handler: H, clock: K) -> Self {
        Self {
            config,
            control: Arc::new(SessionControl::new()),
            parts: Some(SessionParts {
                surface,
                handler,
                clock,
            }),
            worker: None,
            initialized: false,
            poisoned: false,
        }
    }

    pub fn config(&self) -> SchedulerConfig {
        self.config
    }

    /// Start a session. A no-op while a session is running and has not been
    /// asked to stop.
    ///
    /// Allocates the surface and, before the very first session, runs the
    /// handler's `init` hook. Run state and stats are reset on every start.
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        if self.poisoned {
            return Err(SchedulerError::Poisoned);
        }
        // A session that is winding down after a raised stop signal does not
        // count as running: it is joined and replaced.
        if self.is_running() && !self.control.stop.is_raised() {
            return Ok(());
        }
        self.stop()?;

        let mut parts = self.parts.take().ok_or(SchedulerError::Poisoned)?;
        if let Err(err) = parts.surface.allocate() {
            self.parts = Some(parts);
            return Err(err.into());
        }
        if !self.initialized {
            parts.handler.init();
            self.initialized = true;
        }

        self.control.stop.reset();
        self.control.stats.reset();

        let control = Arc::clone(&self.control);
        let config = self.config;
        let spawned = thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || {
                run_session(&mut parts, config, &control);
                parts
            });

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                Ok(())
            }
            Err(err) => {
                // The parts went down with the closure.
                self.poisoned = true;
                error!(error = %err, "failed to spawn frame thread");
                Err(SchedulerError::Spawn(err))
            }
        }
    }

    /// Stop the running session and wait for the frame thread to exit, then
    /// release the surface. A no-op while stopped.
    ///
    /// # Panics
    ///
    /// Panics when called from the frame thread itself. Callbacks that want
    /// to end the session raise the [`StopSignal`] instead.
    pub fn stop(&mut self) -> Result<(), SchedulerError> {
        let Some(worker) = &self.worker else {
            return Ok(());
        };
        assert!(
            worker.thread().id() != thread::current().id(),
            "FrameScheduler::stop called from the frame thread"
        );

        self.control.stop.raise();
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        match worker.join() {
            Ok(mut parts) => {
                parts.surface.release();
                self.parts = Some(parts);
                Ok(())
            }
            Err(payload) => {
                self.poisoned = true;
                let msg = panic_message(payload);
                error!(panic = %msg, "frame thread panicked");
                Err(SchedulerError::WorkerPanicked(msg))
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Signal callbacks can clone to end the session from inside the loop.
    pub fn stop_signal(&self) -> StopSignal {
        self.control.stop.clone()
    }

    pub fn stats(&self) -> FrameStatsSnapshot {
        self.control.stats.snapshot()
    }

    /// Report a focus change; the handler sees it at the start of the next
    /// cycle (or of the next session when stopped).
    pub fn set_active(&self, active: bool) {
        self.control.set_active(active);
    }

    /// The handler, while stopped.
    pub fn handler(&self) -> Option<&H> {
        self.parts.as_ref().map(|p| &p.handler)
    }

    /// Mutable handler access, while stopped.
    pub fn handler_mut(&mut self) -> Option<&mut H> {
        self.parts.as_mut().map(|p| &mut p.handler)
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.parts.as_mut().map(|p| &mut p.surface)
    }

    /// Stop, run the handler's `destroy` hook and hand back the parts.
    pub fn shutdown(mut self) -> Result<SessionParts<S, H, K>, SchedulerError> {
        self.stop()?;
        let mut parts = self.parts.take().ok_or(SchedulerError::Poisoned)?;
        if std::mem::take(&mut self.initialized) {
            parts.handler.destroy();
        }
        Ok(parts)
    }
}

impl<S, H, K> Drop for FrameScheduler<S, H, K>
where
    S: PresentSurface + 'static,
    H: FrameHandler<S::Canvas> + 'static,
    K: Clock + 'static,
{
    fn drop(&mut self) {
        let on_worker = self
            .worker
            .as_ref()
            .is_some_and(|w| w.thread().id() == thread::current().id());
        if on_worker {
            self.control.stop.raise();
            return;
        }
        if let Err(err) = self.stop() {
            warn!(error = %err, "frame scheduler dropped with a failed session");
        }
        if self.initialized {
            if let Some(parts) = self.parts.as_mut() {
                parts.handler.destroy();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicI64;

    /// Clock that only moves when slept on or nudged by the handler.
    struct StepClock {
        now: Arc<AtomicI64>,
    }

    impl Clock for StepClock {
        fn now(&self) -> i64 {
            self.now.load(Ordering::SeqCst)
        }

        fn sleep(&self, nanos: i64, _stop: &StopSignal) {
            self.now.fetch_add(nanos, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct CountingSurface {
        presents: u32,
        lose_on: Vec<u32>,
        attempts: u32,
    }

    impl PresentSurface for CountingSurface {
        type Canvas = u32;

        fn allocate(&mut self) -> Result<(), SurfaceError> {
            Ok(())
        }

        fn back_buffer(&mut self) -> &mut u32 {
            &mut self.presents
        }

        fn contents_lost(&mut self) -> bool {
            self.attempts += 1;
            self.lose_on.contains(&self.attempts)
        }

        fn present(&mut self) -> Result<(), SurfaceError> {
            self.presents += 1;
            Ok(())
        }

        fn release(&mut self) {}
    }

    /// Records `skipped`, applies per-cycle clock nudges, stops after `cycles`.
    struct Script {
        now: Arc<AtomicI64>,
        stop: StopSignal,
        cycles: usize,
        nudges: Vec<(usize, i64)>,
        seen: Vec<u32>,
    }

    impl FrameHandler<u32> for Script {
        fn update(&mut self, skipped: u32) {
            let cycle = self.seen.len();
            self.seen.push(skipped);
            if cycle == self.cycles {
                self.stop.raise();
            }
            for &(at, delta) in &self.nudges {
                if at == cycle {
                    self.now.fetch_add(delta, Ordering::SeqCst);
                }
            }
        }

        fn render(&mut self, _canvas: &mut u32) {}
    }

    fn run(
        config: SchedulerConfig,
        cycles: usize,
        nudges: Vec<(usize, i64)>,
        lose_on: Vec<u32>,
    ) -> (Vec<u32>, FrameStatsSnapshot, i64) {
        let now = Arc::new(AtomicI64::new(0));
        let control = SessionControl::new();
        let mut parts = SessionParts {
            surface: CountingSurface {
                lose_on,
                ..Default::default()
            },
            handler: Script {
                now: Arc::clone(&now),
                stop: control.stop_signal().clone(),
                cycles,
                nudges,
                seen: Vec::new(),
            },
            clock: StepClock {
                now: Arc::clone(&now),
            },
        };
        run_session(&mut parts, config, &control);
        (
            parts.handler.seen,
            control.stats().snapshot(),
            now.load(Ordering::SeqCst),
        )
    }

    const MS: i64 = 1_000_000;

    #[test]
    fn sixty_idle_cycles_take_exactly_one_second() {
        let (_, stats, now) = run(SchedulerConfig::default(), 60, vec![], vec![]);
        assert_eq!(stats.presented, 60);
        assert_eq!(stats.skipped, 0);
        assert_eq!(now, 1_000 * MS);
    }

    #[test]
    fn overrun_reports_skipped_ticks_to_next_update() {
        let cfg = SchedulerConfig::new(10, 1000).unwrap();
        // Cycle 1 costs 3.5 ticks of 100ms.
        let (seen, stats, _) = run(cfg, 4, vec![(1, 350 * MS)], vec![]);
        assert_eq!(seen, vec![0, 0, 3, 0, 0]);
        assert_eq!(stats.skipped, 3);
        assert_eq!(stats.resyncs, 0);
    }

    #[test]
    fn long_stall_resyncs_after_eight_skips() {
        let cfg = SchedulerConfig::new(10, 1000).unwrap();
        let (seen, stats, _) = run(cfg, 3, vec![(1, 2_000 * MS)], vec![]);
        assert_eq!(seen, vec![0, 0, 8, 0]);
        assert_eq!(stats.resyncs, 1);
    }

    #[test]
    fn backwards_clock_is_absorbed() {
        let cfg = SchedulerConfig::new(10, 1000).unwrap();
        let (seen, stats, _) = run(cfg, 3, vec![(1, -50 * MS)], vec![]);
        assert_eq!(seen, vec![0, 0, 0, 0]);
        assert_eq!(stats.resyncs, 1);
        assert_eq!(stats.presented, 3);
    }

    #[test]
    fn lost_contents_skip_one_present() {
        let (_, stats, _) = run(SchedulerConfig::default(), 5, vec![], vec![2]);
        assert_eq!(stats.cycles, 6);
        assert_eq!(stats.lost, 1);
        assert_eq!(stats.presented, 4);
    }

    #[test]
    fn activity_flag_delivers_latest_change_once() {
        let flag = ActivityFlag::default();
        assert_eq!(flag.take(), None);
        flag.set(true);
        flag.set(false);
        assert_eq!(flag.take(), Some(false));
        assert_eq!(flag.take(), None);
    }
}
