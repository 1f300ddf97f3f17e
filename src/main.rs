//! Wrap-around tile scroller (default binary).
//!
//! Scrolls a procedurally generated tile sheet on a 16x12 grid through the
//! terminal surface at the configured frame rate. Arrows scroll, Z and X
//! toggle the horizontal and vertical view mirror, Esc or Ctrl+C quits.
//!
//! Set `VSYNC_TILES_LOG=<path>` to write logs to a file (the terminal is in raw
//! mode); `RUST_LOG` picks the level.

use std::fs::File;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use tracing::{info, Level};
use tracing_subscriber::util::SubscriberInitExt;

use vsync_tiles::core::{Bitmap, PixelCanvas, TileSheet, Tilemap};
use vsync_tiles::engine::{FrameHandler, FrameScheduler, SchedulerConfig};
use vsync_tiles::input::{should_quit, Pad, PadTracker};
use vsync_tiles::term::{TerminalGuard, TerminalSurface};
use vsync_tiles::types::{Mirror, PadButtons, Rgb};

const GRID_COLS: usize = 16;
const GRID_ROWS: usize = 12;
const TILE: i32 = 8;
const TILE_KINDS: usize = 4;

/// Logical resolution of the back buffer.
const VIEW_W: u32 = 96;
const VIEW_H: u32 = 64;

/// Scroll speed in pixels per tick.
const SCROLL_STEP: i32 = 1;

const INPUT_POLL_MS: u64 = 10;

fn main() -> Result<()> {
    init_logging()?;
    let config = SchedulerConfig::from_env();
    info!(
        ticks_per_unit = config.ticks_per_unit(),
        unit_ms = config.unit_ms(),
        "starting"
    );

    let guard = TerminalGuard::enter()?;
    let result = run(config);

    // Always try to restore terminal state.
    let restored = guard.exit();
    result.and(restored)
}

fn init_logging() -> Result<()> {
    let Ok(path) = std::env::var("VSYNC_TILES_LOG") else {
        return Ok(());
    };
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| Level::from_str(s.trim()).ok())
        .unwrap_or(Level::INFO);
    let file = File::create(&path).with_context(|| format!("creating log file {path}"))?;

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_thread_names(true)
        .compact()
        .finish()
        .init();
    Ok(())
}

fn run(config: SchedulerConfig) -> Result<()> {
    let pad = Pad::new();
    let mut tracker = PadTracker::new(pad.clone());

    let surface = TerminalSurface::stdout(VIEW_W, VIEW_H);
    let invalidated = surface.invalidation_handle();
    let scene = Scroller::new(pad)?;

    let mut scheduler = FrameScheduler::new(config, surface, scene);
    scheduler.start()?;

    let result = pump_input(&mut scheduler, &mut tracker, &invalidated);

    let parts = scheduler.shutdown()?;
    info!(origin = ?parts.handler.map.origin(), "scene stopped");
    result
}

/// Host thread: feed terminal events to the pad until quit.
fn pump_input(
    scheduler: &mut FrameScheduler<TerminalSurface<std::io::Stdout>, Scroller>,
    tracker: &mut PadTracker,
    invalidated: &AtomicBool,
) -> Result<()> {
    let poll = Duration::from_millis(INPUT_POLL_MS);
    while scheduler.is_running() {
        if event::poll(poll)? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Press && should_quit(key) {
                        break;
                    }
                    tracker.handle_key(key, Instant::now());
                }
                Event::Resize(..) => invalidated.store(true, Ordering::Release),
                Event::FocusGained => scheduler.set_active(true),
                Event::FocusLost => {
                    tracker.release_all();
                    scheduler.set_active(false);
                }
                _ => {}
            }
        }
        tracker.expire(Instant::now());
    }

    let stats = scheduler.stats();
    info!(
        presented = stats.presented,
        skipped = stats.skipped,
        resyncs = stats.resyncs,
        lost = stats.lost,
        "session stats"
    );
    Ok(())
}

/// The demo scene, owned by the frame thread while running.
struct Scroller {
    map: Tilemap<TileSheet>,
    pad: Pad,
    held: PadButtons,
    view_mirror: Mirror,
    paused: bool,
}

impl Scroller {
    fn new(pad: Pad) -> Result<Self> {
        let sheet = TileSheet::new(Arc::new(tile_sheet()), TILE, TILE, TILE_KINDS);
        let mut map = Tilemap::new(sheet, GRID_COLS, GRID_ROWS)?;
        for row in 0..GRID_ROWS {
            for col in 0..GRID_COLS {
                let code = ((col / 2 + row) % TILE_KINDS) as u16;
                let mirror = match (col + row * 3) % 4 {
                    1 => Mirror::HORIZONTAL,
                    2 => Mirror::VERTICAL,
                    _ => Mirror::empty(),
                };
                map.set_tile(col, row, code, mirror);
            }
        }
        // A hole every few cells to show the background through.
        for i in (0..GRID_COLS).step_by(5) {
            map.clear_tile(i, (i * 7) % GRID_ROWS);
        }
        map.set_bounds(0, 0, VIEW_W as i32, VIEW_H as i32);

        Ok(Self {
            map,
            pad,
            held: PadButtons::empty(),
            view_mirror: Mirror::empty(),
            paused: false,
        })
    }
}

impl FrameHandler<PixelCanvas> for Scroller {
    fn update(&mut self, skipped: u32) {
        let buttons = self.pad.buttons();
        let pressed = buttons & !self.held;
        self.held = buttons;

        if pressed.contains(PadButtons::BUTTON1) {
            self.view_mirror ^= Mirror::HORIZONTAL;
        }
        if pressed.contains(PadButtons::BUTTON2) {
            self.view_mirror ^= Mirror::VERTICAL;
        }
        if self.paused {
            return;
        }

        // Skipped ticks still move the scene so scrolling keeps wall-clock speed.
        let step = SCROLL_STEP * (1 + skipped as i32);
        let mut dx = 0;
        let mut dy = 0;
        if buttons.contains(PadButtons::LEFT) {
            dx -= step;
        }
        if buttons.contains(PadButtons::RIGHT) {
            dx += step;
        }
        if buttons.contains(PadButtons::UP) {
            dy -= step;
        }
        if buttons.contains(PadButtons::DOWN) {
            dy += step;
        }
        self.map.scroll_by(dx, dy);
    }

    fn render(&mut self, canvas: &mut PixelCanvas) {
        canvas.clear(Rgb::new(12, 12, 28));
        self.map.paint_bounds(canvas, self.view_mirror);
    }

    fn init(&mut self) {
        info!(
            columns = self.map.columns(),
            rows = self.map.rows(),
            "scene initialized"
        );
    }

    fn activate(&mut self, active: bool) {
        self.paused = !active;
        info!(active, "focus changed");
    }
}

/// `TILE_KINDS` tiles of `TILE`x`TILE` side by side.
fn tile_sheet() -> Bitmap {
    let mut bmp = Bitmap::new(TILE as u32 * TILE_KINDS as u32, TILE as u32);
    let palette = [
        Rgb::new(40, 120, 60),
        Rgb::new(200, 170, 60),
        Rgb::new(70, 90, 200),
        Rgb::new(190, 60, 60),
    ];
    for kind in 0..TILE_KINDS as i32 {
        let base = palette[kind as usize];
        let dark = Rgb::new(base.r / 3, base.g / 3, base.b / 3);
        for y in 0..TILE {
            for x in 0..TILE {
                let on = match kind {
                    // Checker
                    0 => (x / 2 + y / 2) % 2 == 0,
                    // Diagonal stripe
                    1 => (x + y) % 4 < 2,
                    // Frame
                    2 => x == 0 || y == 0 || x == TILE - 1 || y == TILE - 1,
                    // Arrow pointing right, top-heavy so both flips show
                    _ => x <= y.min(TILE - 1 - y) * 2 || (y < 2 && x < TILE / 2),
                };
                bmp.set(kind * TILE + x, y, if on { base } else { dark });
            }
        }
    }
    bmp
}
