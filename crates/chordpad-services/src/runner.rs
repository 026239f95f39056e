//! Fixed-rate event loop driving the engine

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use chordpad_core::{Engine, InputSource, Outputs};
use tracing::info;

/// Drive `engine` until `shutdown` is raised, sleeping `tick` between
/// iterations. All voices are silenced before returning.
pub fn run(
    engine: &mut Engine,
    input: &mut dyn InputSource,
    out: &mut Outputs<'_>,
    tick: Duration,
    shutdown: &AtomicBool,
) {
    engine.paint(out);
    info!(tick_ms = tick.as_millis() as u64, bpm = engine.tuning().bpm(), "event loop started");

    let mut iterations: u64 = 0;
    while !shutdown.load(Ordering::SeqCst) {
        engine.step(input, Instant::now(), out);
        iterations += 1;
        thread::sleep(tick);
    }

    engine.stop_all(out);
    info!(iterations, "event loop stopped");
}
