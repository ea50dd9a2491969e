//! # LERPER Soak Test
//!
//! Runs a simulation thread and a render thread at different, jittery rates
//! for a few seconds and reports how smoothly playback followed.
//!
//! ```bash
//! # Default tuning
//! cargo run --release --bin lerper_soak
//!
//! # Custom tuning from TOML
//! cargo run --release --bin lerper_soak -- lerper.toml
//! ```

use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use lerper_core::{split, EntityId, LerpError, LerpResult, LerperConfig};

/// Simulation step (20Hz).
const SIM_STEP: Duration = Duration::from_millis(50);
/// Render step (roughly 60Hz).
const RENDER_STEP: Duration = Duration::from_micros(16_666);
/// How long the soak runs.
const RUN_TIME: Duration = Duration::from_secs(3);
/// Number of simulated entities.
const ENTITY_COUNT: EntityId = 64;

/// Toy entity state: a point moving along x at constant speed.
#[derive(Clone, Copy, Debug)]
struct Pose {
    x: f32,
}

fn load_config() -> LerpResult<LerperConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| LerpError::ConfigParse(format!("{path}: {e}")))?;
            LerperConfig::from_toml_str(&text)
        }
        None => Ok(LerperConfig::default()),
    }
}

/// Deterministic jitter in [0.5, 1.5) so the two rates drift.
fn jitter(step: u32) -> f32 {
    let hashed = step.wrapping_mul(2_654_435_761) >> 16;
    #[allow(clippy::cast_precision_loss)]
    let unit = (hashed & 0xFFFF) as f32 / 65_536.0;
    0.5 + unit
}

fn run(config: &LerperConfig) -> LerpResult<()> {
    let (mut producer, mut consumer) = split::<Pose>(config)?;
    let start = Instant::now();

    let simulation = thread::spawn(move || -> LerpResult<u64> {
        let mut x = 0.0_f32;
        let mut step = 0;
        while start.elapsed() < RUN_TIME {
            x += SIM_STEP.as_secs_f32();
            for id in 0..ENTITY_COUNT {
                producer.add_entity(id, Pose { x })?;
            }
            producer.end_frame(SIM_STEP.as_secs_f32())?;
            thread::sleep(SIM_STEP.mul_f32(jitter(step)));
            step += 1;
        }
        Ok(producer.frames_produced())
    });

    let mut last = Instant::now();
    let mut previous_x: Option<f32> = None;
    let mut largest_jump = 0.0_f32;
    let mut draws = 0_u32;
    while start.elapsed() < RUN_TIME {
        thread::sleep(RENDER_STEP.mul_f32(jitter(draws + 7)));
        let now = Instant::now();
        let delta = now.duration_since(last).as_secs_f32();
        last = now;

        let mut drawn_x = None;
        consumer.draw_with(delta, &mut |prev: &Pose, next: &Pose, t: f32| {
            drawn_x = Some(prev.x + (next.x - prev.x) * t);
        })?;
        if let (Some(before), Some(after)) = (previous_x, drawn_x) {
            largest_jump = largest_jump.max((after - before).abs());
        }
        previous_x = drawn_x.or(previous_x);
        draws += 1;
    }

    let produced = match simulation.join() {
        Ok(result) => result?,
        Err(panic) => std::panic::resume_unwind(panic),
    };
    let stats = consumer.stats();
    let pool = consumer.pool_stats();

    println!("═══════════════════════════════════════════════════════");
    println!("                 LERPER SOAK RESULTS");
    println!("═══════════════════════════════════════════════════════");
    println!("  Frames produced:     {produced}");
    println!("  Frames consumed:     {}", stats.frames_consumed);
    println!("  Draw calls:          {draws}");
    println!("  Queue length:        {}", stats.queue_len);
    println!("  Average depth:       {:.3}", stats.average_queue_depth);
    println!("  Last speed:          {:.3}", stats.last_speed);
    println!("  Largest step (x):    {largest_jump:.4}");
    println!("  Buffers reused:      {} / {}", pool.reused, pool.acquired);
    println!("  Buffers discarded:   {}", pool.discarded);
    Ok(())
}

fn main() -> ExitCode {
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ FATAL: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!(
        "Running {}s soak: half-life {}s, target depth {}, max speed {:?}",
        RUN_TIME.as_secs(),
        config.window_half_life,
        config.target_queue_depth,
        config.max_speed
    );

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("✗ FATAL: {e}");
            ExitCode::FAILURE
        }
    }
}
