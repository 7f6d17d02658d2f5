//! Brane Space headless runner
//!
//! Loads settings (JSON path as the first argument, defaults otherwise),
//! runs a fixed number of frames with the player holding the repulsor and
//! logs what happened.

use brane_space::consts::FRAME_DT;
use brane_space::sim::{TickInput, World, run_frame};
use brane_space::{Result, Settings};

/// Frames to simulate (10 seconds at 60 Hz)
const FRAMES: u32 = 600;
const SUBSTEPS: u32 = 2;

fn run() -> Result<()> {
    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    log::info!(
        "Grid quality {}, seed {}",
        settings.grid_quality.as_str(),
        settings.seed
    );

    let mut world = World::new(settings)?;
    let input = TickInput {
        wavegen: true,
        rotate: 0.25,
        ..Default::default()
    };

    for frame in 0..FRAMES {
        run_frame(&mut world, &input, FRAME_DT, SUBSTEPS)?;
        if frame % 60 == 0 {
            log::info!(
                "t={:.0}ms score={} entities={} hazards={} wavelets={}",
                world.time,
                world.score(),
                world.entities().count(),
                world.hazard_count(),
                world.brane().wavelet_count()
            );
        }
        if world.is_game_over() {
            log::info!("Game over after {} frames", frame + 1);
            break;
        }
    }

    log::info!("Final score {} after {} steps", world.score(), world.steps);
    Ok(())
}

fn main() {
    env_logger::init();
    log::info!("Brane Space (headless) starting...");

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
