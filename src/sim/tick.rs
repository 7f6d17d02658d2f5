//! Fixed timestep simulation tick
//!
//! Advances the world by one step in a fixed order. Each field is aged
//! exactly once per step, and every body reads the field as it stood
//! before any body moved.

use super::world::{World, WorldPhase};
use crate::consts::MAX_SUBSTEPS;
use crate::error::Result;

/// Input commands for a single tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// -1 turns left, +1 turns right, 0 holds heading
    pub rotate: f32,
    /// Forward thrust held
    pub forward: bool,
    /// Reverse thrust held
    pub backward: bool,
    /// Beam emitter held
    pub wavegen: bool,
    /// Tractor instead of repulsor while the beam is held
    pub tractor: bool,
    /// Pause toggle
    pub pause: bool,
}

/// Copy held inputs onto the player ship
fn apply_input(world: &mut World, input: &TickInput) {
    if let Some(state) = world.player_mut().and_then(|p| p.player_state_mut()) {
        state.rotation = input.rotate.clamp(-1.0, 1.0);
        state.forward = input.forward;
        state.backward = input.backward;
        state.wavegen = input.wavegen;
        state.tractor = input.tractor;
    }
}

/// Advance the world by one fixed timestep
pub fn tick(world: &mut World, input: &TickInput, dt: f32) -> Result<()> {
    if input.pause {
        world.toggle_pause();
    }

    // Don't tick if paused or game over
    match world.phase() {
        WorldPhase::Paused | WorldPhase::GameOver => return Ok(()),
        WorldPhase::Running => {}
    }

    apply_input(world, input);

    world.step_field(dt);
    world.integrate_bodies(dt);
    world.step_collisions(dt);
    world.collect_pickups();
    world.flush_spawns()?;
    if world.ctx().is_periodic() {
        world.replenish_hazards()?;
    }
    world.follow_player();

    world.time += dt;
    world.steps += 1;
    Ok(())
}

/// Run one frame as `substeps` equal ticks (capped at `MAX_SUBSTEPS`)
///
/// The pause toggle is applied on the first substep only.
pub fn run_frame(world: &mut World, input: &TickInput, frame_dt: f32, substeps: u32) -> Result<()> {
    let n = substeps.clamp(1, MAX_SUBSTEPS);
    let dt = frame_dt / n as f32;
    let held = TickInput {
        pause: false,
        ..input.clone()
    };
    for i in 0..n {
        tick(world, if i == 0 { input } else { &held }, dt)?;
    }
    Ok(())
}
