//! Brane Space - wavelet field simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (field synthesis, kinematics, collisions, world)
//! - `settings`: Serializable configuration and validation into a `SimContext`
//! - `error`: Construction-time validation errors

pub mod error;
pub mod settings;
pub mod sim;

pub use error::{Result, SimError};
pub use settings::{GridQuality, Settings};

use glam::Vec2;

/// Simulation constants (time in ms, distance in world units)
pub mod consts {
    use std::f32::consts::PI;

    /// Maximum substeps per rendered frame
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Nominal frame time at 60 Hz
    pub const FRAME_DT: f32 = 1000.0 / 60.0;

    /// Side length of the toroidal world
    pub const WORLD_SIZE: f32 = 600.0;
    /// World units per field grid cell at medium quality
    pub const GRID_CELL: f32 = 4.0;

    /// Player ship
    pub const PLAYER_SIZE: f32 = 64.0;
    pub const PLAYER_MASS: f32 = 5.0e3;
    pub const PLAYER_DRAG: f32 = 0.02;
    pub const PLAYER_RADIUS: f32 = 0.5 * PLAYER_SIZE * 1.1;
    pub const PLAYER_ROT_SPEED: f32 = PI / 2000.0; // 180 deg per second
    pub const PLAYER_FWD_THRUST: f32 = 2.0;
    pub const PLAYER_BCK_THRUST: f32 = 0.5;
    /// Ship silhouette sub-circles (local offset, radius)
    pub const PLAYER_PARTS: [([f32; 2], f32); 4] = [
        ([0.0, -22.0], 10.0),
        ([0.0, 0.0], 15.0),
        ([-9.0, 18.0], 10.0),
        ([9.0, 18.0], 10.0),
    ];
    pub const COLLECTOR_OFFSET: f32 = 20.0;
    pub const COLLECT_RADIUS: f32 = 10.0;
    /// Beam wavelets start this far ahead of the ship
    pub const BEAM_EMIT_OFFSET: f32 = 20.0;

    /// Asteroids
    pub const ASTEROID_SIZE: f32 = 32.0;
    pub const ASTEROID_MASS: f32 = 1.0e4;
    pub const ASTEROID_DRAG: f32 = 0.002;
    pub const ASTEROID_RADIUS_FACTOR: f32 = 0.45;
    pub const ASTEROID_GROW_TIME: f32 = 2000.0;
    pub const ASTEROID_MAX_SPIN: f32 = 0.5 * PI / 1000.0; // +-90 deg per second
    pub const BASE_HAZARDS: u32 = 15;

    /// Explosions
    pub const EXPLOSION_MIN_SIZE: f32 = 32.0;
    pub const EXPLOSION_MAX_SIZE: f32 = 2.0 * EXPLOSION_MIN_SIZE;
    pub const EXPLOSION_RADIUS_FACTOR: f32 = 0.25;
    pub const EXPLOSION_LIFETIME: f32 = 1000.0;

    /// Dark matter loot
    pub const DARK_MATTER_SIZE: f32 = 16.0;
    pub const DARK_MATTER_MASS: f32 = 1.0e2;
    pub const DARK_MATTER_DRAG: f32 = 0.05;
    pub const DARK_MATTER_MIN_LIFETIME: f32 = 10_000.0;
    pub const DARK_MATTER_LIFETIME_SPREAD: f32 = 5_000.0;

    /// Portal structure
    pub const PORTAL_SIZE: f32 = 128.0;
    pub const PORTAL_MASS: f32 = 1.0e9;
    pub const PORTAL_DRAG: f32 = 20.0;
    pub const PORTAL_SPIN: f32 = -PI / 1000.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Component-wise |v|·v, the quadratic drag direction used by the integrator
#[inline]
pub fn abs_mul(v: Vec2) -> Vec2 {
    v.abs() * v
}
