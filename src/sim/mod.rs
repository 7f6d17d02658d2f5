//! Deterministic simulation module
//!
//! All field, kinematics and gameplay logic lives here:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (spawn order, ids for lookup)
//! - Boundary rules passed explicitly through `SimContext`

pub mod body;
pub mod brane;
pub mod collision;
pub mod context;
pub mod entity;
pub mod geometry;
pub mod tick;
pub mod tractor;
pub mod wavelet;
pub mod world;

pub use body::Body;
pub use brane::{Brane, GridSpec};
pub use collision::{CirclePart, Collider, check_collision, segment_hits_circle, swept_circles_collide};
pub use context::{Pbc, SimContext};
pub use entity::{Entity, EntityId, EntityKind, KindTag, PlayerState, SpawnRequest};
pub use geometry::{PERIODIC_SHIFTS, heading_vector, min_image_displacement, rot_mat, wrap_position};
pub use tick::{TickInput, run_frame, tick};
pub use tractor::{BeamParams, BeamShape};
pub use wavelet::{FieldSource, PulseParams, PulseShape, WaveShape, Wavelet, WaveletId};
pub use world::{World, WorldPhase};
