//! Game entities: a body, an optional collision shape and per-kind behaviour
//!
//! Capabilities are composed rather than inherited: every entity is
//! updatable, it is collidable if it has a `Collider`, drawable while
//! `visible`, and collectable if it is loot.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

use super::body::Body;
use super::brane::Brane;
use super::collision::{CirclePart, Collider, check_collision};
use super::context::SimContext;
use super::geometry::heading_vector;
use super::tractor::BeamParams;
use super::wavelet::Wavelet;
use crate::consts::*;
use crate::error::Result;

/// Stable entity handle, allocated by the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Player ship state and held inputs
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub score: u64,
    /// -1 turns left, +1 turns right
    pub rotation: f32,
    pub forward: bool,
    pub backward: bool,
    /// Beam emitter held
    pub wavegen: bool,
    /// Emit tractor (attracting) pulses instead of repulsor pulses
    pub tractor: bool,
    beam_elapsed: f32,
    pub beam: BeamParams,
    /// Pickup point ahead of the ship
    pub collector: Vec2,
    /// Collector displacement over the last step, rotation included
    pub collector_dr: Vec2,
}

impl PlayerState {
    pub fn new(beam: BeamParams, pos: Vec2) -> Self {
        Self {
            score: 0,
            rotation: 0.0,
            forward: false,
            backward: false,
            wavegen: false,
            tractor: false,
            beam_elapsed: 0.0,
            beam,
            collector: pos + COLLECTOR_OFFSET * heading_vector(0.0),
            collector_dr: Vec2::ZERO,
        }
    }

    /// Time between beam pulses: half a wavelength of travel
    pub fn beam_period(&self) -> f32 {
        self.beam.wavelength * 0.5 / self.beam.speed
    }
}

/// Hazard rock
#[derive(Debug, Clone, PartialEq)]
pub struct AsteroidState {
    /// Elapsed growth time while still growing in
    pub growing: Option<f32>,
}

/// Expanding blast left behind by a destroyed asteroid
#[derive(Debug, Clone, PartialEq)]
pub struct ExplosionState {
    pub age: f32,
}

/// Collectable loot that decays after a while
#[derive(Debug, Clone, PartialEq)]
pub struct DarkMatterState {
    pub age: f32,
    pub max_lifetime: f32,
}

/// What an entity is and how it behaves
#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    Player(PlayerState),
    Asteroid(AsteroidState),
    Explosion(ExplosionState),
    DarkMatter(DarkMatterState),
    Portal,
}

/// Fieldless mirror of `EntityKind` for matching on the other party
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KindTag {
    Player,
    Asteroid,
    Explosion,
    DarkMatter,
    Portal,
}

impl EntityKind {
    pub fn tag(&self) -> KindTag {
        match self {
            EntityKind::Player(_) => KindTag::Player,
            EntityKind::Asteroid(_) => KindTag::Asteroid,
            EntityKind::Explosion(_) => KindTag::Explosion,
            EntityKind::DarkMatter(_) => KindTag::DarkMatter,
            EntityKind::Portal => KindTag::Portal,
        }
    }
}

/// Snapshot of the other party in a collision
#[derive(Debug, Clone, Copy)]
pub struct Peer {
    pub id: EntityId,
    pub tag: KindTag,
    pub pos: Vec2,
    pub vel: Vec2,
    pub mass: f32,
}

/// Things a collision wants to happen once the sweep is over
#[derive(Debug, Clone, PartialEq)]
pub enum SpawnRequest {
    Loot { pos: Vec2, vel: Vec2 },
    Explosion { pos: Vec2, vel: Vec2 },
    Shockwave { pos: Vec2 },
}

/// Deferred outcome of collision responses
#[derive(Debug, Default)]
pub struct Reactions {
    pub destroy: Vec<EntityId>,
    pub spawn: Vec<SpawnRequest>,
    pub game_over: bool,
}

/// Side effects of a single entity update
#[derive(Debug, Default)]
pub struct UpdateEvents {
    pub wavelet: Option<Wavelet>,
    pub expired: bool,
}

/// A simulated object
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub body: Body,
    pub collider: Option<Collider>,
    /// False once scheduled for destruction
    pub alive: bool,
    pub visible: bool,
    /// Sprite size in world units
    pub size: f32,
}

impl Entity {
    fn new(id: EntityId, kind: EntityKind, body: Body, collider: Option<Collider>, size: f32) -> Self {
        Self {
            id,
            kind,
            body,
            collider,
            alive: true,
            visible: true,
            size,
        }
    }

    /// The player's ship at `pos`, facing north
    pub fn player(id: EntityId, pos: Vec2, beam: BeamParams) -> Result<Self> {
        let body = Body::new(PLAYER_MASS, PLAYER_DRAG)?.with_position(pos);
        let parts = PLAYER_PARTS
            .iter()
            .map(|&(offset, radius)| CirclePart {
                offset: Vec2::from(offset),
                radius,
            })
            .collect();
        Ok(Self::new(
            id,
            EntityKind::Player(PlayerState::new(beam, pos)),
            body,
            Some(Collider::compound(PLAYER_RADIUS, parts)),
            PLAYER_SIZE,
        ))
    }

    /// A full-size asteroid with random spin
    pub fn asteroid(id: EntityId, pos: Vec2, vel: Vec2, rng: &mut Pcg32) -> Result<Self> {
        let body = Body::new(ASTEROID_MASS, ASTEROID_DRAG)?
            .with_position(pos)
            .with_velocity(vel)
            .with_heading(rng.random_range(-PI..PI), rng.random_range(-ASTEROID_MAX_SPIN..ASTEROID_MAX_SPIN));
        Ok(Self::new(
            id,
            EntityKind::Asteroid(AsteroidState { growing: None }),
            body,
            Some(Collider::circle(ASTEROID_RADIUS_FACTOR * ASTEROID_SIZE)),
            ASTEROID_SIZE,
        ))
    }

    /// An asteroid that starts at size zero and grows in
    pub fn growing_asteroid(id: EntityId, pos: Vec2, vel: Vec2, rng: &mut Pcg32) -> Result<Self> {
        let mut roid = Self::asteroid(id, pos, vel, rng)?;
        roid.kind = EntityKind::Asteroid(AsteroidState { growing: Some(0.0) });
        roid.size = 0.0;
        if let Some(c) = roid.collider.as_mut() {
            c.radius = 0.0;
        }
        Ok(roid)
    }

    pub fn explosion(id: EntityId, pos: Vec2, vel: Vec2, rng: &mut Pcg32) -> Result<Self> {
        let body = Body::new(ASTEROID_MASS, ASTEROID_DRAG)?
            .with_position(pos)
            .with_velocity(vel)
            .with_heading(rng.random_range(-PI..PI), rng.random_range(-ASTEROID_MAX_SPIN..ASTEROID_MAX_SPIN));
        Ok(Self::new(
            id,
            EntityKind::Explosion(ExplosionState { age: 0.0 }),
            body,
            Some(Collider::circle(EXPLOSION_RADIUS_FACTOR * EXPLOSION_MIN_SIZE)),
            EXPLOSION_MIN_SIZE,
        ))
    }

    pub fn dark_matter(id: EntityId, pos: Vec2, vel: Vec2, rng: &mut Pcg32) -> Result<Self> {
        let body = Body::new(DARK_MATTER_MASS, DARK_MATTER_DRAG)?
            .with_position(pos)
            .with_velocity(vel);
        let max_lifetime = DARK_MATTER_MIN_LIFETIME + rng.random::<f32>() * DARK_MATTER_LIFETIME_SPREAD;
        Ok(Self::new(
            id,
            EntityKind::DarkMatter(DarkMatterState {
                age: 0.0,
                max_lifetime,
            }),
            body,
            None,
            DARK_MATTER_SIZE,
        ))
    }

    pub fn portal(id: EntityId, pos: Vec2) -> Result<Self> {
        let body = Body::new(PORTAL_MASS, PORTAL_DRAG)?
            .with_position(pos)
            .with_heading(0.0, PORTAL_SPIN);
        Ok(Self::new(
            id,
            EntityKind::Portal,
            body,
            Some(Collider::circle(0.5 * PORTAL_SIZE)),
            PORTAL_SIZE,
        ))
    }

    #[inline]
    pub fn tag(&self) -> KindTag {
        self.kind.tag()
    }

    #[inline]
    pub fn is_collidable(&self) -> bool {
        self.collider.is_some()
    }

    #[inline]
    pub fn is_collectable(&self) -> bool {
        matches!(self.kind, EntityKind::DarkMatter(_))
    }

    pub fn player_state(&self) -> Option<&PlayerState> {
        match &self.kind {
            EntityKind::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn player_state_mut(&mut self) -> Option<&mut PlayerState> {
        match &mut self.kind {
            EntityKind::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn peer(&self) -> Peer {
        Peer {
            id: self.id,
            tag: self.tag(),
            pos: self.body.pos,
            vel: self.body.vel,
            mass: self.body.mass(),
        }
    }

    /// Swept test against another entity over the last step
    pub fn check_collision(&self, other: &Entity, dt: f32, ctx: &SimContext) -> bool {
        match (&self.collider, &other.collider) {
            (Some(a), Some(b)) => check_collision(&self.body, a, &other.body, b, dt, ctx),
            _ => false,
        }
    }

    /// Advance kinematics and per-kind timers by one step
    pub fn update(&mut self, dt: f32, brane: &Brane, ctx: &SimContext) -> UpdateEvents {
        let mut events = UpdateEvents::default();

        if let EntityKind::Player(p) = &self.kind {
            let facing = heading_vector(self.body.heading);
            let mut thrust = Vec2::ZERO;
            if p.forward {
                thrust += facing * PLAYER_FWD_THRUST;
            }
            if p.backward {
                thrust -= facing * PLAYER_BCK_THRUST;
            }
            self.body.thrust = thrust;
            self.body.angular_vel = PLAYER_ROT_SPEED * p.rotation;
        }

        self.body.step(dt, brane, ctx);

        match &mut self.kind {
            EntityKind::Player(p) => {
                let facing = heading_vector(self.body.heading);
                if p.wavegen {
                    p.beam_elapsed += dt;
                    let period = p.beam_period();
                    if p.beam_elapsed > period {
                        p.beam_elapsed -= period;
                        let amplitude = if p.tractor {
                            p.beam.amplitude.abs()
                        } else {
                            -p.beam.amplitude.abs()
                        };
                        let source = ctx.wrap(self.body.pos + BEAM_EMIT_OFFSET * facing);
                        // carry the overshoot so pulses stay one period apart
                        match Wavelet::beam(source, facing, p.beam.with_amplitude(amplitude)) {
                            Ok(w) => events.wavelet = Some(w.with_lifetime(p.beam_elapsed)),
                            Err(e) => log::warn!("Beam emission skipped: {}", e),
                        }
                    }
                }

                let collector = ctx.wrap(self.body.pos + COLLECTOR_OFFSET * facing);
                p.collector_dr = ctx.displacement(p.collector, collector);
                p.collector = collector;
            }
            EntityKind::Asteroid(a) => {
                if let Some(elapsed) = a.growing {
                    let elapsed = elapsed + dt;
                    a.growing = (elapsed <= ASTEROID_GROW_TIME).then_some(elapsed);
                    self.size = ASTEROID_SIZE * (elapsed / ASTEROID_GROW_TIME).min(1.0);
                    if let Some(c) = self.collider.as_mut() {
                        c.radius = ASTEROID_RADIUS_FACTOR * self.size;
                    }
                }
            }
            EntityKind::Explosion(x) => {
                x.age += dt;
                if x.age > EXPLOSION_LIFETIME {
                    events.expired = true;
                } else {
                    let factor = x.age / EXPLOSION_LIFETIME;
                    self.size = EXPLOSION_MIN_SIZE * (1.0 - factor) + EXPLOSION_MAX_SIZE * factor;
                    if let Some(c) = self.collider.as_mut() {
                        c.radius = EXPLOSION_RADIUS_FACTOR * self.size;
                    }
                }
            }
            EntityKind::DarkMatter(m) => {
                m.age += dt;
                events.expired = m.age > m.max_lifetime;
            }
            EntityKind::Portal => {}
        }

        events
    }

    /// Collision response hook. Never touches world collections; wishes are
    /// recorded in `out` and applied after the sweep.
    pub fn on_collision(&mut self, other: &Peer, out: &mut Reactions) {
        match &self.kind {
            EntityKind::Asteroid(_) => {
                let mass = self.body.mass();
                let com_vel = (self.body.vel * mass + other.vel * other.mass) / (mass + other.mass);
                out.spawn.push(SpawnRequest::Loot {
                    pos: self.body.pos,
                    vel: com_vel,
                });
                out.spawn.push(SpawnRequest::Explosion {
                    pos: self.body.pos,
                    vel: self.body.vel,
                });
                out.spawn.push(SpawnRequest::Shockwave { pos: self.body.pos });
                self.alive = false;
                out.destroy.push(self.id);
            }
            EntityKind::Player(_) => {
                if matches!(other.tag, KindTag::Asteroid | KindTag::Explosion) {
                    log::info!("Player {:?} hit {:?} {:?}", self.id, other.tag, other.id);
                    out.game_over = true;
                }
            }
            EntityKind::Explosion(_) | EntityKind::DarkMatter(_) | EntityKind::Portal => {}
        }
    }
}
