//! The world: entity registry, membership lists and deferred mutation
//!
//! Entities live in an id-ordered map. Capability lists (`updatables`,
//! `drawables`, `collectables`, `collidables`) hold ids in spawn order and
//! drive every per-step pass. Nothing is removed mid-pass: destruction is
//! scheduled, then applied in one sweep after the pass that requested it.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use super::brane::Brane;
use super::collision::swept_circles_collide;
use super::context::SimContext;
use super::entity::{Entity, EntityId, EntityKind, Reactions, SpawnRequest};
use super::geometry::in_view;
use super::wavelet::Wavelet;
use crate::consts::*;
use crate::error::{Result, SimError};
use crate::settings::Settings;

/// Rejection-sampling budget for a hazard position
const MAX_SPAWN_ATTEMPTS: usize = 100;

/// Loot velocity jitter, per component
const LOOT_JITTER: f32 = 0.1;

/// Initial hazard speed, per component
const HAZARD_SPEED: f32 = 0.03;

/// Current phase of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorldPhase {
    Running,
    Paused,
    GameOver,
}

/// Everything that is simulated
#[derive(Debug, Clone)]
pub struct World {
    settings: Settings,
    ctx: SimContext,
    brane: Brane,
    entities: BTreeMap<EntityId, Entity>,
    updatables: Vec<EntityId>,
    drawables: Vec<EntityId>,
    collectables: Vec<EntityId>,
    collidables: Vec<EntityId>,
    pending_destruction: Vec<EntityId>,
    spawn_queue: Vec<SpawnRequest>,
    player: Option<EntityId>,
    phase: WorldPhase,
    rng: Pcg32,
    next_id: u32,
    /// Simulated time in ms
    pub time: f32,
    /// Completed steps
    pub steps: u64,
}

impl World {
    /// A fresh run: player at the centre surrounded by the base hazards
    pub fn new(settings: Settings) -> Result<Self> {
        let mut world = Self::empty(settings)?;
        world.reset()?;
        Ok(world)
    }

    /// A world with no entities at all
    pub fn empty(settings: Settings) -> Result<Self> {
        settings.validate()?;
        let ctx = settings.context()?;
        let extent = ctx.world_size().unwrap_or(settings.grid_extent);
        let brane = Brane::new(settings.grid_spec(Vec2::splat(0.5 * extent))?, &ctx);
        let rng = Pcg32::seed_from_u64(settings.seed);
        Ok(Self {
            settings,
            ctx,
            brane,
            entities: BTreeMap::new(),
            updatables: Vec::new(),
            drawables: Vec::new(),
            collectables: Vec::new(),
            collidables: Vec::new(),
            pending_destruction: Vec::new(),
            spawn_queue: Vec::new(),
            player: None,
            phase: WorldPhase::Running,
            rng,
            next_id: 1,
            time: 0.0,
            steps: 0,
        })
    }

    /// Start over with the same settings and seed
    pub fn reset(&mut self) -> Result<()> {
        *self = Self::empty(self.settings.clone())?;

        let center = self.spawn_center();
        let id = self.next_entity_id();
        let player = Entity::player(id, center, self.settings.beam)?;
        self.spawn(player);

        let min_dist = std::f32::consts::SQRT_2 * PLAYER_SIZE;
        for _ in 0..self.settings.base_hazards {
            let Some(pos) = self.random_position_away(center, min_dist) else {
                log::warn!("No room for another hazard, stopping at {}", self.hazard_count());
                break;
            };
            let vel = self.random_hazard_velocity();
            let id = self.next_entity_id();
            let roid = Entity::asteroid(id, pos, vel, &mut self.rng)?;
            self.spawn(roid);
        }

        log::info!(
            "World reset: seed {}, {} entities",
            self.settings.seed,
            self.entities.len()
        );
        Ok(())
    }

    // === Queries ===

    #[inline]
    pub fn ctx(&self) -> &SimContext {
        &self.ctx
    }

    #[inline]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[inline]
    pub fn brane(&self) -> &Brane {
        &self.brane
    }

    #[inline]
    pub fn phase(&self) -> WorldPhase {
        self.phase
    }

    #[inline]
    pub fn is_game_over(&self) -> bool {
        self.phase == WorldPhase::GameOver
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// All entities in id order
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn player(&self) -> Option<&Entity> {
        self.player.and_then(|id| self.entities.get(&id))
    }

    pub fn player_mut(&mut self) -> Option<&mut Entity> {
        self.player.and_then(|id| self.entities.get_mut(&id))
    }

    pub fn score(&self) -> u64 {
        self.player()
            .and_then(|p| p.player_state())
            .map_or(0, |p| p.score)
    }

    pub fn updatables(&self) -> &[EntityId] {
        &self.updatables
    }

    pub fn drawables(&self) -> &[EntityId] {
        &self.drawables
    }

    pub fn collectables(&self) -> &[EntityId] {
        &self.collectables
    }

    pub fn collidables(&self) -> &[EntityId] {
        &self.collidables
    }

    /// Scheduled but not yet applied destructions
    pub fn pending_destruction(&self) -> &[EntityId] {
        &self.pending_destruction
    }

    /// Live asteroids, the hazards counted for replenishment
    pub fn hazard_count(&self) -> usize {
        self.collidables
            .iter()
            .filter_map(|id| self.entities.get(id))
            .filter(|e| e.alive && matches!(e.kind, EntityKind::Asteroid(_)))
            .count()
    }

    // === Lifecycle ===

    pub fn toggle_pause(&mut self) {
        self.phase = match self.phase {
            WorldPhase::Running => WorldPhase::Paused,
            WorldPhase::Paused => WorldPhase::Running,
            WorldPhase::GameOver => WorldPhase::GameOver,
        };
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Insert an entity and register it with every list its capabilities
    /// call for
    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        let id = entity.id;
        self.updatables.push(id);
        if entity.visible {
            self.drawables.push(id);
        }
        if entity.is_collectable() {
            self.collectables.push(id);
        }
        if entity.is_collidable() {
            self.collidables.push(id);
        }
        if matches!(entity.kind, EntityKind::Player(_)) {
            self.player = Some(id);
        }
        self.entities.insert(id, entity);
        id
    }

    /// Mark an entity for removal at the next `apply_destruction`.
    /// Returns false if it is unknown or already scheduled.
    pub fn schedule_destruction(&mut self, id: EntityId) -> bool {
        match self.entities.get_mut(&id) {
            Some(e) if e.alive => {
                e.alive = false;
                self.pending_destruction.push(id);
                true
            }
            _ => false,
        }
    }

    /// Remove every scheduled entity from the registry and from each
    /// membership list
    pub fn apply_destruction(&mut self) -> usize {
        if self.pending_destruction.is_empty() {
            return 0;
        }
        let doomed: HashSet<EntityId> = self.pending_destruction.drain(..).collect();
        self.updatables.retain(|id| !doomed.contains(id));
        self.drawables.retain(|id| !doomed.contains(id));
        self.collectables.retain(|id| !doomed.contains(id));
        self.collidables.retain(|id| !doomed.contains(id));
        for id in &doomed {
            self.entities.remove(id);
        }
        if self.player.is_some_and(|id| doomed.contains(&id)) {
            self.player = None;
        }
        log::debug!("Destroyed {} entities, {} remain", doomed.len(), self.entities.len());
        doomed.len()
    }

    // === Per-step passes ===

    /// Age the field once. The grid is resampled by `follow_player` at the
    /// end of the step, after emitted wavelets are registered.
    pub fn step_field(&mut self, dt: f32) {
        self.brane.advance(dt);
    }

    /// Integrate every updatable against the field as it stood before any
    /// of them moved, then register the wavelets they emitted
    pub fn integrate_bodies(&mut self, dt: f32) {
        let mut emitted: Vec<Wavelet> = Vec::new();
        let mut expired = Vec::new();
        for id in &self.updatables {
            let Some(entity) = self.entities.get_mut(id) else {
                continue;
            };
            if !entity.alive {
                continue;
            }
            let events = entity.update(dt, &self.brane, &self.ctx);
            emitted.extend(events.wavelet);
            if events.expired {
                expired.push(*id);
            }
        }

        for wavelet in emitted {
            self.brane.register_wavelet(wavelet, &self.ctx);
        }
        for id in expired {
            self.schedule_destruction(id);
        }
        self.apply_destruction();
    }

    /// Pairwise swept collision pass over the collidables
    ///
    /// Responses only record wishes; destruction and spawning happen after
    /// the sweep. Once an entity is dead it takes no further part in it.
    pub fn step_collisions(&mut self, dt: f32) {
        let mut reactions = Reactions::default();
        let ids = &self.collidables;
        let entities = &mut self.entities;

        for (i, a_id) in ids.iter().enumerate() {
            for b_id in &ids[i + 1..] {
                let (Some(a), Some(b)) = (entities.get(a_id), entities.get(b_id)) else {
                    continue;
                };
                if !a.alive {
                    break;
                }
                if !b.alive || !a.check_collision(b, dt, &self.ctx) {
                    continue;
                }
                let (peer_a, peer_b) = (a.peer(), b.peer());
                log::trace!("Collision {:?} {:?} <-> {:?} {:?}", peer_a.tag, a_id, peer_b.tag, b_id);
                if let Some(a) = entities.get_mut(a_id) {
                    a.on_collision(&peer_b, &mut reactions);
                }
                if let Some(b) = entities.get_mut(b_id) {
                    b.on_collision(&peer_a, &mut reactions);
                }
            }
        }

        self.pending_destruction.extend(reactions.destroy);
        self.spawn_queue.extend(reactions.spawn);
        if reactions.game_over && self.phase != WorldPhase::GameOver {
            log::info!("Game over at score {}", self.score());
            self.phase = WorldPhase::GameOver;
        }
        self.apply_destruction();
    }

    /// Move loot touched by the player's collector into the score.
    /// Returns the number collected.
    pub fn collect_pickups(&mut self) -> usize {
        let Some((collector, collector_dr)) = self
            .player()
            .and_then(|p| p.player_state())
            .map(|s| (s.collector, s.collector_dr))
        else {
            return 0;
        };

        let grid = self.brane.grid();
        let world = self.ctx.world_size();
        let picked: Vec<EntityId> = self
            .collectables
            .iter()
            .filter_map(|id| self.entities.get(id))
            .filter(|e| e.alive && in_view(e.body.pos, e.size, grid.center, 0.5 * grid.extent, world))
            .filter(|e| {
                swept_circles_collide(e.body.pos, e.body.dr, collector, collector_dr, COLLECT_RADIUS, &self.ctx)
            })
            .map(|e| e.id)
            .collect();

        if picked.is_empty() {
            return 0;
        }
        if let Some(state) = self.player_mut().and_then(|p| p.player_state_mut()) {
            state.score += picked.len() as u64;
        }
        for id in &picked {
            self.schedule_destruction(*id);
        }
        self.apply_destruction();
        picked.len()
    }

    /// Turn queued spawn requests into entities and wavelets
    pub fn flush_spawns(&mut self) -> Result<()> {
        for request in std::mem::take(&mut self.spawn_queue) {
            match request {
                SpawnRequest::Loot { pos, vel } => {
                    let jitter = Vec2::new(self.rng.random::<f32>() - 0.5, self.rng.random::<f32>() - 0.5) * LOOT_JITTER;
                    let id = self.next_entity_id();
                    let loot = Entity::dark_matter(id, pos, vel + jitter, &mut self.rng)?;
                    self.spawn(loot);
                }
                SpawnRequest::Explosion { pos, vel } => {
                    let id = self.next_entity_id();
                    let boom = Entity::explosion(id, pos, vel, &mut self.rng)?;
                    self.spawn(boom);
                }
                SpawnRequest::Shockwave { pos } => {
                    let reach = 0.5 * self.ctx.world_size().unwrap_or(self.settings.grid_extent);
                    let wave = Wavelet::pulse(pos, self.settings.pulse, reach)?;
                    self.brane.register_wavelet(wave, &self.ctx);
                }
            }
        }
        Ok(())
    }

    /// Top up the asteroid count to `base + floor(1.5·√score)`, spawning
    /// growing asteroids at least 0.4·S from the player. Returns the number
    /// spawned.
    pub fn replenish_hazards(&mut self) -> Result<usize> {
        let size = self
            .ctx
            .world_size()
            .ok_or(SimError::Unsupported("hazard replenishment needs periodic boundaries"))?;
        let Some(origin) = self.player().map(|p| p.body.pos) else {
            return Ok(0);
        };

        let target = self.settings.base_hazards as usize + (1.5 * (self.score() as f32).sqrt()).floor() as usize;
        let current = self.hazard_count();
        let mut spawned = 0;
        for _ in current..target {
            let Some(pos) = self.random_position_away(origin, 0.4 * size) else {
                log::warn!("No room for another hazard after {} attempts", MAX_SPAWN_ATTEMPTS);
                break;
            };
            let vel = self.random_hazard_velocity();
            let id = self.next_entity_id();
            let roid = Entity::growing_asteroid(id, pos, vel, &mut self.rng)?;
            self.spawn(roid);
            spawned += 1;
        }
        if spawned > 0 {
            log::debug!("Spawned {} hazards, target {}", spawned, target);
        }
        Ok(spawned)
    }

    /// Keep the field grid centred on the player and its samples current
    pub fn follow_player(&mut self) {
        match self.player().map(|p| p.body.pos) {
            Some(pos) => self.brane.recenter(pos, &self.ctx),
            None => self.brane.resample(&self.ctx),
        }
    }

    // === Helpers ===

    fn spawn_extent(&self) -> f32 {
        self.ctx.world_size().unwrap_or(self.settings.grid_extent)
    }

    fn spawn_center(&self) -> Vec2 {
        Vec2::splat(0.5 * self.spawn_extent())
    }

    fn random_position_away(&mut self, from: Vec2, min_dist: f32) -> Option<Vec2> {
        let extent = self.spawn_extent();
        let min_sq = min_dist * min_dist;
        (0..MAX_SPAWN_ATTEMPTS).find_map(|_| {
            let pos = Vec2::new(self.rng.random::<f32>(), self.rng.random::<f32>()) * extent;
            (self.ctx.displacement(from, pos).length_squared() >= min_sq).then_some(pos)
        })
    }

    fn random_hazard_velocity(&mut self) -> Vec2 {
        Vec2::new(self.rng.random::<f32>() - 0.5, self.rng.random::<f32>() - 0.5) * HAZARD_SPEED
    }
}
