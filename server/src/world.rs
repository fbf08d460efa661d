//! Authoritative world state: the single true copy of every entity.
//!
//! Exactly one owner (the simulation tick) mutates this structure. Movement,
//! consumption and spawning all go through it; everything else in the core
//! only ever sees immutable projections.

use std::collections::HashMap;

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{radius_for_mass, EntityId, EntityKind, Intent, PlayerAction, Vec2};

use crate::config::ArenaConfig;

/// Keeps clamped positions strictly inside the half-open world interval.
const WALL_MARGIN: f32 = 1e-3;

/// One simulated entity. Owned exclusively by [`WorldState`]; everything
/// else references it by id.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: Vec2,
    pub mass: f32,
    /// Latest movement intent; persists until superseded.
    pub intent: Intent,
    pub alive: bool,
}

impl Entity {
    /// Collision radius derived from mass.
    pub fn radius(&self) -> f32 {
        radius_for_mass(self.mass)
    }

    /// True if this entity outweighs `other` by at least `ratio`.
    pub fn can_consume(&self, other: &Entity, ratio: f32) -> bool {
        self.mass >= other.mass * ratio
    }
}

/// Mapping from entity id to entity, plus the tick counter and bounds.
///
/// Ids are allocated monotonically and never reused within a run. Every
/// alive entity's position lies within `[0, world_size)` on both axes.
pub struct WorldState {
    config: ArenaConfig,
    entities: HashMap<EntityId, Entity>,
    next_entity_id: EntityId,
    tick: u64,
    rng: StdRng,
}

impl WorldState {
    pub fn new(config: ArenaConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        WorldState {
            config,
            entities: HashMap::new(),
            next_entity_id: 1,
            tick: 0,
            rng,
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn advance_tick(&mut self) {
        self.tick += 1;
    }

    pub fn world_size(&self) -> f32 {
        self.config.world_size
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn alive_entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values().filter(|e| e.alive)
    }

    pub fn count_alive(&self, kind: EntityKind) -> usize {
        self.entities
            .values()
            .filter(|e| e.alive && e.kind == kind)
            .count()
    }

    /// (id, position, radius) tuples for every alive entity, in no
    /// particular order. Input for the spatial index rebuild.
    pub fn collision_entries(&self) -> Vec<(EntityId, Vec2, f32)> {
        self.entities
            .values()
            .filter(|e| e.alive)
            .map(|e| (e.id, e.position, e.radius()))
            .collect()
    }

    /// Creates a new entity of the given kind at a random clear position.
    ///
    /// Placement avoids heavier entities within the spawn buffer on a
    /// best-effort basis: after the configured number of attempts the last
    /// candidate position is used regardless.
    pub fn spawn(&mut self, kind: EntityKind) -> EntityId {
        let mass = match kind {
            EntityKind::Food => self.config.food_mass,
            _ => self.config.min_player_mass,
        };
        let radius = radius_for_mass(mass);

        let mut position = Vec2::ZERO;
        let mut placed_clear = false;
        for _ in 0..self.config.spawn_attempts {
            position = Vec2::new(
                self.rng.gen_range(0.0..self.config.world_size),
                self.rng.gen_range(0.0..self.config.world_size),
            );
            if self.is_clear_for(position, radius, mass) {
                placed_clear = true;
                break;
            }
        }
        if !placed_clear {
            debug!(
                "no clear spawn spot for {:?} after {} attempts, placing anyway",
                kind, self.config.spawn_attempts
            );
        }

        self.spawn_at(kind, position, mass)
    }

    /// Creates an entity at an exact position with an exact mass.
    ///
    /// Skips the clear-spot search; intended for scripted scenarios where
    /// placement must be deterministic. The position is clamped to bounds.
    pub fn spawn_at(&mut self, kind: EntityKind, position: Vec2, mass: f32) -> EntityId {
        let world_max = self.config.world_size - WALL_MARGIN;
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        self.entities.insert(
            id,
            Entity {
                id,
                kind,
                position: Vec2::new(
                    position.x.clamp(0.0, world_max),
                    position.y.clamp(0.0, world_max),
                ),
                mass,
                intent: Intent::idle(),
                alive: true,
            },
        );
        id
    }

    /// True if no heavier alive entity sits within the spawn buffer of the
    /// candidate position.
    fn is_clear_for(&self, position: Vec2, radius: f32, mass: f32) -> bool {
        self.entities.values().all(|other| {
            if !other.alive || other.mass <= mass {
                return true;
            }
            let clearance = radius + other.radius() + self.config.spawn_buffer;
            other.position.distance_squared(&position) >= clearance * clearance
        })
    }

    /// Moves an entity to an exact position, clamped to bounds. Like
    /// [`WorldState::spawn_at`] this exists for scripted scenarios; ignored
    /// for unknown ids.
    pub fn place(&mut self, id: EntityId, position: Vec2) {
        let world_max = self.config.world_size - WALL_MARGIN;
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.position = Vec2::new(
                position.x.clamp(0.0, world_max),
                position.y.clamp(0.0, world_max),
            );
        }
    }

    /// Overrides an entity's mass. Scripted-scenario counterpart of growth
    /// through consumption; ignored for unknown ids or non-positive mass.
    pub fn set_mass(&mut self, id: EntityId, mass: f32) {
        if mass <= 0.0 {
            return;
        }
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.mass = mass.min(self.config.max_mass);
        }
    }

    /// Stores the latest intent for an entity. Ignored if the id is unknown
    /// or the entity is dead.
    pub fn set_intent(&mut self, id: EntityId, intent: Intent) {
        if let Some(entity) = self.entities.get_mut(&id) {
            if entity.alive {
                entity.intent = intent;
            }
        }
    }

    /// Integrates one entity's stored intent over `dt` seconds.
    ///
    /// World edges are solid walls: the result is clamped to bounds, never
    /// wrapped. Unknown or dead ids are ignored. Food never moves.
    pub fn apply_movement(&mut self, id: EntityId, dt: f32) {
        let world_max = self.config.world_size - WALL_MARGIN;
        let base_speed = self.config.base_speed;
        let min_mass = self.config.min_player_mass;
        let sprint_factor = self.config.sprint_factor;
        let sprint_drain = self.config.sprint_drain;

        let entity = match self.entities.get_mut(&id) {
            Some(entity) if entity.alive && entity.kind != EntityKind::Food => entity,
            _ => return,
        };

        // Heavier entities move slower; mass at or below the minimum moves
        // at full base speed.
        let mut speed = base_speed * (min_mass / entity.mass).sqrt().min(1.0);

        if entity.intent.action == Some(PlayerAction::Sprint) && entity.mass > min_mass {
            speed *= sprint_factor;
            entity.mass = (entity.mass - sprint_drain * dt).max(min_mass);
        }

        let next = entity.position.add(&entity.intent.direction.scale(speed * dt));
        entity.position = Vec2::new(
            next.x.clamp(0.0, world_max),
            next.y.clamp(0.0, world_max),
        );
    }

    /// Transfers the loser's mass to the winner (capped at `max_mass`) and
    /// marks the loser dead. No-op returning false if either entity is
    /// unknown or already dead.
    pub fn consume(&mut self, winner: EntityId, loser: EntityId) -> bool {
        if winner == loser {
            return false;
        }
        let gained = match (self.entities.get(&winner), self.entities.get(&loser)) {
            (Some(w), Some(l)) if w.alive && l.alive => l.mass,
            _ => return false,
        };
        let cap = self.config.max_mass;
        if let Some(loser) = self.entities.get_mut(&loser) {
            loser.alive = false;
        }
        if let Some(winner) = self.entities.get_mut(&winner) {
            winner.mass = (winner.mass + gained).min(cap);
        }
        true
    }

    /// Removes an entity outright (player disconnect). Returns false if the
    /// id was unknown.
    pub fn remove(&mut self, id: EntityId) -> bool {
        self.entities.remove(&id).is_some()
    }

    /// Drops every dead entity and returns their ids in ascending order.
    pub fn purge_dead(&mut self) -> Vec<EntityId> {
        let mut removed: Vec<EntityId> = self
            .entities
            .values()
            .filter(|e| !e.alive)
            .map(|e| e.id)
            .collect();
        removed.sort_unstable();
        for id in &removed {
            self.entities.remove(id);
        }
        removed
    }
}
