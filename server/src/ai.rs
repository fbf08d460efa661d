//! Intent computation for AI-controlled entities.
//!
//! Runs once per tick before movement and produces intents through the same
//! interface human input uses. The heuristics are deliberately simple
//! target seeking and avoidance: a threat in range wins over prey, prey
//! wins over wandering, and wandering turns smoothly instead of jittering.

use std::collections::HashMap;
use std::f32::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{EntityId, EntityKind, Intent, Vec2};

use crate::config::ArenaConfig;
use crate::spatial::SpatialGrid;
use crate::world::{Entity, WorldState};

/// Computes one intent per AI entity per tick.
///
/// Holds the per-entity wander heading so direction changes stay bounded
/// between ticks. With a seeded RNG the controller is fully deterministic.
pub struct AiController {
    rng: StdRng,
    headings: HashMap<EntityId, f32>,
}

impl AiController {
    pub fn new(config: &ArenaConfig) -> Self {
        let rng = match config.seed {
            // Offset from the world seed so spawning and wandering draw
            // independent sequences.
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };
        AiController {
            rng,
            headings: HashMap::new(),
        }
    }

    /// Produces intents for every alive AI entity, ordered by entity id.
    pub fn compute_intents(
        &mut self,
        world: &WorldState,
        grid: &SpatialGrid,
        config: &ArenaConfig,
    ) -> Vec<(EntityId, Intent)> {
        let mut ai_ids: Vec<EntityId> = world
            .alive_entities()
            .filter(|e| e.kind == EntityKind::AiPlayer)
            .map(|e| e.id)
            .collect();
        ai_ids.sort_unstable();

        self.headings.retain(|id, _| ai_ids.binary_search(id).is_ok());

        let mut intents = Vec::with_capacity(ai_ids.len());
        for id in ai_ids {
            if let Some(entity) = world.get(id) {
                let direction = self.steer(entity, world, grid, config);
                intents.push((id, Intent::new(direction, None)));
            }
        }
        intents
    }

    fn steer(
        &mut self,
        entity: &Entity,
        world: &WorldState,
        grid: &SpatialGrid,
        config: &ArenaConfig,
    ) -> Vec2 {
        let neighbors = grid.query(entity.position, config.perception_radius, entity.id);

        let mut nearest_threat: Option<(f32, EntityId)> = None;
        let mut nearest_prey: Option<(f32, EntityId)> = None;
        let threat_range_sq = config.threat_radius * config.threat_radius;

        for other_id in neighbors {
            let other = match world.get(other_id) {
                Some(other) if other.alive => other,
                _ => continue,
            };
            let dist_sq = entity.position.distance_squared(&other.position);

            if other.can_consume(entity, config.consume_ratio) && dist_sq <= threat_range_sq {
                if closer(dist_sq, other_id, nearest_threat) {
                    nearest_threat = Some((dist_sq, other_id));
                }
            } else if entity.can_consume(other, config.consume_ratio)
                && closer(dist_sq, other_id, nearest_prey)
            {
                nearest_prey = Some((dist_sq, other_id));
            }
        }

        // Survival first: a threat inside its radius overrides any prey.
        if let Some((_, threat_id)) = nearest_threat {
            if let Some(threat) = world.get(threat_id) {
                let away = entity.position.sub(&threat.position).normalize();
                if away != Vec2::ZERO {
                    self.headings.insert(entity.id, away.angle());
                    return away;
                }
            }
        }

        if let Some((_, prey_id)) = nearest_prey {
            if let Some(prey) = world.get(prey_id) {
                let toward = prey.position.sub(&entity.position).normalize();
                if toward != Vec2::ZERO {
                    self.headings.insert(entity.id, toward.angle());
                    return toward;
                }
            }
        }

        self.wander(entity.id, config)
    }

    /// Smooth random walk: the heading persists per entity and turns at
    /// most `wander_turn_rate` radians per tick.
    fn wander(&mut self, id: EntityId, config: &ArenaConfig) -> Vec2 {
        let rng = &mut self.rng;
        let heading = self
            .headings
            .entry(id)
            .or_insert_with(|| rng.gen_range(-PI..PI));
        let turn = rng.gen_range(-config.wander_turn_rate..=config.wander_turn_rate);
        *heading = wrap_angle(*heading + turn);
        Vec2::from_angle(*heading)
    }
}

/// True if (dist_sq, id) beats the current best; equal distances break
/// toward the lower entity id.
fn closer(dist_sq: f32, id: EntityId, best: Option<(f32, EntityId)>) -> bool {
    match best {
        None => true,
        Some((best_dist, best_id)) => {
            dist_sq < best_dist || (dist_sq == best_dist && id < best_id)
        }
    }
}

fn wrap_angle(angle: f32) -> f32 {
    if angle > PI {
        angle - 2.0 * PI
    } else if angle < -PI {
        angle + 2.0 * PI
    } else {
        angle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn test_config() -> ArenaConfig {
        ArenaConfig {
            seed: Some(11),
            ..ArenaConfig::default()
        }
    }

    struct Setup {
        world: WorldState,
        grid: SpatialGrid,
        config: ArenaConfig,
        ai: AiController,
    }

    fn setup() -> Setup {
        let config = test_config();
        Setup {
            world: WorldState::new(config.clone()),
            grid: SpatialGrid::new(config.grid_cell).unwrap(),
            ai: AiController::new(&config),
            config,
        }
    }

    fn intents_for(setup: &mut Setup) -> HashMap<EntityId, Intent> {
        setup.grid.rebuild(&setup.world.collision_entries());
        setup
            .ai
            .compute_intents(&setup.world, &setup.grid, &setup.config)
            .into_iter()
            .collect()
    }

    #[test]
    fn test_seeks_nearby_food() {
        let mut s = setup();
        let ai = s
            .world
            .spawn_at(EntityKind::AiPlayer, Vec2::new(500.0, 500.0), 10.0);
        s.world
            .spawn_at(EntityKind::Food, Vec2::new(600.0, 500.0), 1.0);

        let intents = intents_for(&mut s);
        let direction = intents[&ai].direction;
        assert_approx_eq!(direction.x, 1.0, 0.0001);
        assert_approx_eq!(direction.y, 0.0, 0.0001);
    }

    #[test]
    fn test_flees_larger_entity_in_threat_radius() {
        let mut s = setup();
        let ai = s
            .world
            .spawn_at(EntityKind::AiPlayer, Vec2::new(500.0, 500.0), 10.0);
        s.world
            .spawn_at(EntityKind::HumanPlayer, Vec2::new(600.0, 500.0), 100.0);

        let intents = intents_for(&mut s);
        let direction = intents[&ai].direction;
        assert_approx_eq!(direction.x, -1.0, 0.0001);
        assert_approx_eq!(direction.y, 0.0, 0.0001);
    }

    #[test]
    fn test_threat_overrides_prey() {
        let mut s = setup();
        let ai = s
            .world
            .spawn_at(EntityKind::AiPlayer, Vec2::new(500.0, 500.0), 10.0);
        s.world
            .spawn_at(EntityKind::Food, Vec2::new(520.0, 500.0), 1.0);
        s.world
            .spawn_at(EntityKind::HumanPlayer, Vec2::new(500.0, 560.0), 100.0);

        let intents = intents_for(&mut s);
        let direction = intents[&ai].direction;
        // Fleeing straight down-to-up axis, ignoring the closer food.
        assert_approx_eq!(direction.x, 0.0, 0.0001);
        assert_approx_eq!(direction.y, -1.0, 0.0001);
    }

    #[test]
    fn test_larger_entity_outside_threat_radius_is_ignored() {
        let mut s = setup();
        let far = s.config.threat_radius + 50.0;
        let ai = s
            .world
            .spawn_at(EntityKind::AiPlayer, Vec2::new(500.0, 500.0), 10.0);
        s.world
            .spawn_at(EntityKind::HumanPlayer, Vec2::new(500.0 + far, 500.0), 100.0);

        let intents = intents_for(&mut s);
        // No prey, threat out of range: wandering, not fleeing.
        let direction = intents[&ai].direction;
        assert_approx_eq!(direction.magnitude(), 1.0, 0.0001);
        assert!(direction.x > -1.0);
    }

    #[test]
    fn test_equidistant_prey_breaks_tie_by_lower_id() {
        let mut s = setup();
        let ai = s
            .world
            .spawn_at(EntityKind::AiPlayer, Vec2::new(500.0, 500.0), 10.0);
        let left = s
            .world
            .spawn_at(EntityKind::Food, Vec2::new(400.0, 500.0), 1.0);
        let _right = s
            .world
            .spawn_at(EntityKind::Food, Vec2::new(600.0, 500.0), 1.0);

        let intents = intents_for(&mut s);
        let direction = intents[&ai].direction;
        // `left` spawned first and has the lower id.
        assert!(left < _right);
        assert_approx_eq!(direction.x, -1.0, 0.0001);
    }

    #[test]
    fn test_wander_turn_rate_is_bounded() {
        let mut s = setup();
        let ai = s
            .world
            .spawn_at(EntityKind::AiPlayer, Vec2::new(1000.0, 1000.0), 10.0);

        let first = intents_for(&mut s)[&ai].direction;
        let second = intents_for(&mut s)[&ai].direction;

        assert_approx_eq!(first.magnitude(), 1.0, 0.0001);
        assert_approx_eq!(second.magnitude(), 1.0, 0.0001);

        let mut delta = (second.angle() - first.angle()).abs();
        if delta > PI {
            delta = 2.0 * PI - delta;
        }
        assert!(delta <= s.config.wander_turn_rate + 0.0001);
    }

    #[test]
    fn test_same_seed_produces_identical_intents() {
        let build = || {
            let mut s = setup();
            s.world
                .spawn_at(EntityKind::AiPlayer, Vec2::new(300.0, 300.0), 10.0);
            s.world
                .spawn_at(EntityKind::AiPlayer, Vec2::new(1500.0, 1500.0), 10.0);
            let mut all = Vec::new();
            for _ in 0..5 {
                s.grid.rebuild(&s.world.collision_entries());
                all.push(s.ai.compute_intents(&s.world, &s.grid, &s.config));
            }
            all
        };

        assert_eq!(build(), build());
    }

    #[test]
    fn test_headings_dropped_for_dead_entities() {
        let mut s = setup();
        let ai = s
            .world
            .spawn_at(EntityKind::AiPlayer, Vec2::new(1000.0, 1000.0), 10.0);
        intents_for(&mut s);
        assert!(s.ai.headings.contains_key(&ai));

        let eater = s
            .world
            .spawn_at(EntityKind::HumanPlayer, Vec2::new(1000.0, 1000.0), 100.0);
        s.world.consume(eater, ai);
        s.world.purge_dead();
        intents_for(&mut s);
        assert!(!s.ai.headings.contains_key(&ai));
    }

    #[test]
    fn test_intents_ordered_by_entity_id() {
        let mut s = setup();
        for i in 0..6 {
            s.world.spawn_at(
                EntityKind::AiPlayer,
                Vec2::new(200.0 + 300.0 * i as f32, 200.0),
                10.0,
            );
        }
        s.grid.rebuild(&s.world.collision_entries());
        let intents = s.ai.compute_intents(&s.world, &s.grid, &s.config);
        for pair in intents.windows(2) {
            assert!(pair[0].0 < pair[1].0);
        }
    }
}
