//! Runtime tuning for the simulation core.
//!
//! Defaults come from the shared protocol constants; the binary layers CLI
//! overrides on top. Validation runs once before the scheduler starts and is
//! the only place a configuration problem is allowed to be fatal.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ArenaError;

/// Complete tuning for one authoritative arena instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// World edge length; positions live in `[0, world_size)` on both axes.
    pub world_size: f32,
    /// Target AI population, replenished every tick.
    pub num_ai_players: usize,
    /// Target food population, replenished every tick.
    pub num_food: usize,
    /// Maximum concurrently joined human players.
    pub max_players: usize,
    /// Simulation ticks per second.
    pub tick_rate: u32,
    /// Movement speed of an entity at the minimum player mass, units/s.
    pub base_speed: f32,
    pub food_mass: f32,
    pub min_player_mass: f32,
    /// Upper bound on mass; consumption gains above it are discarded.
    pub max_mass: f32,
    /// A consumer's mass must exceed the consumed mass by this factor.
    pub consume_ratio: f32,
    /// How far AI entities can see prey.
    pub perception_radius: f32,
    /// How close a larger entity must be before an AI flees. At most the
    /// perception radius.
    pub threat_radius: f32,
    /// Maximum wander heading change per tick, radians.
    pub wander_turn_rate: f32,
    /// Speed multiplier while sprinting.
    pub sprint_factor: f32,
    /// Mass drained per second of sprinting.
    pub sprint_drain: f32,
    /// Extra clearance kept between a fresh spawn and heavier entities.
    pub spawn_buffer: f32,
    /// Placement retries before giving up on a clear spot.
    pub spawn_attempts: u32,
    /// Spatial grid cell edge length.
    pub grid_cell: f32,
    /// RNG seed for reproducible runs; None draws from entropy.
    pub seed: Option<u64>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        ArenaConfig {
            world_size: shared::WORLD_SIZE,
            num_ai_players: shared::NUM_AI_PLAYERS,
            num_food: shared::NUM_FOOD,
            max_players: shared::MAX_PLAYERS,
            tick_rate: shared::TICK_RATE,
            base_speed: shared::BASE_SPEED,
            food_mass: shared::FOOD_MASS,
            min_player_mass: shared::MIN_PLAYER_MASS,
            max_mass: shared::MAX_MASS,
            consume_ratio: shared::CONSUME_RATIO,
            perception_radius: shared::PERCEPTION_RADIUS,
            threat_radius: shared::THREAT_RADIUS,
            wander_turn_rate: shared::WANDER_TURN_RATE,
            sprint_factor: shared::SPRINT_FACTOR,
            sprint_drain: shared::SPRINT_DRAIN,
            spawn_buffer: shared::SPAWN_BUFFER,
            spawn_attempts: shared::SPAWN_ATTEMPTS,
            grid_cell: shared::GRID_CELL,
            seed: None,
        }
    }
}

impl ArenaConfig {
    /// Checks every invariant the scheduler depends on.
    ///
    /// Called once before the first tick; a running simulation never
    /// revalidates.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if !self.world_size.is_finite() || self.world_size <= 0.0 {
            return Err(ArenaError::InvalidConfig("world_size must be positive"));
        }
        if self.grid_cell <= 0.0 || self.grid_cell > self.world_size {
            return Err(ArenaError::InvalidConfig(
                "grid_cell must be positive and no larger than the world",
            ));
        }
        if self.tick_rate == 0 {
            return Err(ArenaError::InvalidConfig("tick_rate must be positive"));
        }
        if self.max_players == 0 {
            return Err(ArenaError::InvalidConfig("max_players must be positive"));
        }
        if self.base_speed <= 0.0 {
            return Err(ArenaError::InvalidConfig("base_speed must be positive"));
        }
        if self.food_mass <= 0.0 {
            return Err(ArenaError::InvalidConfig("food_mass must be positive"));
        }
        if self.min_player_mass < self.food_mass {
            return Err(ArenaError::InvalidConfig(
                "min_player_mass must be at least food_mass",
            ));
        }
        if self.max_mass < self.min_player_mass {
            return Err(ArenaError::InvalidConfig(
                "max_mass must be at least min_player_mass",
            ));
        }
        if self.consume_ratio <= 1.0 {
            return Err(ArenaError::InvalidConfig(
                "consume_ratio must exceed 1.0 so equal masses coexist",
            ));
        }
        if self.perception_radius <= 0.0 || self.threat_radius <= 0.0 {
            return Err(ArenaError::InvalidConfig(
                "perception and threat radii must be positive",
            ));
        }
        if self.threat_radius > self.perception_radius {
            return Err(ArenaError::InvalidConfig(
                "threat_radius must not exceed perception_radius",
            ));
        }
        if self.wander_turn_rate <= 0.0 {
            return Err(ArenaError::InvalidConfig(
                "wander_turn_rate must be positive",
            ));
        }
        if self.sprint_factor < 1.0 {
            return Err(ArenaError::InvalidConfig(
                "sprint_factor must be at least 1.0",
            ));
        }
        if self.sprint_drain < 0.0 {
            return Err(ArenaError::InvalidConfig(
                "sprint_drain must not be negative",
            ));
        }
        if self.spawn_attempts == 0 {
            return Err(ArenaError::InvalidConfig(
                "spawn_attempts must be positive",
            ));
        }
        Ok(())
    }

    /// Fixed simulation timestep in seconds.
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_rate as f32
    }

    /// Wall-clock interval between scheduled ticks.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ArenaConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_world() {
        let mut config = ArenaConfig::default();
        config.world_size = 0.0;
        assert_eq!(
            config.validate(),
            Err(ArenaError::InvalidConfig("world_size must be positive"))
        );

        config.world_size = f32::NAN;
        assert!(config.validate().is_err());

        config.world_size = -2000.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_tick_rate() {
        let mut config = ArenaConfig::default();
        config.tick_rate = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_consume_ratio_at_or_below_one() {
        let mut config = ArenaConfig::default();
        config.consume_ratio = 1.0;
        assert!(config.validate().is_err());
        config.consume_ratio = 0.8;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_threat_radius_beyond_perception() {
        let mut config = ArenaConfig::default();
        config.threat_radius = config.perception_radius + 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_oversized_grid_cell() {
        let mut config = ArenaConfig::default();
        config.grid_cell = config.world_size * 2.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_dt_matches_tick_rate() {
        let mut config = ArenaConfig::default();
        config.tick_rate = 20;
        assert_eq!(config.dt(), 0.05);
        assert_eq!(config.tick_interval(), Duration::from_millis(50));
    }
}
