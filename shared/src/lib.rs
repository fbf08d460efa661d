use serde::{Deserialize, Serialize};

pub const WORLD_SIZE: f32 = 2000.0;
pub const NUM_AI_PLAYERS: usize = 10;
pub const NUM_FOOD: usize = 100;
pub const MAX_PLAYERS: usize = 32;
pub const TICK_RATE: u32 = 20;
pub const BASE_SPEED: f32 = 180.0;
pub const FOOD_MASS: f32 = 1.0;
pub const MIN_PLAYER_MASS: f32 = 10.0;
pub const MAX_MASS: f32 = 500.0;
pub const CONSUME_RATIO: f32 = 1.25;
pub const PERCEPTION_RADIUS: f32 = 300.0;
pub const THREAT_RADIUS: f32 = 180.0;
pub const WANDER_TURN_RATE: f32 = 0.6;
pub const SPRINT_FACTOR: f32 = 1.5;
pub const SPRINT_DRAIN: f32 = 0.4;
pub const SPAWN_BUFFER: f32 = 40.0;
pub const SPAWN_ATTEMPTS: u32 = 16;
pub const GRID_CELL: f32 = 100.0;
pub const RADIUS_SCALE: f32 = 4.0;

/// Stable identifier for a simulated entity. Never reused within a server run.
pub type EntityId = u64;

/// Identifier assigned to a connected player by the transport layer.
pub type PlayerId = u32;

/// Represents a vector in 2D space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Vec2 {
        Vec2 { x, y }
    }

    ///Returns the magnitude of the vector.
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn magnitude_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    ///Returns the normalized vector, or zero if the vector has no length.
    pub fn normalize(&self) -> Vec2 {
        let mag = self.magnitude();
        if mag == 0.0 {
            Vec2::ZERO
        } else {
            Vec2 {
                x: self.x / mag,
                y: self.y / mag,
            }
        }
    }

    ///Returns the scaled vector.
    pub fn scale(&self, scalar: f32) -> Vec2 {
        Vec2 {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }

    ///Returns the sum of two vectors.
    pub fn add(&self, other: &Vec2) -> Vec2 {
        Vec2 {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    ///Returns the difference of two vectors.
    pub fn sub(&self, other: &Vec2) -> Vec2 {
        Vec2 {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    pub fn distance_squared(&self, other: &Vec2) -> f32 {
        self.sub(other).magnitude_squared()
    }

    pub fn distance(&self, other: &Vec2) -> f32 {
        self.sub(other).magnitude()
    }

    ///Builds a unit vector pointing along the given angle in radians.
    pub fn from_angle(angle: f32) -> Vec2 {
        Vec2 {
            x: angle.cos(),
            y: angle.sin(),
        }
    }

    ///Returns the angle of the vector in radians.
    pub fn angle(&self) -> f32 {
        self.y.atan2(self.x)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Discriminates the three populations that share the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    HumanPlayer,
    AiPlayer,
    Food,
}

impl EntityKind {
    /// True for entities that move under an intent (human or AI controlled).
    pub fn is_player(&self) -> bool {
        matches!(self, EntityKind::HumanPlayer | EntityKind::AiPlayer)
    }
}

/// Optional one-shot action carried alongside a movement intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerAction {
    /// Temporary speed boost paid for by mass drain.
    Sprint,
}

/// A player's or AI's desired movement for the upcoming tick.
///
/// The direction is a unit-length-or-zero vector; a zero vector means stop.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Intent {
    pub direction: Vec2,
    pub action: Option<PlayerAction>,
}

impl Intent {
    pub fn new(direction: Vec2, action: Option<PlayerAction>) -> Intent {
        Intent { direction, action }
    }

    /// Intent that keeps the entity in place.
    pub fn idle() -> Intent {
        Intent::default()
    }
}

/// Validates a raw direction vector received from a client.
///
/// Returns None for non-finite components. Directions longer than unit
/// length are clamped; shorter ones (including zero) pass through unchanged.
pub fn sanitize_direction(direction: Vec2) -> Option<Vec2> {
    if !direction.is_finite() {
        return None;
    }
    let mag = direction.magnitude();
    if mag > 1.0 {
        Some(direction.scale(1.0 / mag))
    } else {
        Some(direction)
    }
}

/// Collision/render radius derived from mass.
pub fn radius_for_mass(mass: f32) -> f32 {
    mass.max(0.0).sqrt() * RADIUS_SCALE
}

/// Per-entity projection included in snapshots and deltas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: Vec2,
    pub mass: f32,
}

/// Full authoritative world state at a given tick, immutable once published.
///
/// Entity views are sorted by id so identical worlds encode identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub entities: Vec<EntityView>,
}

impl Snapshot {
    pub fn find(&self, id: EntityId) -> Option<&EntityView> {
        self.entities.iter().find(|e| e.id == id)
    }
}

/// The subset of world state that changed between two published ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDelta {
    pub tick: u64,
    /// Tick of the publish this delta is relative to.
    pub base_tick: u64,
    /// Entities that appeared or changed since the base tick.
    pub updated: Vec<EntityView>,
    /// Entities that no longer exist.
    pub removed: Vec<EntityId>,
}

impl StateDelta {
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.removed.is_empty()
    }
}

/// One published simulation step: the full snapshot plus the delta against
/// the previously published tick.
///
/// Observers that consumed the previous publish may apply the smaller delta;
/// observers that skipped publishes fall back to the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickUpdate {
    pub snapshot: Snapshot,
    pub delta: StateDelta,
}

impl TickUpdate {
    /// Encodes the update into its binary wire form.
    pub fn encode(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Decodes an update from its binary wire form.
    pub fn decode(bytes: &[u8]) -> Result<TickUpdate, bincode::Error> {
        bincode::deserialize(bytes)
    }
}
