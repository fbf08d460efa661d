//! Consumption resolution for overlapping entities.
//!
//! Runs after movement and before broadcast each tick. Pairs come from the
//! spatial index and are processed in a fixed ascending order, so the
//! outcome is identical regardless of how the index returned them.

use std::collections::HashSet;

use log::info;
use shared::EntityId;

use crate::spatial::SpatialGrid;
use crate::world::WorldState;

/// One consumption resolved during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumeEvent {
    pub winner: EntityId,
    pub loser: EntityId,
}

/// Detects overlapping pairs and applies the consumption rule.
///
/// The larger entity consumes the smaller when its mass exceeds the
/// smaller's by at least `consume_ratio`; overlaps below that margin
/// coexist. Each entity takes part in at most one consumption per tick,
/// enforced by skipping entities already resolved, with pairs visited in
/// ascending `(min_id, max_id)` order.
pub fn resolve_collisions(
    world: &mut WorldState,
    grid: &SpatialGrid,
    consume_ratio: f32,
) -> Vec<ConsumeEvent> {
    let mut pairs: Vec<(EntityId, EntityId)> = Vec::new();
    for (id, position, radius) in world.collision_entries() {
        for other in grid.query(position, radius, id) {
            let pair = if id < other { (id, other) } else { (other, id) };
            pairs.push(pair);
        }
    }
    pairs.sort_unstable();
    pairs.dedup();

    let mut resolved: HashSet<EntityId> = HashSet::new();
    let mut events = Vec::new();

    for (a, b) in pairs {
        if resolved.contains(&a) || resolved.contains(&b) {
            continue;
        }

        // Masses are read at resolution time so earlier consumptions this
        // tick are reflected.
        let (winner, loser) = match (world.get(a), world.get(b)) {
            (Some(ea), Some(eb)) if ea.alive && eb.alive => {
                if ea.can_consume(eb, consume_ratio) {
                    (a, b)
                } else if eb.can_consume(ea, consume_ratio) {
                    (b, a)
                } else {
                    // Insufficient margin: entities coexist touching.
                    continue;
                }
            }
            _ => continue,
        };

        if world.consume(winner, loser) {
            info!("entity {} consumed entity {}", winner, loser);
            resolved.insert(winner);
            resolved.insert(loser);
            events.push(ConsumeEvent { winner, loser });
        }
    }

    events
}
