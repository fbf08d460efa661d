//! Snapshot and delta construction.
//!
//! Read-only over the world: builders never mutate what they project. Views
//! are sorted by id so equal worlds produce byte-identical encodings.

use shared::{EntityView, Snapshot, StateDelta};

use crate::world::WorldState;

/// Projects the current world into an immutable, tick-numbered snapshot.
pub fn build_snapshot(world: &WorldState) -> Snapshot {
    let mut entities: Vec<EntityView> = world
        .alive_entities()
        .map(|e| EntityView {
            id: e.id,
            kind: e.kind,
            position: e.position,
            mass: e.mass,
        })
        .collect();
    entities.sort_by_key(|e| e.id);

    Snapshot {
        tick: world.tick(),
        entities,
    }
}

/// Computes the change set between two consecutive published snapshots.
///
/// Relies on both entity lists being sorted by id. An entity appears in
/// `updated` when it is new or its position or mass changed, and in
/// `removed` when it left the world since the base snapshot.
pub fn diff_snapshots(base: &Snapshot, next: &Snapshot) -> StateDelta {
    let mut updated = Vec::new();
    let mut removed = Vec::new();

    let mut base_iter = base.entities.iter().peekable();
    for entity in &next.entities {
        // Everything in the base below the current id is gone.
        while let Some(old) = base_iter.peek() {
            if old.id < entity.id {
                removed.push(old.id);
                base_iter.next();
            } else {
                break;
            }
        }

        match base_iter.peek() {
            Some(old) if old.id == entity.id => {
                if old.position != entity.position || old.mass != entity.mass {
                    updated.push(entity.clone());
                }
                base_iter.next();
            }
            _ => updated.push(entity.clone()),
        }
    }
    removed.extend(base_iter.map(|old| old.id));

    StateDelta {
        tick: next.tick,
        base_tick: base.tick,
        updated,
        removed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArenaConfig;
    use shared::{EntityKind, Vec2};

    fn test_config() -> ArenaConfig {
        ArenaConfig {
            seed: Some(5),
            ..ArenaConfig::default()
        }
    }

    fn view(id: u64, x: f32, mass: f32) -> EntityView {
        EntityView {
            id,
            kind: EntityKind::Food,
            position: Vec2::new(x, 0.0),
            mass,
        }
    }

    fn snapshot_of(tick: u64, entities: Vec<EntityView>) -> Snapshot {
        Snapshot { tick, entities }
    }

    #[test]
    fn test_snapshot_sorted_and_alive_only() {
        let mut world = WorldState::new(test_config());
        let a = world.spawn_at(EntityKind::AiPlayer, Vec2::new(100.0, 100.0), 10.0);
        let b = world.spawn_at(EntityKind::Food, Vec2::new(200.0, 200.0), 1.0);
        let c = world.spawn_at(EntityKind::Food, Vec2::new(300.0, 300.0), 1.0);
        world.consume(a, b);

        let snapshot = build_snapshot(&world);
        let ids: Vec<u64> = snapshot.entities.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![a, c]);
    }

    #[test]
    fn test_identical_worlds_encode_identically() {
        let build = || {
            let mut world = WorldState::new(test_config());
            world.spawn_at(EntityKind::AiPlayer, Vec2::new(100.0, 100.0), 10.0);
            world.spawn_at(EntityKind::Food, Vec2::new(200.0, 200.0), 1.0);
            bincode::serialize(&build_snapshot(&world)).unwrap()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_diff_reports_changed_entities_only() {
        let base = snapshot_of(1, vec![view(1, 10.0, 5.0), view(2, 20.0, 5.0)]);
        let next = snapshot_of(2, vec![view(1, 15.0, 5.0), view(2, 20.0, 5.0)]);

        let delta = diff_snapshots(&base, &next);
        assert_eq!(delta.base_tick, 1);
        assert_eq!(delta.tick, 2);
        assert_eq!(delta.updated, vec![view(1, 15.0, 5.0)]);
        assert!(delta.removed.is_empty());
    }

    #[test]
    fn test_diff_reports_new_entities() {
        let base = snapshot_of(1, vec![view(1, 10.0, 5.0)]);
        let next = snapshot_of(2, vec![view(1, 10.0, 5.0), view(3, 30.0, 1.0)]);

        let delta = diff_snapshots(&base, &next);
        assert_eq!(delta.updated, vec![view(3, 30.0, 1.0)]);
        assert!(delta.removed.is_empty());
    }

    #[test]
    fn test_diff_reports_removed_entities() {
        let base = snapshot_of(1, vec![view(1, 10.0, 5.0), view(2, 20.0, 5.0), view(5, 50.0, 5.0)]);
        let next = snapshot_of(2, vec![view(2, 20.0, 5.0)]);

        let delta = diff_snapshots(&base, &next);
        assert!(delta.updated.is_empty());
        assert_eq!(delta.removed, vec![1, 5]);
    }

    #[test]
    fn test_diff_mass_change_counts_as_update() {
        let base = snapshot_of(1, vec![view(1, 10.0, 5.0)]);
        let next = snapshot_of(2, vec![view(1, 10.0, 6.0)]);

        let delta = diff_snapshots(&base, &next);
        assert_eq!(delta.updated, vec![view(1, 10.0, 6.0)]);
    }

    #[test]
    fn test_diff_of_identical_snapshots_is_empty() {
        let entities = vec![view(1, 10.0, 5.0), view(2, 20.0, 5.0)];
        let base = snapshot_of(1, entities.clone());
        let next = snapshot_of(2, entities);

        let delta = diff_snapshots(&base, &next);
        assert!(delta.is_empty());
    }

    #[test]
    fn test_diff_interleaved_add_remove() {
        let base = snapshot_of(1, vec![view(1, 1.0, 1.0), view(3, 3.0, 1.0)]);
        let next = snapshot_of(2, vec![view(2, 2.0, 1.0), view(3, 3.0, 1.0), view(4, 4.0, 1.0)]);

        let delta = diff_snapshots(&base, &next);
        assert_eq!(delta.updated, vec![view(2, 2.0, 1.0), view(4, 4.0, 1.0)]);
        assert_eq!(delta.removed, vec![1]);
    }
}
