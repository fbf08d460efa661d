//! Uniform grid over entity positions for proximity and overlap queries.
//!
//! Purely a query accelerator: rebuilt from the world every tick, never a
//! source of truth. At the target scale (a few hundred entities) an O(n)
//! rebuild per tick is cheaper than incremental maintenance.

use std::collections::HashMap;

use shared::{EntityId, Vec2};

use crate::error::ArenaError;

/// Region -> entity ids bucketing, keyed by integer cell coordinates.
///
/// Entities are inserted into every cell their bounding circle touches, so
/// a query only needs to scan the cells covered by the query circle.
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<EntityId>>,
    /// Position and radius per indexed entity, for the precise overlap test.
    entries: HashMap<EntityId, (Vec2, f32)>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Result<Self, ArenaError> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(ArenaError::InvalidConfig("cell_size must be positive"));
        }
        Ok(SpatialGrid {
            cell_size,
            cells: HashMap::new(),
            entries: HashMap::new(),
        })
    }

    fn cell_coord(&self, v: f32) -> i32 {
        (v / self.cell_size).floor() as i32
    }

    /// Cell range covered by a circle's bounding box.
    fn cell_span(&self, center: Vec2, radius: f32) -> (i32, i32, i32, i32) {
        (
            self.cell_coord(center.x - radius),
            self.cell_coord(center.x + radius),
            self.cell_coord(center.y - radius),
            self.cell_coord(center.y + radius),
        )
    }

    /// Reconstructs the grid from scratch. O(n) in the number of entities.
    pub fn rebuild(&mut self, entities: &[(EntityId, Vec2, f32)]) {
        self.cells.clear();
        self.entries.clear();

        for &(id, position, radius) in entities {
            self.entries.insert(id, (position, radius));
            let (min_x, max_x, min_y, max_y) = self.cell_span(position, radius);
            for cx in min_x..=max_x {
                for cy in min_y..=max_y {
                    self.cells.entry((cx, cy)).or_default().push(id);
                }
            }
        }
    }

    /// Number of indexed entities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns ids of all indexed entities whose bounding circle intersects
    /// the query circle, excluding `exclude` itself.
    ///
    /// Result order is unspecified; callers must not depend on it.
    pub fn query(&self, center: Vec2, radius: f32, exclude: EntityId) -> Vec<EntityId> {
        let mut hits = Vec::new();
        let (min_x, max_x, min_y, max_y) = self.cell_span(center, radius);

        for cx in min_x..=max_x {
            for cy in min_y..=max_y {
                if let Some(bucket) = self.cells.get(&(cx, cy)) {
                    for &id in bucket {
                        if id == exclude || hits.contains(&id) {
                            continue;
                        }
                        if let Some(&(position, entity_radius)) = self.entries.get(&id) {
                            let reach = radius + entity_radius;
                            if center.distance_squared(&position) < reach * reach {
                                hits.push(id);
                            }
                        }
                    }
                }
            }
        }
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with(entities: &[(EntityId, Vec2, f32)]) -> SpatialGrid {
        let mut grid = SpatialGrid::new(100.0).unwrap();
        grid.rebuild(entities);
        grid
    }

    #[test]
    fn test_rejects_non_positive_cell_size() {
        assert!(SpatialGrid::new(0.0).is_err());
        assert!(SpatialGrid::new(-5.0).is_err());
        assert!(SpatialGrid::new(f32::NAN).is_err());
        assert!(SpatialGrid::new(100.0).is_ok());
    }

    #[test]
    fn test_query_finds_overlapping_circles() {
        let grid = grid_with(&[
            (1, Vec2::new(50.0, 50.0), 10.0),
            (2, Vec2::new(65.0, 50.0), 10.0),
            (3, Vec2::new(500.0, 500.0), 10.0),
        ]);

        let hits = grid.query(Vec2::new(50.0, 50.0), 10.0, 1);
        assert_eq!(hits, vec![2]);
    }

    #[test]
    fn test_query_never_returns_excluded_id() {
        let grid = grid_with(&[(1, Vec2::new(50.0, 50.0), 10.0)]);
        let hits = grid.query(Vec2::new(50.0, 50.0), 10.0, 1);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_query_spans_cell_boundaries() {
        // Two entities straddling the 100-unit cell border.
        let grid = grid_with(&[
            (1, Vec2::new(98.0, 50.0), 5.0),
            (2, Vec2::new(103.0, 50.0), 5.0),
        ]);

        let hits = grid.query(Vec2::new(98.0, 50.0), 5.0, 1);
        assert_eq!(hits, vec![2]);
        let hits = grid.query(Vec2::new(103.0, 50.0), 5.0, 2);
        assert_eq!(hits, vec![1]);
    }

    #[test]
    fn test_query_respects_radii_sum() {
        // Centers 30 apart, radii 10 + 10: circles do not touch.
        let grid = grid_with(&[
            (1, Vec2::new(0.0, 0.0), 10.0),
            (2, Vec2::new(30.0, 0.0), 10.0),
        ]);
        assert!(grid.query(Vec2::new(0.0, 0.0), 10.0, 1).is_empty());

        // Grow the query radius so the circles intersect.
        assert_eq!(grid.query(Vec2::new(0.0, 0.0), 25.0, 1), vec![2]);
    }

    #[test]
    fn test_large_entity_found_from_distant_cell() {
        // A big entity several cells wide must be discoverable from any
        // cell its circle touches.
        let grid = grid_with(&[(1, Vec2::new(500.0, 500.0), 250.0)]);
        let hits = grid.query(Vec2::new(300.0, 500.0), 10.0, 99);
        assert_eq!(hits, vec![1]);
    }

    #[test]
    fn test_rebuild_replaces_previous_contents() {
        let mut grid = SpatialGrid::new(100.0).unwrap();
        grid.rebuild(&[(1, Vec2::new(50.0, 50.0), 10.0)]);
        assert_eq!(grid.len(), 1);

        grid.rebuild(&[(2, Vec2::new(250.0, 250.0), 10.0)]);
        assert_eq!(grid.len(), 1);
        assert!(grid.query(Vec2::new(50.0, 50.0), 50.0, 0).is_empty());
        assert_eq!(grid.query(Vec2::new(250.0, 250.0), 10.0, 0), vec![2]);
    }

    #[test]
    fn test_no_duplicate_hits_for_multi_cell_entities() {
        let grid = grid_with(&[
            (1, Vec2::new(100.0, 100.0), 80.0),
            (2, Vec2::new(120.0, 100.0), 80.0),
        ]);
        let hits = grid.query(Vec2::new(100.0, 100.0), 80.0, 1);
        assert_eq!(hits, vec![2]);
    }
}
