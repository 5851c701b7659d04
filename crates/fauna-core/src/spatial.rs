//! `SpatialGrid`: a rebuild-per-tick uniform bucketed grid over the toroidal
//! world, supporting bounded-work neighborhood queries with an explicit
//! result cap, so crowd spikes cost bounded work instead of unbounded
//! candidate fan-out.

use crate::toroidal;

/// One neighbor result: the entity index plus its toroidal delta and squared
/// distance from the query point, precomputed so callers never recompute
/// wrap math.
#[derive(Clone, Copy, Debug)]
pub struct Neighbor {
    pub entity: u32,
    pub dx: f64,
    pub dy: f64,
    pub dist_sq: f64,
}

pub struct SpatialGrid {
    cols: usize,
    rows: usize,
    cell_size: f64,
    world_width: f64,
    world_height: f64,
    buckets: Vec<Vec<u32>>,
}

impl SpatialGrid {
    pub const MAX_QUERY_RESULTS: usize = 128;

    pub fn new(world_width: f64, world_height: f64, cell_size: f64) -> Self {
        let cell_size = cell_size.max(1e-6);
        let cols = (world_width / cell_size).ceil().max(1.0) as usize;
        let rows = (world_height / cell_size).ceil().max(1.0) as usize;
        Self {
            cols,
            rows,
            cell_size,
            world_width,
            world_height,
            buckets: vec![Vec::new(); cols * rows],
        }
    }

    fn cell_of(&self, x: f64, y: f64) -> (usize, usize) {
        let col = ((x / self.cell_size) as i64).rem_euclid(self.cols as i64) as usize;
        let row = ((y / self.cell_size) as i64).rem_euclid(self.rows as i64) as usize;
        (col, row)
    }

    /// Clear and repopulate every bucket from `positions`. Entities for which
    /// `include(index)` returns `false` are skipped (e.g. dead fauna).
    pub fn rebuild(&mut self, positions: &[(f64, f64)], mut include: impl FnMut(usize) -> bool) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        for (idx, &(x, y)) in positions.iter().enumerate() {
            if !include(idx) {
                continue;
            }
            let (col, row) = self.cell_of(x, y);
            self.buckets[row * self.cols + col].push(idx as u32);
        }
    }

    /// Append up to `MAX_QUERY_RESULTS` neighbors of `(x, y)` within `radius`
    /// to `out`, excluding `exclude` (typically the querying entity itself).
    /// `positions` must be the same slice `rebuild` was populated from.
    pub fn query_into(
        &self,
        out: &mut Vec<Neighbor>,
        x: f64,
        y: f64,
        radius: f64,
        exclude: u32,
        positions: &[(f64, f64)],
    ) {
        let radius_sq = radius * radius;
        let ring = (radius / self.cell_size).ceil() as i64;
        let (center_col, center_row) = self.cell_of(x, y);

        for dr in -ring..=ring {
            for dc in -ring..=ring {
                if out.len() >= Self::MAX_QUERY_RESULTS {
                    return;
                }
                let col = (center_col as i64 + dc).rem_euclid(self.cols as i64) as usize;
                let row = (center_row as i64 + dr).rem_euclid(self.rows as i64) as usize;
                for &entity in &self.buckets[row * self.cols + col] {
                    if entity == exclude {
                        continue;
                    }
                    let Some(&pos) = positions.get(entity as usize) else {
                        continue;
                    };
                    let (dx, dy) = toroidal::delta((x, y), pos, self.world_width, self.world_height);
                    let dist_sq = dx * dx + dy * dy;
                    if dist_sq <= radius_sq {
                        out.push(Neighbor {
                            entity,
                            dx,
                            dy,
                            dist_sq,
                        });
                        if out.len() >= Self::MAX_QUERY_RESULTS {
                            return;
                        }
                    }
                }
            }
        }
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_neighbors_within_radius() {
        let positions = vec![(10.0, 10.0), (12.0, 10.0), (500.0, 500.0)];
        let mut grid = SpatialGrid::new(1000.0, 1000.0, 20.0);
        grid.rebuild(&positions, |_| true);
        let mut out = Vec::new();
        grid.query_into(&mut out, 10.0, 10.0, 5.0, 0, &positions);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].entity, 1);
    }

    #[test]
    fn excludes_self() {
        let positions = vec![(10.0, 10.0)];
        let mut grid = SpatialGrid::new(100.0, 100.0, 10.0);
        grid.rebuild(&positions, |_| true);
        let mut out = Vec::new();
        grid.query_into(&mut out, 10.0, 10.0, 5.0, 0, &positions);
        assert!(out.is_empty());
    }

    #[test]
    fn query_respects_toroidal_wrap() {
        let positions = vec![(1.0, 50.0), (99.0, 50.0)];
        let mut grid = SpatialGrid::new(100.0, 100.0, 10.0);
        grid.rebuild(&positions, |_| true);
        let mut out = Vec::new();
        grid.query_into(&mut out, 1.0, 50.0, 5.0, 0, &positions);
        assert_eq!(out.len(), 1, "the seam-adjacent neighbor should be found");
    }

    #[test]
    fn query_caps_at_max_results() {
        let positions: Vec<(f64, f64)> = (0..300).map(|i| (50.0 + (i % 3) as f64, 50.0)).collect();
        let mut grid = SpatialGrid::new(200.0, 200.0, 25.0);
        grid.rebuild(&positions, |_| true);
        let mut out = Vec::new();
        grid.query_into(&mut out, 50.0, 50.0, 50.0, u32::MAX, &positions);
        assert!(out.len() <= SpatialGrid::MAX_QUERY_RESULTS);
    }

    #[test]
    fn rebuild_can_exclude_entities() {
        let positions = vec![(10.0, 10.0), (12.0, 10.0)];
        let mut grid = SpatialGrid::new(100.0, 100.0, 10.0);
        grid.rebuild(&positions, |idx| idx != 1);
        let mut out = Vec::new();
        grid.query_into(&mut out, 10.0, 10.0, 5.0, u32::MAX, &positions);
        assert!(out.is_empty());
    }
}
