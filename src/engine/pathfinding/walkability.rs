use bevy::prelude::*;
use fixedbitset::FixedBitSet;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::collections::VecDeque;
use crate::engine::error::WorldError;
use crate::engine::map::RegionData;
use crate::engine::math::{Bounds, LineSegment, Polygon, EPSILON};
use super::grid::RegionGrid;
use super::types::{Cell, Direction, CELL_SIZE, DIAGONAL_COST};

/// Upper bound on raster size (2048 × 2048 cells, i.e. 16k world units square).
pub const MAX_CELLS: usize = 2048 * 2048;

/// Neighbour list for one cell: (cell, step cost).
pub type Neighbors = SmallVec<[(Cell, f32); 8]>;

/// Rasterized walkability of one region.
///
/// # Construction
///
/// 1. **Walls:** every cell whose box touches an impassable segment is blocked
/// 2. **Walkable areas:** if any are given, cells with their centre outside all of them are blocked
/// 3. **Blocked areas:** cells with their centre inside one are blocked
/// 4. **Markers:** connector endpoints force their own cell walkable again
///
/// One-way segments never block a cell. Instead every cell they touch is indexed
/// so [`Walkability::neighbors`] can reject moves that cross them the wrong way.
///
/// Built once and never mutated.
#[derive(Clone, Debug)]
pub struct Walkability {
    grid: RegionGrid,
    /// Set bit = blocked cell
    blocked: FixedBitSet,
    one_way: Vec<LineSegment>,
    /// Cell index -> indices into `one_way`
    one_way_cells: FxHashMap<usize, SmallVec<[u32; 2]>>,
    diagonal_moves: bool,
}

impl Walkability {
    pub fn build(data: &RegionData, markers: &[Vec2], diagonal_moves: bool) -> Result<Self, WorldError> {
        validate(data)?;

        let bounds = data.bounds();
        let needed = RegionGrid::cells_needed(&bounds);
        if needed > MAX_CELLS as f64 {
            return Err(WorldError::geometry(
                &data.id,
                format!("{:.0} cells exceeds the {} cell limit", needed, MAX_CELLS),
            ));
        }
        let grid = RegionGrid::new(bounds);

        let mut blocked = FixedBitSet::with_capacity(grid.cell_count());

        // PHASE 1: impassable segments
        for segment in data.impassable_segments() {
            for_each_touched_cell(&grid, &segment, |idx| blocked.insert(idx));
        }

        // PHASE 2: walkable areas (everything outside is blocked)
        if !data.walkable_areas.is_empty() {
            for idx in 0..grid.cell_count() {
                let centre = grid.cell_to_world(grid.cell_at(idx));
                if !data.walkable_areas.iter().any(|area| area.contains(centre)) {
                    blocked.insert(idx);
                }
            }
        }

        // PHASE 3: blocked areas
        for area in &data.blocked_areas {
            fill_polygon(&grid, area, |idx| blocked.insert(idx));
        }

        // PHASE 4: door/teleport markers stay reachable
        for marker in markers {
            if grid.bounds.contains(*marker) {
                blocked.set(grid.get_index(grid.world_to_cell(*marker)), false);
            }
        }

        let mut one_way_cells: FxHashMap<usize, SmallVec<[u32; 2]>> = FxHashMap::default();
        for (i, segment) in data.one_way.iter().enumerate() {
            for_each_touched_cell(&grid, segment, |idx| {
                one_way_cells.entry(idx).or_default().push(i as u32);
            });
        }

        let walkability = Self {
            grid,
            blocked,
            one_way: data.one_way.clone(),
            one_way_cells,
            diagonal_moves,
        };

        debug!(
            "[WALKABILITY] Region `{}`: {}x{} cells, {} blocked, {} one-way segments",
            data.id,
            walkability.grid.width,
            walkability.grid.height,
            walkability.blocked.count_ones(..),
            walkability.one_way.len()
        );

        Ok(walkability)
    }

    pub fn grid(&self) -> &RegionGrid {
        &self.grid
    }

    #[inline]
    pub fn is_walkable(&self, cell: Cell) -> bool {
        cell.x < self.grid.width && cell.y < self.grid.height && !self.blocked.contains(self.grid.get_index(cell))
    }

    /// True when `point` lies inside the region and its cell is walkable.
    pub fn is_walkable_point(&self, point: Vec2) -> bool {
        self.grid.bounds.contains(point) && self.is_walkable(self.grid.world_to_cell(point))
    }

    pub fn walkable_count(&self) -> usize {
        self.grid.cell_count() - self.blocked.count_ones(..)
    }

    /// Walkable cells reachable from `cell` in one step, with step cost.
    ///
    /// Diagonal steps need both orthogonal cells walkable (no corner cutting).
    /// Order follows [`Direction::ALL`] so searches are deterministic.
    pub fn neighbors(&self, cell: Cell) -> Neighbors {
        let mut result = Neighbors::new();

        for direction in Direction::ALL {
            if direction.is_diagonal() && !self.diagonal_moves {
                continue;
            }

            let (dx, dy) = direction.offset();
            let nx = cell.x as isize + dx;
            let ny = cell.y as isize + dy;
            if !self.grid.in_grid(nx, ny) {
                continue;
            }

            let next = Cell::new(nx as usize, ny as usize);
            if !self.is_walkable(next) {
                continue;
            }

            let cost = if direction.is_diagonal() {
                let side_a = Cell::new(nx as usize, cell.y);
                let side_b = Cell::new(cell.x, ny as usize);
                if !self.is_walkable(side_a) || !self.is_walkable(side_b) {
                    continue;
                }
                DIAGONAL_COST
            } else {
                CELL_SIZE
            };

            if self.crosses_one_way_backwards(cell, next) {
                continue;
            }

            result.push((next, cost));
        }

        result
    }

    /// A move is rejected when it crosses a one-way segment while ending up on
    /// the segment's left side.
    fn crosses_one_way_backwards(&self, from: Cell, to: Cell) -> bool {
        if self.one_way.is_empty() {
            return false;
        }

        let from_idx = self.grid.get_index(from);
        let to_idx = self.grid.get_index(to);
        let candidates = self.one_way_cells.get(&from_idx).into_iter()
            .chain(self.one_way_cells.get(&to_idx))
            .flat_map(|list| list.iter().copied());

        let a = self.grid.cell_to_world(from);
        let b = self.grid.cell_to_world(to);
        let step = LineSegment::new(a, b);

        for seg_idx in candidates {
            let segment = &self.one_way[seg_idx as usize];
            if segment.side(b) > EPSILON && segment.side(a) <= EPSILON && step.intersects(segment) {
                return true;
            }
        }
        false
    }

    /// Closest walkable cell within `radius` rings of `cell` (the cell itself first).
    ///
    /// Ties are broken by scan order (row-major from the ring's low corner) so the
    /// result is deterministic.
    pub fn nearest_walkable(&self, cell: Cell, radius: usize) -> Option<Cell> {
        if self.is_walkable(cell) {
            return Some(cell);
        }

        for ring in 1..=radius as isize {
            let mut best: Option<(usize, Cell)> = None;
            for dy in -ring..=ring {
                for dx in -ring..=ring {
                    if dx.abs() != ring && dy.abs() != ring {
                        continue; // interior, already checked on a smaller ring
                    }
                    let nx = cell.x as isize + dx;
                    let ny = cell.y as isize + dy;
                    if !self.grid.in_grid(nx, ny) {
                        continue;
                    }
                    let candidate = Cell::new(nx as usize, ny as usize);
                    if !self.is_walkable(candidate) {
                        continue;
                    }
                    let dist_sq = (dx * dx + dy * dy) as usize;
                    if best.map_or(true, |(d, _)| dist_sq < d) {
                        best = Some((dist_sq, candidate));
                    }
                }
            }
            if let Some((_, found)) = best {
                return Some(found);
            }
        }
        None
    }

    /// Breadth-first reachability over the same moves the pathfinder uses.
    ///
    /// Honours one-way segments, so `reachable(a, b)` and `reachable(b, a)` may differ.
    pub fn reachable(&self, from: Cell, to: Cell) -> bool {
        if !self.is_walkable(from) || !self.is_walkable(to) {
            return false;
        }
        if from == to {
            return true;
        }

        let mut visited = FixedBitSet::with_capacity(self.grid.cell_count());
        let mut queue = VecDeque::new();
        visited.insert(self.grid.get_index(from));
        queue.push_back(from);

        while let Some(current) = queue.pop_front() {
            for (next, _) in self.neighbors(current) {
                if next == to {
                    return true;
                }
                let idx = self.grid.get_index(next);
                if !visited.contains(idx) {
                    visited.insert(idx);
                    queue.push_back(next);
                }
            }
        }
        false
    }
}

/// Visit the index of every cell whose closed box touches `segment`.
fn for_each_touched_cell(grid: &RegionGrid, segment: &LineSegment, mut visit: impl FnMut(usize)) {
    let (lo, hi) = grid.cells_overlapping(&segment.bounds());
    for y in lo.y..=hi.y {
        for x in lo.x..=hi.x {
            let cell = Cell::new(x, y);
            if segment.intersects_bounds(&grid.cell_bounds(cell)) {
                visit(grid.get_index(cell));
            }
        }
    }
}

/// Visit the index of every cell whose centre lies inside `polygon`.
fn fill_polygon(grid: &RegionGrid, polygon: &Polygon, mut visit: impl FnMut(usize)) {
    let (lo, hi) = grid.cells_overlapping(&polygon.bounds());
    for y in lo.y..=hi.y {
        for x in lo.x..=hi.x {
            let cell = Cell::new(x, y);
            if polygon.contains(grid.cell_to_world(cell)) {
                visit(grid.get_index(cell));
            }
        }
    }
}

fn validate(data: &RegionData) -> Result<(), WorldError> {
    let id = &data.id;

    if id.as_str().is_empty() {
        return Err(WorldError::geometry(id, "region id is empty"));
    }
    if !data.min.is_finite() || !data.max.is_finite() {
        return Err(WorldError::geometry(id, "bounds are not finite"));
    }
    if data.max.x <= data.min.x || data.max.y <= data.min.y {
        return Err(WorldError::geometry(
            id,
            format!("bounds min {:?} must be strictly below max {:?}", data.min, data.max),
        ));
    }

    for segment in data.impassable_segments().chain(data.one_way.iter().copied()) {
        if !segment.start.is_finite() || !segment.end.is_finite() {
            return Err(WorldError::geometry(id, format!("segment {:?} is not finite", segment)));
        }
        if segment.length() <= EPSILON {
            return Err(WorldError::geometry(id, format!("segment {:?} has zero length", segment)));
        }
    }

    for polygon in data.walkable_areas.iter().chain(&data.blocked_areas) {
        if polygon.vertices.len() < 3 {
            return Err(WorldError::geometry(
                id,
                format!("polygon needs at least 3 vertices, got {}", polygon.vertices.len()),
            ));
        }
        if polygon.vertices.iter().any(|v| !v.is_finite()) {
            return Err(WorldError::geometry(id, "polygon vertex is not finite"));
        }
    }

    let bounds = Bounds::new(data.min, data.max);
    for spawn in &data.spawns {
        if !spawn.is_finite() || !bounds.contains(*spawn) {
            return Err(WorldError::geometry(id, format!("spawn {:?} lies outside the region", spawn)));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::pathfinding::RegionId;

    fn open_region(size: f32) -> RegionData {
        RegionData::open("test", Vec2::ZERO, Vec2::splat(size))
    }

    #[test]
    fn test_open_region_is_fully_walkable() {
        let w = Walkability::build(&open_region(80.0), &[], true).unwrap();
        assert_eq!(w.walkable_count(), 100);
        assert_eq!(w.neighbors(Cell::new(5, 5)).len(), 8);
        assert_eq!(w.neighbors(Cell::new(0, 0)).len(), 3);
    }

    #[test]
    fn test_four_connected_when_diagonals_disabled() {
        let w = Walkability::build(&open_region(80.0), &[], false).unwrap();
        let n = w.neighbors(Cell::new(5, 5));
        assert_eq!(n.len(), 4);
        assert!(n.iter().all(|&(_, cost)| cost == CELL_SIZE));
    }

    #[test]
    fn test_vertical_wall_blocks_column() {
        let mut data = open_region(80.0);
        data.x_lines.push((36.0, 0.0, 80.0)); // inside column 4
        let w = Walkability::build(&data, &[], true).unwrap();

        for y in 0..10 {
            assert!(!w.is_walkable(Cell::new(4, y)), "cell (4, {}) should be blocked", y);
            assert!(w.is_walkable(Cell::new(3, y)));
            assert!(w.is_walkable(Cell::new(5, y)));
        }
        assert!(!w.reachable(Cell::new(0, 0), Cell::new(9, 9)));
    }

    #[test]
    fn test_no_corner_cutting() {
        let mut data = open_region(80.0);
        // Block (5, 4) and (4, 5): diagonal from (4, 4) to (5, 5) must be rejected
        data.blocked_areas.push(Polygon::new(vec![
            Vec2::new(40.0, 32.0), Vec2::new(48.0, 32.0), Vec2::new(48.0, 40.0), Vec2::new(40.0, 40.0),
        ]));
        data.blocked_areas.push(Polygon::new(vec![
            Vec2::new(32.0, 40.0), Vec2::new(40.0, 40.0), Vec2::new(40.0, 48.0), Vec2::new(32.0, 48.0),
        ]));
        let w = Walkability::build(&data, &[], true).unwrap();

        assert!(!w.is_walkable(Cell::new(5, 4)));
        assert!(!w.is_walkable(Cell::new(4, 5)));
        let neighbors = w.neighbors(Cell::new(4, 4));
        assert!(!neighbors.iter().any(|(c, _)| *c == Cell::new(5, 5)));
    }

    #[test]
    fn test_walkable_area_limits_raster() {
        let mut data = open_region(80.0);
        data.walkable_areas.push(Polygon::new(vec![
            Vec2::new(0.0, 0.0), Vec2::new(40.0, 0.0), Vec2::new(40.0, 80.0), Vec2::new(0.0, 80.0),
        ]));
        let w = Walkability::build(&data, &[], true).unwrap();
        assert_eq!(w.walkable_count(), 50);
        assert!(w.is_walkable_point(Vec2::new(10.0, 10.0)));
        assert!(!w.is_walkable_point(Vec2::new(60.0, 10.0)));
    }

    #[test]
    fn test_marker_reopens_blocked_cell() {
        let mut data = open_region(80.0);
        data.x_lines.push((36.0, 0.0, 80.0));
        let door = Vec2::new(36.0, 20.0);
        let w = Walkability::build(&data, &[door], true).unwrap();
        assert!(w.is_walkable_point(door));
        assert!(w.reachable(Cell::new(0, 2), Cell::new(9, 2)));
    }

    #[test]
    fn test_one_way_segment_is_directional() {
        let mut data = open_region(80.0);
        // Wall with a one-way gap at y in [24, 56]; heading north, so west is "left".
        data.x_lines.push((36.0, 0.0, 24.0));
        data.x_lines.push((36.0, 56.0, 80.0));
        data.one_way.push(LineSegment::new(Vec2::new(36.0, 24.0), Vec2::new(36.0, 56.0)));
        let w = Walkability::build(&data, &[], true).unwrap();

        let west = Cell::new(1, 5);
        let east = Cell::new(8, 5);
        assert!(w.reachable(west, east), "left-to-right crossing should be allowed");
        assert!(!w.reachable(east, west), "right-to-left crossing should be rejected");
    }

    #[test]
    fn test_nearest_walkable_snaps_off_wall() {
        let mut data = open_region(80.0);
        data.x_lines.push((36.0, 0.0, 80.0));
        let w = Walkability::build(&data, &[], true).unwrap();

        let snapped = w.nearest_walkable(Cell::new(4, 3), 2).unwrap();
        assert_eq!(snapped.chebyshev(Cell::new(4, 3)), 1);
        assert!(w.is_walkable(snapped));
        assert_eq!(w.nearest_walkable(Cell::new(4, 3), 0), None);
    }

    #[test]
    fn test_malformed_geometry_is_rejected() {
        let inverted = RegionData::open("bad", Vec2::splat(10.0), Vec2::ZERO);
        assert!(matches!(
            Walkability::build(&inverted, &[], true),
            Err(WorldError::MalformedGeometry { ref region, .. }) if *region == RegionId::from("bad")
        ));

        let mut degenerate = open_region(80.0);
        degenerate.walls.push(LineSegment::new(Vec2::ONE, Vec2::ONE));
        assert!(Walkability::build(&degenerate, &[], true).is_err());

        let mut triangle_missing = open_region(80.0);
        triangle_missing.blocked_areas.push(Polygon::new(vec![Vec2::ZERO, Vec2::ONE]));
        assert!(Walkability::build(&triangle_missing, &[], true).is_err());

        let mut bad_spawn = open_region(80.0);
        bad_spawn.spawns.push(Vec2::new(500.0, 0.0));
        assert!(Walkability::build(&bad_spawn, &[], true).is_err());

        let huge = RegionData::open("huge", Vec2::ZERO, Vec2::splat(1.0e6));
        assert!(Walkability::build(&huge, &[], true).is_err());

        // Cell counts past usize range must still be a geometry error
        let enormous = RegionData::open("enormous", Vec2::ZERO, Vec2::splat(1.0e30));
        assert!(matches!(
            Walkability::build(&enormous, &[], true),
            Err(WorldError::MalformedGeometry { .. })
        ));
        let wide = RegionData::open("wide", Vec2::splat(-3.0e38), Vec2::splat(3.0e38));
        assert!(matches!(
            Walkability::build(&wide, &[], true),
            Err(WorldError::MalformedGeometry { .. })
        ));
    }
}
