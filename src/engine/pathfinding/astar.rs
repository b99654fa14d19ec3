use bevy::prelude::*;
use fixedbitset::FixedBitSet;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use wayfarer_macros::profile;
use crate::engine::config::NavConfig;
use super::grid::RegionGrid;
use super::types::{polyline_length, Cell, PathEdge, RegionId, CELL_SIZE};
use super::walkability::Walkability;

const NO_PARENT: u32 = u32::MAX;

/// Straight-line distance between two cell centres in world units.
///
/// Admissible: every step costs at least the distance it covers.
pub(super) fn heuristic(a: Cell, b: Cell) -> f32 {
    let dx = a.x.abs_diff(b.x) as f32;
    let dy = a.y.abs_diff(b.y) as f32;
    (dx * dx + dy * dy).sqrt() * CELL_SIZE
}

/// Open-set entry. Lowest `f` first; equal `f` resolves to the entry pushed
/// first (`seq`), which keeps the search output deterministic.
#[derive(Clone, Copy, Debug)]
struct State {
    f: f32,
    seq: u64,
    index: usize,
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other.f.total_cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

/// Shortest walk between two points of one region.
///
/// Returns `None` when both points resolve to the same cell (nothing to do) and
/// when the end is unreachable; [`Walkability::reachable`] tells the two apart.
/// Points on blocked cells snap to the nearest walkable cell within
/// `config.snap_radius` first.
#[profile]
pub fn find_path(
    walkability: &Walkability,
    region: &RegionId,
    start: Vec2,
    end: Vec2,
    config: &NavConfig,
) -> Option<PathEdge> {
    let grid = walkability.grid();
    let start_cell = grid.world_to_cell(start);
    let end_cell = grid.world_to_cell(end);
    if start_cell == end_cell {
        return None;
    }

    let from = walkability.nearest_walkable(start_cell, config.snap_radius)?;
    let to = walkability.nearest_walkable(end_cell, config.snap_radius)?;
    if from == to {
        return None;
    }

    let cells = find_cell_path(walkability, from, to, config)?;
    let waypoints = simplify(grid, &cells, start, end);
    let cost = polyline_length(&waypoints);

    debug!(
        "[ASTAR] `{}` ({:.1}, {:.1}) -> ({:.1}, {:.1}): {} cells, {} waypoints, cost {:.1}",
        region, start.x, start.y, end.x, end.y, cells.len(), waypoints.len(), cost
    );

    Some(PathEdge { region: region.clone(), waypoints, cost })
}

/// Raw A* over the raster. Returns every visited cell from `start` to `goal` inclusive.
pub(super) fn find_cell_path(
    walkability: &Walkability,
    start: Cell,
    goal: Cell,
    config: &NavConfig,
) -> Option<Vec<Cell>> {
    let grid = walkability.grid();
    let cell_count = grid.cell_count();
    let start_idx = grid.get_index(start);
    let goal_idx = grid.get_index(goal);

    let mut g_score = vec![f32::INFINITY; cell_count];
    let mut came_from = vec![NO_PARENT; cell_count];
    let mut closed = FixedBitSet::with_capacity(cell_count);
    let mut open_set = BinaryHeap::new();
    let mut seq: u64 = 0;
    let mut expansions: usize = 0;

    g_score[start_idx] = 0.0;
    open_set.push(State { f: heuristic(start, goal), seq, index: start_idx });

    while let Some(State { index: current_idx, .. }) = open_set.pop() {
        if closed.contains(current_idx) {
            continue;
        }
        closed.insert(current_idx);
        expansions += 1;

        if current_idx == goal_idx {
            if expansions > config.search_warn_expansions {
                warn!("[ASTAR] Search from {:?} to {:?} expanded {} cells (high!)", start, goal, expansions);
            }
            return Some(reconstruct_path(grid, &came_from, goal_idx));
        }

        let current = grid.cell_at(current_idx);
        let current_g = g_score[current_idx];

        for (neighbor, step_cost) in walkability.neighbors(current) {
            let n_idx = grid.get_index(neighbor);
            if closed.contains(n_idx) {
                continue;
            }

            let tentative_g = current_g + step_cost;
            if tentative_g < g_score[n_idx] {
                g_score[n_idx] = tentative_g;
                came_from[n_idx] = current_idx as u32;
                seq += 1;
                open_set.push(State {
                    f: tentative_g + heuristic(neighbor, goal),
                    seq,
                    index: n_idx,
                });
            }
        }
    }

    if expansions > config.search_warn_expansions {
        warn!("[ASTAR] Exhausted {} cells without reaching {:?} from {:?}", expansions, goal, start);
    }
    None
}

fn reconstruct_path(grid: &RegionGrid, came_from: &[u32], goal_idx: usize) -> Vec<Cell> {
    let mut path = vec![grid.cell_at(goal_idx)];
    let mut current = goal_idx;

    while came_from[current] != NO_PARENT {
        current = came_from[current] as usize;
        path.push(grid.cell_at(current));
    }

    path.reverse();
    path
}

/// Collapse straight runs of cells into their turning points.
///
/// The exact request points replace the first and last cell centres.
pub(super) fn simplify(grid: &RegionGrid, cells: &[Cell], start: Vec2, end: Vec2) -> Vec<Vec2> {
    let mut waypoints = vec![start];

    for window in cells.windows(3) {
        let incoming = step(window[0], window[1]);
        let outgoing = step(window[1], window[2]);
        if incoming != outgoing {
            waypoints.push(grid.cell_to_world(window[1]));
        }
    }

    waypoints.push(end);
    waypoints
}

fn step(a: Cell, b: Cell) -> (isize, isize) {
    (b.x as isize - a.x as isize, b.y as isize - a.y as isize)
}
