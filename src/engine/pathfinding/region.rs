use bevy::math::Vec2;
use crate::engine::config::NavConfig;
use crate::engine::error::WorldError;
use crate::engine::map::RegionData;
use crate::engine::math::Bounds;
use crate::engine::routing::ConnectorId;
use super::astar;
use super::grid::RegionGrid;
use super::types::{Cell, Location, PathEdge, RegionId};
use super::walkability::Walkability;

/// A built, immutable region ("map").
#[derive(Clone, Debug)]
pub struct Region {
    id: RegionId,
    walkability: Walkability,
    spawns: Vec<Vec2>,
    /// Connector arcs whose source lies in this region, in authoring order
    connectors: Vec<ConnectorId>,
}

impl Region {
    /// Build from raw data. `markers` are connector endpoints inside this region;
    /// their cells are kept walkable.
    pub fn build(
        data: &RegionData,
        markers: &[Vec2],
        connectors: Vec<ConnectorId>,
        config: &NavConfig,
    ) -> Result<Self, WorldError> {
        let walkability = Walkability::build(data, markers, config.diagonal_moves)?;
        Ok(Self {
            id: data.id.clone(),
            walkability,
            spawns: data.spawns.clone(),
            connectors,
        })
    }

    pub fn id(&self) -> &RegionId {
        &self.id
    }

    pub fn bounds(&self) -> Bounds {
        self.walkability.grid().bounds
    }

    pub fn grid(&self) -> &RegionGrid {
        self.walkability.grid()
    }

    pub fn walkability(&self) -> &Walkability {
        &self.walkability
    }

    /// Default spawn: the first authored spawn point, else the centre of the bounds.
    pub fn spawn(&self) -> Location {
        let position = self.spawns.first().copied().unwrap_or_else(|| self.bounds().center());
        Location::at(self.id.clone(), position)
    }

    /// Outgoing connector arcs.
    pub fn connectors(&self) -> &[ConnectorId] {
        &self.connectors
    }

    pub fn world_to_cell(&self, point: Vec2) -> Cell {
        self.grid().world_to_cell(point)
    }

    pub fn cell_to_world(&self, cell: Cell) -> Vec2 {
        self.grid().cell_to_world(cell)
    }

    pub fn is_walkable_point(&self, point: Vec2) -> bool {
        self.walkability.is_walkable_point(point)
    }

    pub fn same_cell(&self, a: Vec2, b: Vec2) -> bool {
        self.world_to_cell(a) == self.world_to_cell(b)
    }

    /// Both points sit on blocked cells that snap onto the same walkable cell.
    pub fn snaps_together(&self, a: Vec2, b: Vec2, config: &NavConfig) -> bool {
        let from = self.walkability.nearest_walkable(self.world_to_cell(a), config.snap_radius);
        let to = self.walkability.nearest_walkable(self.world_to_cell(b), config.snap_radius);
        from.is_some() && from == to
    }

    /// Intra-region shortest path; see [`astar::find_path`].
    pub fn find_path(&self, start: Vec2, end: Vec2, config: &NavConfig) -> Option<PathEdge> {
        astar::find_path(&self.walkability, &self.id, start, end, config)
    }

    /// Whether `end` can be walked to from `start` (same cell counts as reachable).
    pub fn is_reachable(&self, start: Vec2, end: Vec2, config: &NavConfig) -> bool {
        let from = self.walkability.nearest_walkable(self.world_to_cell(start), config.snap_radius);
        let to = self.walkability.nearest_walkable(self.world_to_cell(end), config.snap_radius);
        match (from, to) {
            (Some(from), Some(to)) => self.walkability.reachable(from, to),
            _ => self.same_cell(start, end),
        }
    }
}
