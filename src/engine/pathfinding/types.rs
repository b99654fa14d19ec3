use bevy::math::Vec2;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

/// Side length of one walkability cell in world units.
///
/// Shared by every region. Agents in the source worlds have a collision box of
/// roughly this size, so one cell is the finest distinction worth searching.
pub const CELL_SIZE: f32 = 8.0;

/// Cost of a diagonal step between cell centres.
pub const DIAGONAL_COST: f32 = CELL_SIZE * std::f32::consts::SQRT_2;

/// Identifier of a region ("map"), e.g. `"main"` or `"halloween"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub String);

impl RegionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A point in a specific region. The universal input/output unit of the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub region: RegionId,
    pub position: Vec2,
}

impl Location {
    pub fn new(region: impl Into<RegionId>, x: f32, y: f32) -> Self {
        Self {
            region: region.into(),
            position: Vec2::new(x, y),
        }
    }

    pub fn at(region: RegionId, position: Vec2) -> Self {
        Self { region, position }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:.1}, {:.1})", self.region, self.position.x, self.position.y)
    }
}

/// Discrete (column, row) position in one region's raster.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, PartialOrd, Ord)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

impl Cell {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance, i.e. the number of king moves between two cells.
    pub fn chebyshev(&self, other: Cell) -> usize {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

/// An intra-region walk: ordered waypoints plus their polyline length.
///
/// Never empty. The first waypoint is the requested start point and the last is
/// the requested end point; everything in between is a cell centre at a turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathEdge {
    pub region: RegionId,
    #[serde(deserialize_with = "non_empty_waypoints")]
    pub waypoints: Vec<Vec2>,
    pub cost: f32,
}

fn non_empty_waypoints<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Vec2>, D::Error> {
    let waypoints = Vec::<Vec2>::deserialize(deserializer)?;
    if waypoints.is_empty() {
        return Err(de::Error::invalid_length(0, &"at least one waypoint"));
    }
    Ok(waypoints)
}

impl PathEdge {
    pub fn start(&self) -> Vec2 {
        self.waypoints[0]
    }

    pub fn end(&self) -> Vec2 {
        self.waypoints[self.waypoints.len() - 1]
    }
}

/// Total length of a polyline.
pub(super) fn polyline_length(points: &[Vec2]) -> f32 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Step directions on the raster (cardinal + diagonal).
///
/// The order of [`Direction::ALL`] is the neighbour expansion order, which the
/// pathfinder's tie-breaking relies on for deterministic output.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North = 0,
    South = 1,
    East = 2,
    West = 3,
    NorthEast = 4,
    NorthWest = 5,
    SouthEast = 6,
    SouthWest = 7,
}

impl Direction {
    /// All eight directions (cardinal first, then diagonal)
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::SouthEast,
        Direction::SouthWest,
    ];

    /// (dx, dy) in cells; +y is north
    #[inline]
    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::North => (0, 1),
            Direction::South => (0, -1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
            Direction::NorthEast => (1, 1),
            Direction::NorthWest => (-1, 1),
            Direction::SouthEast => (1, -1),
            Direction::SouthWest => (-1, -1),
        }
    }

    #[inline]
    pub fn is_diagonal(self) -> bool {
        self as u8 >= 4
    }
}
