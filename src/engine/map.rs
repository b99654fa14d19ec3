//! Static world description: region geometry and authored connectors.
//!
//! World data is authored in RON and can be frozen into a compressed, versioned
//! snapshot for faster startup. Neither form is ever reloaded at runtime.

use bevy::prelude::*;
use serde::{Serialize, Deserialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use flate2::write::ZlibEncoder;
use flate2::read::ZlibDecoder;
use flate2::Compression;
use crate::engine::error::WorldError;
use crate::engine::math::{Bounds, LineSegment, Polygon};
use crate::engine::pathfinding::{Location, RegionId};
use crate::engine::routing::ConnectorKind;

pub const WORLD_DATA_VERSION: u32 = 1;

/// Everything needed to build a [`NavWorld`](super::world::NavWorld).
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct WorldData {
    pub regions: Vec<RegionData>,
    #[serde(default)]
    pub connectors: Vec<ConnectorData>,
}

/// Raw geometry of one region.
///
/// `x_lines` are vertical walls `(x, y1, y2)` and `y_lines` horizontal walls
/// `(y, x1, x2)`, the compact form most map exports use. `walls` takes any
/// other impassable segment.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RegionData {
    pub id: RegionId,
    pub min: Vec2,
    pub max: Vec2,
    #[serde(default)]
    pub x_lines: Vec<(f32, f32, f32)>,
    #[serde(default)]
    pub y_lines: Vec<(f32, f32, f32)>,
    #[serde(default)]
    pub walls: Vec<LineSegment>,
    /// Segments that may only be crossed from their left side to their right side
    #[serde(default)]
    pub one_way: Vec<LineSegment>,
    /// When non-empty, only cells whose centre lies inside one of these are walkable
    #[serde(default)]
    pub walkable_areas: Vec<Polygon>,
    #[serde(default)]
    pub blocked_areas: Vec<Polygon>,
    #[serde(default)]
    pub spawns: Vec<Vec2>,
}

impl RegionData {
    /// An open rectangular region with no obstacles.
    pub fn open(id: impl Into<RegionId>, min: Vec2, max: Vec2) -> Self {
        Self {
            id: id.into(),
            min,
            max,
            x_lines: Vec::new(),
            y_lines: Vec::new(),
            walls: Vec::new(),
            one_way: Vec::new(),
            walkable_areas: Vec::new(),
            blocked_areas: Vec::new(),
            spawns: Vec::new(),
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.min, self.max)
    }

    /// All impassable segments, with the axis-aligned shorthands expanded.
    pub fn impassable_segments(&self) -> impl Iterator<Item = LineSegment> + '_ {
        let vertical = self.x_lines.iter().map(|&(x, y1, y2)| {
            LineSegment::new(Vec2::new(x, y1), Vec2::new(x, y2))
        });
        let horizontal = self.y_lines.iter().map(|&(y, x1, x2)| {
            LineSegment::new(Vec2::new(x1, y), Vec2::new(x2, y))
        });
        vertical.chain(horizontal).chain(self.walls.iter().copied())
    }
}

/// One authored link between two regions.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ConnectorData {
    pub kind: ConnectorKind,
    #[serde(default)]
    pub name: Option<String>,
    pub from: Location,
    pub to: Location,
    /// Falls back to the per-kind default in [`NavConfig`](super::config::NavConfig)
    #[serde(default)]
    pub cost: Option<f32>,
    #[serde(default)]
    pub bidirectional: bool,
}

impl ConnectorData {
    pub fn new(kind: ConnectorKind, from: Location, to: Location) -> Self {
        Self { kind, name: None, from, to, cost: None, bidirectional: false }
    }

    pub fn with_cost(mut self, cost: f32) -> Self {
        self.cost = Some(cost);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn bidirectional(mut self) -> Self {
        self.bidirectional = true;
        self
    }
}

impl WorldData {
    pub fn from_ron_str(source: &str) -> Result<Self, WorldError> {
        Ok(ron::from_str(source)?)
    }

    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, WorldError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let data = Self::from_ron_str(&contents)?;
        info!(
            "[WORLD] Loaded {} regions and {} connectors from {}",
            data.regions.len(), data.connectors.len(), path.display()
        );
        Ok(data)
    }
}

#[derive(Serialize, Deserialize)]
struct WorldSnapshot {
    version: u32,
    data: WorldData,
}

/// Write `data` as a zlib-compressed bincode snapshot.
pub fn save_snapshot(path: impl AsRef<Path>, data: &WorldData) -> Result<(), WorldError> {
    let file = File::create(path.as_ref())?;
    let writer = BufWriter::new(file);
    let mut encoder = ZlibEncoder::new(writer, Compression::default());
    let snapshot = WorldSnapshot { version: WORLD_DATA_VERSION, data: data.clone() };
    bincode::serialize_into(&mut encoder, &snapshot)?;
    encoder.finish()?;
    info!("[SNAPSHOT] Saved world snapshot v{} to {}", WORLD_DATA_VERSION, path.as_ref().display());
    Ok(())
}

pub fn load_snapshot(path: impl AsRef<Path>) -> Result<WorldData, WorldError> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);
    let mut decoder = ZlibDecoder::new(reader);
    let snapshot: WorldSnapshot = bincode::deserialize_from(&mut decoder)?;

    if snapshot.version != WORLD_DATA_VERSION {
        return Err(WorldError::SnapshotVersion {
            found: snapshot.version,
            expected: WORLD_DATA_VERSION,
        });
    }

    info!("[SNAPSHOT] Loaded world snapshot v{} from {}", snapshot.version, path.as_ref().display());
    Ok(snapshot.data)
}
