//! Error taxonomy.
//!
//! Two families, matching when they can happen:
//!
//! - [`WorldError`]: building the world model from static data. Always fatal;
//!   a [`NavWorld`](super::world::NavWorld) is never handed out half-built.
//! - [`InvalidLocation`]: a request named a region or coordinate the world does
//!   not have. Reported per request.
//!
//! "No route" is neither: it is an ordinary `None` / empty route.

use bevy::math::Vec2;
use thiserror::Error;
use crate::engine::pathfinding::RegionId;
use crate::engine::routing::ConnectorKind;

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("region `{region}` has malformed geometry: {reason}")]
    MalformedGeometry { region: RegionId, reason: String },

    #[error("region `{0}` is defined more than once")]
    DuplicateRegion(RegionId),

    #[error("{kind:?} connector #{index} references unknown region `{region}`")]
    DanglingConnector { index: usize, kind: ConnectorKind, region: RegionId },

    #[error("{kind:?} connector #{index} is invalid: {reason}")]
    InvalidConnector { index: usize, kind: ConnectorKind, reason: String },

    #[error("world snapshot version {found} is not supported (expected {expected})")]
    SnapshotVersion { found: u32, expected: u32 },

    #[error("failed to read world data: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse world data: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("failed to encode or decode world snapshot: {0}")]
    Snapshot(#[from] bincode::Error),
}

impl WorldError {
    pub(crate) fn geometry(region: &RegionId, reason: impl Into<String>) -> Self {
        WorldError::MalformedGeometry { region: region.clone(), reason: reason.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidLocation {
    #[error("unknown region `{0}`")]
    UnknownRegion(RegionId),

    #[error("coordinate ({}, {}) in `{region}` is not a finite number", .position.x, .position.y)]
    NonFinite { region: RegionId, position: Vec2 },

    #[error("coordinate ({}, {}) is {distance:.1} units outside region `{region}`", .position.x, .position.y)]
    OutOfBounds { region: RegionId, position: Vec2, distance: f32 },
}
