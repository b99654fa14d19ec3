use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::engine::routing::ConnectorKind;

/// Tunables for building and searching the world model.
///
/// Loaded once at startup alongside the world data. Changing these requires a
/// rebuild of the [`NavWorld`](super::world::NavWorld); the cell size is not
/// configurable because every raster shares it.
#[derive(Resource, Deserialize, Serialize, Clone, Debug)]
#[serde(default)]
pub struct NavConfig {
    // Connector costs used when the authored connector has none
    pub door_cost: f32,
    pub teleport_cost: f32,
    pub shortcut_cost: f32,

    /// How far outside a region (world units) a request may be before it is
    /// rejected instead of clamped
    pub bounds_tolerance: f32,
    /// Radius (cells) searched for a walkable cell when a point sits on a blocked one
    pub snap_radius: usize,
    /// 8-connected search when true, 4-connected otherwise
    pub diagonal_moves: bool,
    /// A* expansions above which a search is logged as pathological
    pub search_warn_expansions: usize,
}

impl NavConfig {
    /// Default cost for a connector of `kind`.
    pub fn connector_cost(&self, kind: ConnectorKind) -> f32 {
        match kind {
            ConnectorKind::Door => self.door_cost,
            ConnectorKind::Teleport => self.teleport_cost,
            ConnectorKind::Shortcut => self.shortcut_cost,
        }
    }

    /// Read configuration from a RON file, falling back to defaults on any failure.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        match std::fs::read_to_string(path) {
            Ok(contents) => match ron::from_str::<NavConfig>(&contents) {
                Ok(config) => {
                    info!("[CONFIG] Loaded navigation config from {}", path.display());
                    config
                }
                Err(e) => {
                    error!("[CONFIG] Failed to parse {}: {}", path.display(), e);
                    error!("[CONFIG] Using default NavConfig");
                    NavConfig::default()
                }
            },
            Err(e) => {
                error!("[CONFIG] Failed to read {}: {}", path.display(), e);
                error!("[CONFIG] Using default NavConfig");
                NavConfig::default()
            }
        }
    }
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            door_cost: 10.0,
            teleport_cost: 40.0,
            shortcut_cost: 1.0,
            bounds_tolerance: 64.0,
            snap_radius: 2,
            diagonal_moves: true,
            search_warn_expansions: 50_000,
        }
    }
}
