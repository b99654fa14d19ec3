use bevy::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::engine::config::NavConfig;
use crate::engine::error::WorldError;
use crate::engine::map::ConnectorData;
use crate::engine::math::Bounds;
use crate::engine::pathfinding::{Location, RegionId};

/// What kind of fixed link a connector is. Only affects the default cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectorKind {
    /// Walk-through door between adjoining regions
    Door,
    /// Teleport pad or transporter
    Teleport,
    /// Known shortcut, usually much cheaper than the distance it skips
    Shortcut,
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectorKind::Door => "door",
            ConnectorKind::Teleport => "teleport",
            ConnectorKind::Shortcut => "shortcut",
        };
        f.write_str(name)
    }
}

/// Index of a directed arc in the [`ConnectorGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectorId(pub u32);

/// One directed connector arc.
///
/// A bidirectional authored connector becomes two arcs with the same cost;
/// both carry `bidirectional = true` and point at each other via `mirror`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Connector {
    pub id: ConnectorId,
    pub kind: ConnectorKind,
    pub name: Option<String>,
    pub from: Location,
    pub to: Location,
    pub cost: f32,
    pub bidirectional: bool,
    pub mirror: Option<ConnectorId>,
}

/// Static inter-region graph: regions are nodes, connectors are arcs.
///
/// Built once from the authored connector list and never mutated. Arcs are
/// numbered in authoring order (a bidirectional connector's mirror directly
/// follows it) and that numbering is the stable order used for tie-breaks.
#[derive(Clone, Debug, Default)]
pub struct ConnectorGraph {
    connectors: Vec<Connector>,
    /// Region -> arcs whose source lies in it, ascending id
    outgoing: FxHashMap<RegionId, Vec<ConnectorId>>,
}

impl ConnectorGraph {
    /// Validate and index the authored connectors.
    ///
    /// `regions` maps every known region to its bounds; any endpoint naming
    /// another region is a dangling reference.
    pub fn build(
        data: &[ConnectorData],
        regions: &FxHashMap<RegionId, Bounds>,
        config: &NavConfig,
    ) -> Result<Self, WorldError> {
        let mut graph = ConnectorGraph::default();

        for (index, authored) in data.iter().enumerate() {
            validate(index, authored, regions)?;

            let cost = authored.cost.unwrap_or_else(|| config.connector_cost(authored.kind));
            let forward = ConnectorId(graph.connectors.len() as u32);
            let backward = authored.bidirectional.then(|| ConnectorId(forward.0 + 1));

            graph.connectors.push(Connector {
                id: forward,
                kind: authored.kind,
                name: authored.name.clone(),
                from: authored.from.clone(),
                to: authored.to.clone(),
                cost,
                bidirectional: authored.bidirectional,
                mirror: backward,
            });

            if let Some(backward) = backward {
                graph.connectors.push(Connector {
                    id: backward,
                    kind: authored.kind,
                    name: authored.name.clone(),
                    from: authored.to.clone(),
                    to: authored.from.clone(),
                    cost,
                    bidirectional: true,
                    mirror: Some(forward),
                });
            }
        }

        for connector in &graph.connectors {
            graph.outgoing.entry(connector.from.region.clone()).or_default().push(connector.id);
        }

        info!(
            "[CONNECTORS] Built graph: {} authored connectors -> {} arcs across {} source regions",
            data.len(), graph.connectors.len(), graph.outgoing.len()
        );

        Ok(graph)
    }

    pub fn get(&self, id: ConnectorId) -> &Connector {
        &self.connectors[id.0 as usize]
    }

    /// Arcs leaving `region`, in stable order.
    pub fn outgoing(&self, region: &RegionId) -> &[ConnectorId] {
        self.outgoing.get(region).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Arcs going directly from region `a` to region `b`.
    pub fn between<'a>(&'a self, a: &'a RegionId, b: &'a RegionId) -> impl Iterator<Item = &'a Connector> + 'a {
        self.outgoing(a).iter().map(|&id| self.get(id)).filter(move |c| c.to.region == *b)
    }

    /// Every connector endpoint that lies in `region` (sources and destinations).
    pub fn endpoints_in(&self, region: &RegionId) -> Vec<Vec2> {
        self.connectors
            .iter()
            .flat_map(|c| [&c.from, &c.to])
            .filter(|location| location.region == *region)
            .map(|location| location.position)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connector> {
        self.connectors.iter()
    }

    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }
}

fn validate(
    index: usize,
    authored: &ConnectorData,
    regions: &FxHashMap<RegionId, Bounds>,
) -> Result<(), WorldError> {
    let kind = authored.kind;
    let invalid = |reason: String| WorldError::InvalidConnector { index, kind, reason };

    for endpoint in [&authored.from, &authored.to] {
        let Some(bounds) = regions.get(&endpoint.region) else {
            return Err(WorldError::DanglingConnector { index, kind, region: endpoint.region.clone() });
        };
        if !endpoint.position.is_finite() {
            return Err(invalid(format!("endpoint {} is not finite", endpoint)));
        }
        if !bounds.contains(endpoint.position) {
            return Err(invalid(format!("endpoint {} lies outside its region", endpoint)));
        }
    }

    if let Some(cost) = authored.cost {
        if !cost.is_finite() || cost < 0.0 {
            return Err(invalid(format!("cost {} must be a finite, non-negative number", cost)));
        }
    }

    if authored.from == authored.to {
        return Err(invalid(format!("connects {} to itself", authored.from)));
    }

    Ok(())
}
