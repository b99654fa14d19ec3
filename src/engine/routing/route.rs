use serde::{Deserialize, Serialize};
use std::fmt;
use crate::engine::pathfinding::{Location, PathEdge, RegionId};
use super::connectors::{Connector, ConnectorId, ConnectorKind};

/// A connector taken as part of a route.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectorEdge {
    pub id: ConnectorId,
    pub kind: ConnectorKind,
    pub name: Option<String>,
    pub from: Location,
    pub to: Location,
    pub cost: f32,
}

impl From<&Connector> for ConnectorEdge {
    fn from(connector: &Connector) -> Self {
        Self {
            id: connector.id,
            kind: connector.kind,
            name: connector.name.clone(),
            from: connector.from.clone(),
            to: connector.to.clone(),
            cost: connector.cost,
        }
    }
}

/// One leg of a [`Route`]: a walk inside a region or a jump through a connector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Edge {
    Walk(PathEdge),
    Connector(ConnectorEdge),
}

impl Edge {
    pub fn start(&self) -> Location {
        match self {
            Edge::Walk(walk) => Location::at(walk.region.clone(), walk.start()),
            Edge::Connector(connector) => connector.from.clone(),
        }
    }

    pub fn end(&self) -> Location {
        match self {
            Edge::Walk(walk) => Location::at(walk.region.clone(), walk.end()),
            Edge::Connector(connector) => connector.to.clone(),
        }
    }

    pub fn cost(&self) -> f32 {
        match self {
            Edge::Walk(walk) => walk.cost,
            Edge::Connector(connector) => connector.cost,
        }
    }

    /// One-line human readable summary (same as `Display`).
    pub fn describe(&self) -> String {
        self.to_string()
    }

    pub fn is_connector(&self) -> bool {
        matches!(self, Edge::Connector(_))
    }

    pub fn as_walk(&self) -> Option<&PathEdge> {
        match self {
            Edge::Walk(walk) => Some(walk),
            Edge::Connector(_) => None,
        }
    }

    pub fn as_connector(&self) -> Option<&ConnectorEdge> {
        match self {
            Edge::Walk(_) => None,
            Edge::Connector(connector) => Some(connector),
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::Walk(walk) => write!(
                f,
                "walk in `{}` through {} waypoints ({:.1})",
                walk.region, walk.waypoints.len(), walk.cost
            ),
            Edge::Connector(connector) => {
                write!(f, "{}", connector.kind)?;
                if let Some(name) = &connector.name {
                    write!(f, " \"{}\"", name)?;
                }
                write!(f, " {} -> {} ({:.1})", connector.from, connector.to, connector.cost)
            }
        }
    }
}

/// Ordered legs from a start location to a goal location.
///
/// Consecutive edges chain: each edge ends where the next one starts. An empty
/// route means there was nothing to do or no way to get there; use
/// [`RoutePlan`] when the two need telling apart.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub edges: Vec<Edge>,
}

impl Route {
    pub fn new(edges: Vec<Edge>) -> Self {
        Self { edges }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn total_cost(&self) -> f32 {
        self.edges.iter().map(Edge::cost).sum()
    }

    pub fn connector_count(&self) -> usize {
        self.edges.iter().filter(|e| e.is_connector()).count()
    }

    pub fn start(&self) -> Option<Location> {
        self.edges.first().map(Edge::start)
    }

    pub fn end(&self) -> Option<Location> {
        self.edges.last().map(Edge::end)
    }

    /// Every point an agent moves through, in order, without consecutive repeats.
    pub fn waypoints(&self) -> Vec<Location> {
        let mut points: Vec<Location> = Vec::new();
        let mut push = |location: Location| {
            if points.last() != Some(&location) {
                points.push(location);
            }
        };

        for edge in &self.edges {
            match edge {
                Edge::Walk(walk) => {
                    for &point in &walk.waypoints {
                        push(Location::at(walk.region.clone(), point));
                    }
                }
                Edge::Connector(connector) => {
                    push(connector.from.clone());
                    push(connector.to.clone());
                }
            }
        }
        points
    }

    /// Regions visited, in order, without consecutive repeats.
    pub fn regions(&self) -> Vec<RegionId> {
        let mut regions: Vec<RegionId> = Vec::new();
        for location in self.edges.iter().flat_map(|e| [e.start(), e.end()]) {
            if regions.last() != Some(&location.region) {
                regions.push(location.region);
            }
        }
        regions
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.edges.is_empty() {
            return f.write_str("(empty route)");
        }
        for (i, edge) in self.edges.iter().enumerate() {
            writeln!(f, "{:>3}. {}", i + 1, edge)?;
        }
        write!(
            f,
            "total cost {:.1} over {} edges, {} connectors",
            self.total_cost(), self.len(), self.connector_count()
        )
    }
}

/// Outcome of a route request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "route", rename_all = "snake_case")]
pub enum RoutePlan {
    /// Start and goal resolve to the same spot
    AlreadyThere,
    Found(Route),
    Unreachable,
}

impl RoutePlan {
    /// True unless the goal cannot be reached.
    pub fn is_reachable(&self) -> bool {
        !matches!(self, RoutePlan::Unreachable)
    }

    pub fn route(&self) -> Option<&Route> {
        match self {
            RoutePlan::Found(route) => Some(route),
            _ => None,
        }
    }

    /// Collapse to a plain route; both non-found outcomes become empty.
    pub fn into_route(self) -> Route {
        match self {
            RoutePlan::Found(route) => route,
            RoutePlan::AlreadyThere | RoutePlan::Unreachable => Route::empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::math::Vec2;

    fn sample_route() -> Route {
        let walk_a = PathEdge {
            region: RegionId::from("a"),
            waypoints: vec![Vec2::new(0.0, 0.0), Vec2::new(30.0, 40.0)],
            cost: 50.0,
        };
        let door = ConnectorEdge {
            id: ConnectorId(0),
            kind: ConnectorKind::Door,
            name: Some("gate".to_string()),
            from: Location::new("a", 30.0, 40.0),
            to: Location::new("b", 4.0, 4.0),
            cost: 10.0,
        };
        let walk_b = PathEdge {
            region: RegionId::from("b"),
            waypoints: vec![Vec2::new(4.0, 4.0), Vec2::new(4.0, 24.0)],
            cost: 20.0,
        };
        Route::new(vec![Edge::Walk(walk_a), Edge::Connector(door), Edge::Walk(walk_b)])
    }

    #[test]
    fn test_route_summaries() {
        let route = sample_route();
        assert_eq!(route.len(), 3);
        assert_eq!(route.total_cost(), 80.0);
        assert_eq!(route.connector_count(), 1);
        assert_eq!(route.start(), Some(Location::new("a", 0.0, 0.0)));
        assert_eq!(route.end(), Some(Location::new("b", 4.0, 24.0)));
        assert_eq!(route.regions(), vec![RegionId::from("a"), RegionId::from("b")]);
    }

    #[test]
    fn test_waypoints_skip_repeats_at_joins() {
        let points = sample_route().waypoints();
        assert_eq!(points.len(), 4);
        assert_eq!(points[1], Location::new("a", 30.0, 40.0));
        assert_eq!(points[2], Location::new("b", 4.0, 4.0));
    }

    #[test]
    fn test_edges_chain() {
        let route = sample_route();
        for pair in route.edges().windows(2) {
            assert_eq!(pair[0].end(), pair[1].start());
        }
    }

    #[test]
    fn test_display_mentions_connector_name() {
        let text = sample_route().to_string();
        assert!(text.contains("door \"gate\""), "unexpected rendering:\n{}", text);
        assert!(text.contains("total cost 80.0"));
        assert_eq!(Route::empty().to_string(), "(empty route)");
    }

    #[test]
    fn test_plan_collapses_to_route() {
        assert!(RoutePlan::AlreadyThere.into_route().is_empty());
        assert!(RoutePlan::Unreachable.into_route().is_empty());
        assert!(!RoutePlan::Unreachable.is_reachable());
        assert!(RoutePlan::AlreadyThere.is_reachable());
        assert_eq!(RoutePlan::Found(sample_route()).into_route().len(), 3);
    }

    #[test]
    fn test_walk_without_waypoints_is_rejected() {
        let json = r#"{"edges":[{"type":"walk","region":"a","waypoints":[],"cost":0.0}]}"#;
        let err = serde_json::from_str::<Route>(json).unwrap_err();
        assert!(err.to_string().contains("at least one waypoint"), "unexpected error: {}", err);

        let json = r#"{"edges":[{"type":"walk","region":"a","waypoints":[[1.0,2.0]],"cost":0.0}]}"#;
        let route: Route = serde_json::from_str(json).unwrap();
        assert_eq!(route.regions(), vec![RegionId::from("a")]);
        assert_eq!(route.start(), route.end());
    }
}
