use bevy::math::Vec2;
use crate::engine::config::NavConfig;
use crate::engine::map::{ConnectorData, RegionData, WorldData};
use crate::engine::pathfinding::Location;
use crate::engine::world::NavWorld;
use super::*;

fn build(regions: Vec<RegionData>, connectors: Vec<ConnectorData>) -> NavWorld {
    NavWorld::build(WorldData { regions, connectors }, NavConfig::default()).expect("test world should build")
}

fn room(id: &str) -> RegionData {
    RegionData::open(id, Vec2::ZERO, Vec2::splat(160.0))
}

/// Every edge must end where the next one begins.
fn assert_chained(route: &Route) {
    for pair in route.edges().windows(2) {
        assert_eq!(pair[0].end(), pair[1].start(), "edges do not chain:\n{}", route);
    }
}

#[test]
fn test_same_region_uses_direct_walk() {
    let world = build(
        vec![room("a"), room("b")],
        vec![ConnectorData::new(ConnectorKind::Door, Location::new("a", 150.0, 80.0), Location::new("b", 10.0, 80.0))],
    );

    let route = world.find_route(&Location::new("a", 10.0, 10.0), &Location::new("a", 130.0, 10.0)).unwrap();
    assert_eq!(route.len(), 1);
    assert_eq!(route.connector_count(), 0);
    assert!((route.total_cost() - 120.0).abs() < 1e-3);
}

#[test]
fn test_identical_and_same_cell_requests_are_already_there() {
    let world = build(vec![room("a")], vec![]);
    let here = Location::new("a", 10.0, 10.0);

    assert_eq!(world.plan(&here, &here).unwrap(), RoutePlan::AlreadyThere);
    assert_eq!(world.plan(&here, &Location::new("a", 12.0, 13.0)).unwrap(), RoutePlan::AlreadyThere);
    assert!(world.find_route(&here, &here).unwrap().is_empty());
}

#[test]
fn test_unreachable_region_is_empty_route() {
    let world = build(vec![room("a"), room("b")], vec![]);
    let start = Location::new("a", 10.0, 10.0);
    let goal = Location::new("b", 10.0, 10.0);

    assert_eq!(world.plan(&start, &goal).unwrap(), RoutePlan::Unreachable);
    assert!(world.find_route(&start, &goal).unwrap().is_empty());
    assert!(!world.is_reachable(&start, &goal).unwrap());
}

#[test]
fn test_single_connector_crossing() {
    let world = build(
        vec![room("a"), room("b")],
        vec![ConnectorData::new(ConnectorKind::Door, Location::new("a", 150.0, 80.0), Location::new("b", 10.0, 80.0))],
    );

    let route = world.find_route(&Location::new("a", 10.0, 80.0), &Location::new("b", 150.0, 80.0)).unwrap();
    assert_eq!(route.len(), 3, "expected walk, door, walk:\n{}", route);
    assert_eq!(route.connector_count(), 1);
    assert!(route.edges()[1].is_connector());
    assert_chained(&route);
    // 140 walk + 10 door + 140 walk
    assert!((route.total_cost() - 290.0).abs() < 1e-3);
}

#[test]
fn test_multi_hop_chain() {
    let world = build(
        vec![room("a"), room("b"), room("c")],
        vec![
            ConnectorData::new(ConnectorKind::Door, Location::new("a", 150.0, 80.0), Location::new("b", 10.0, 80.0))
                .bidirectional(),
            ConnectorData::new(ConnectorKind::Door, Location::new("b", 150.0, 80.0), Location::new("c", 10.0, 80.0))
                .bidirectional(),
        ],
    );

    let route = world.find_route(&Location::new("a", 10.0, 80.0), &Location::new("c", 150.0, 80.0)).unwrap();
    assert_eq!(route.len(), 5);
    assert_eq!(route.connector_count(), 2);
    assert_eq!(route.regions().len(), 3);
    assert_chained(&route);

    // Mirrored arcs carry the way back
    let back = world.find_route(&Location::new("c", 150.0, 80.0), &Location::new("a", 10.0, 80.0)).unwrap();
    assert_eq!(back.connector_count(), 2);
    assert!((back.total_cost() - route.total_cost()).abs() < 1e-3);
}

#[test]
fn test_cheapest_connector_wins() {
    let world = build(
        vec![room("a"), room("b")],
        vec![
            // Cheap door, but far away
            ConnectorData::new(ConnectorKind::Door, Location::new("a", 150.0, 150.0), Location::new("b", 10.0, 10.0)),
            // Expensive teleport right next to the start
            ConnectorData::new(ConnectorKind::Teleport, Location::new("a", 20.0, 20.0), Location::new("b", 10.0, 10.0)),
        ],
    );

    let route = world.find_route(&Location::new("a", 10.0, 10.0), &Location::new("b", 10.0, 10.0)).unwrap();
    let jump = route.edges().iter().find_map(Edge::as_connector).expect("route should use a connector");
    assert_eq!(jump.kind, ConnectorKind::Teleport);
    // The arrival pad is the goal, so there is no final walk
    assert_eq!(route.len(), 2);
}

#[test]
fn test_intra_region_shortcut_crosses_wall() {
    let mut yard = RegionData::open("yard", Vec2::ZERO, Vec2::new(320.0, 160.0));
    yard.x_lines.push((160.0, 0.0, 160.0));
    let world = build(
        vec![yard],
        vec![ConnectorData::new(ConnectorKind::Shortcut, Location::new("yard", 150.0, 80.0), Location::new("yard", 170.0, 80.0))],
    );

    let west = Location::new("yard", 40.0, 80.0);
    let east = Location::new("yard", 280.0, 80.0);

    let route = world.find_route(&west, &east).unwrap();
    assert_eq!(route.len(), 3);
    assert!((route.total_cost() - 221.0).abs() < 1e-3, "unexpected cost {}", route.total_cost());

    // Shortcuts are one-way unless authored otherwise
    assert_eq!(world.plan(&east, &west).unwrap(), RoutePlan::Unreachable);
}

#[test]
fn test_equal_cost_prefers_fewer_connectors() {
    let world = build(
        vec![room("a")],
        vec![
            ConnectorData::new(ConnectorKind::Shortcut, Location::new("a", 4.0, 4.0), Location::new("a", 84.0, 4.0))
                .with_cost(80.0),
        ],
    );

    let route = world.find_route(&Location::new("a", 4.0, 4.0), &Location::new("a", 84.0, 4.0)).unwrap();
    assert_eq!(route.len(), 1);
    assert_eq!(route.connector_count(), 0, "walk and shortcut tie; the walk should win:\n{}", route);
}

#[test]
fn test_strictly_cheaper_connector_replaces_walk() {
    let world = build(
        vec![room("a")],
        vec![
            ConnectorData::new(ConnectorKind::Shortcut, Location::new("a", 4.0, 4.0), Location::new("a", 84.0, 4.0))
                .with_cost(79.0),
        ],
    );

    let route = world.find_route(&Location::new("a", 4.0, 4.0), &Location::new("a", 84.0, 4.0)).unwrap();
    // Both walking legs stay inside one cell, so only the connector remains
    assert_eq!(route.len(), 1);
    assert_eq!(route.connector_count(), 1);
    assert_eq!(route.total_cost(), 79.0);
}

#[test]
fn test_blocked_connector_source_is_skipped() {
    let mut a = room("a");
    // Box the near door in completely
    a.x_lines.push((100.0, 100.0, 160.0));
    a.y_lines.push((100.0, 100.0, 160.0));
    let world = build(
        vec![a, room("b")],
        vec![
            ConnectorData::new(ConnectorKind::Door, Location::new("a", 130.0, 130.0), Location::new("b", 10.0, 10.0))
                .with_cost(0.0),
            ConnectorData::new(ConnectorKind::Teleport, Location::new("a", 20.0, 150.0), Location::new("b", 10.0, 10.0)),
        ],
    );

    let route = world.find_route(&Location::new("a", 10.0, 10.0), &Location::new("b", 50.0, 10.0)).unwrap();
    let jump = route.edges().iter().find_map(Edge::as_connector).expect("route should use a connector");
    assert_eq!(jump.kind, ConnectorKind::Teleport);
}

#[test]
fn test_repeated_plans_are_identical() {
    let world = build(
        vec![room("a"), room("b")],
        vec![
            ConnectorData::new(ConnectorKind::Door, Location::new("a", 150.0, 80.0), Location::new("b", 10.0, 80.0))
                .with_name("left leaf"),
            ConnectorData::new(ConnectorKind::Door, Location::new("a", 150.0, 80.0), Location::new("b", 10.0, 80.0))
                .with_name("right leaf"),
        ],
    );
    let start = Location::new("a", 10.0, 80.0);
    let goal = Location::new("b", 150.0, 80.0);

    let first = world.find_route(&start, &goal).unwrap();
    for _ in 0..5 {
        assert_eq!(world.find_route(&start, &goal).unwrap(), first);
    }
    // Identical doors: the first authored one wins the tie
    let jump = first.edges().iter().find_map(Edge::as_connector).unwrap();
    assert_eq!(jump.id, ConnectorId(0));
    assert_eq!(jump.name.as_deref(), Some("left leaf"));
}
