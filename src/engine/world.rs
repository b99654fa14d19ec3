use bevy::prelude::*;
use rustc_hash::FxHashMap;
use std::path::Path;
use wayfarer_macros::profile;
use crate::engine::config::NavConfig;
use crate::engine::error::{InvalidLocation, WorldError};
use crate::engine::map::{self, WorldData};
use crate::engine::math::Bounds;
use crate::engine::pathfinding::{Location, PathEdge, Region, RegionId};
use crate::engine::routing::{ConnectorGraph, Route, RoutePlan, RoutePlanner};

/// The complete, immutable navigation model of a world.
///
/// Built once from [`WorldData`]; every query takes `&self` and keeps its search
/// state on the stack, so one `NavWorld` can serve any number of threads.
#[derive(Debug)]
pub struct NavWorld {
    regions: FxHashMap<RegionId, Region>,
    connectors: ConnectorGraph,
    config: NavConfig,
}

impl NavWorld {
    /// Validate the data and build every region raster plus the connector graph.
    #[profile(5)]
    pub fn build(data: WorldData, config: NavConfig) -> Result<Self, WorldError> {
        let mut bounds: FxHashMap<RegionId, Bounds> = FxHashMap::default();
        for region in &data.regions {
            if bounds.insert(region.id.clone(), region.bounds()).is_some() {
                return Err(WorldError::DuplicateRegion(region.id.clone()));
            }
        }

        let connectors = ConnectorGraph::build(&data.connectors, &bounds, &config)?;

        let mut regions = FxHashMap::default();
        for region_data in &data.regions {
            let markers = connectors.endpoints_in(&region_data.id);
            let outgoing = connectors.outgoing(&region_data.id).to_vec();
            let region = Region::build(region_data, &markers, outgoing, &config)?;
            regions.insert(region_data.id.clone(), region);
        }

        info!(
            "[WORLD] Built navigation world: {} regions, {} connector arcs",
            regions.len(), connectors.len()
        );

        Ok(Self { regions, connectors, config })
    }

    /// Load world data from disk and build it. `.ron` files are parsed as RON,
    /// anything else is read as a compressed snapshot.
    pub fn load(path: impl AsRef<Path>, config: NavConfig) -> Result<Self, WorldError> {
        let path = path.as_ref();
        let data = match path.extension().and_then(|ext| ext.to_str()) {
            Some("ron") => WorldData::load_ron(path)?,
            _ => map::load_snapshot(path)?,
        };
        Self::build(data, config)
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    pub fn region(&self, id: &RegionId) -> Option<&Region> {
        self.regions.get(id)
    }

    pub fn get_region(&self, id: &RegionId) -> Result<&Region, InvalidLocation> {
        self.regions.get(id).ok_or_else(|| InvalidLocation::UnknownRegion(id.clone()))
    }

    /// All regions, sorted by id.
    pub fn regions(&self) -> Vec<&Region> {
        let mut regions: Vec<&Region> = self.regions.values().collect();
        regions.sort_by(|a, b| a.id().cmp(b.id()));
        regions
    }

    pub fn connectors(&self) -> &ConnectorGraph {
        &self.connectors
    }

    /// Default spawn location of a region.
    pub fn spawn(&self, region: &RegionId) -> Option<Location> {
        self.region(region).map(Region::spawn)
    }

    /// Check a requested location and pull it into its region.
    ///
    /// Points up to `bounds_tolerance` outside the bounds clamp to the edge;
    /// anything farther is rejected.
    pub fn resolve(&self, location: &Location) -> Result<Location, InvalidLocation> {
        let region = self.get_region(&location.region)?;
        let position = location.position;

        if !position.is_finite() {
            return Err(InvalidLocation::NonFinite { region: location.region.clone(), position });
        }

        let bounds = region.bounds();
        let distance = bounds.distance_outside(position);
        if distance > self.config.bounds_tolerance {
            return Err(InvalidLocation::OutOfBounds { region: location.region.clone(), position, distance });
        }

        Ok(Location::at(location.region.clone(), bounds.clamp(position)))
    }

    /// Shortest walk between two points of one region.
    ///
    /// `Ok(None)` when both points share a cell or the end is unreachable.
    #[profile]
    pub fn find_path(&self, region: &RegionId, start: Vec2, end: Vec2) -> Result<Option<PathEdge>, InvalidLocation> {
        let start = self.resolve(&Location::at(region.clone(), start))?;
        let end = self.resolve(&Location::at(region.clone(), end))?;
        let region = self.get_region(region)?;
        Ok(region.find_path(start.position, end.position, &self.config))
    }

    /// Cheapest route between two locations, possibly through other regions.
    ///
    /// Empty when start and end coincide or no route exists; see [`Self::plan`].
    #[profile]
    pub fn find_route(&self, start: &Location, end: &Location) -> Result<Route, InvalidLocation> {
        Ok(self.plan(start, end)?.into_route())
    }

    /// Like [`Self::find_route`] but tells "already there" from "unreachable".
    pub fn plan(&self, start: &Location, end: &Location) -> Result<RoutePlan, InvalidLocation> {
        let start = self.resolve(start)?;
        let end = self.resolve(end)?;
        let planner = RoutePlanner::new(&self.regions, &self.connectors, &self.config);
        Ok(planner.plan(&start, &end))
    }

    /// Whether `end` can be reached from `start` at all.
    pub fn is_reachable(&self, start: &Location, end: &Location) -> Result<bool, InvalidLocation> {
        let start = self.resolve(start)?;
        let end = self.resolve(end)?;

        if start.region == end.region {
            let region = self.get_region(&start.region)?;
            if region.is_reachable(start.position, end.position, &self.config) {
                return Ok(true);
            }
        }

        let planner = RoutePlanner::new(&self.regions, &self.connectors, &self.config);
        Ok(planner.plan(&start, &end).is_reachable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::map::{ConnectorData, RegionData};
    use crate::engine::routing::ConnectorKind;

    fn two_rooms() -> WorldData {
        WorldData {
            regions: vec![
                RegionData::open("a", Vec2::ZERO, Vec2::splat(160.0)),
                RegionData::open("b", Vec2::ZERO, Vec2::splat(160.0)),
            ],
            connectors: vec![
                ConnectorData::new(ConnectorKind::Door, Location::new("a", 150.0, 80.0), Location::new("b", 10.0, 80.0))
                    .bidirectional(),
            ],
        }
    }

    #[test]
    fn test_duplicate_region_is_rejected() {
        let mut data = two_rooms();
        data.regions.push(RegionData::open("a", Vec2::ZERO, Vec2::ONE));
        let err = NavWorld::build(data, NavConfig::default()).unwrap_err();
        assert!(matches!(err, WorldError::DuplicateRegion(ref id) if id.as_str() == "a"));
    }

    #[test]
    fn test_regions_are_sorted() {
        let world = NavWorld::build(two_rooms(), NavConfig::default()).unwrap();
        let ids: Vec<&str> = world.regions().iter().map(|r| r.id().as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(world.region(&RegionId::from("a")).unwrap().connectors().len(), 1);
    }

    #[test]
    fn test_resolve_clamps_within_tolerance() {
        let world = NavWorld::build(two_rooms(), NavConfig::default()).unwrap();

        let near = world.resolve(&Location::new("a", -10.0, 50.0)).unwrap();
        assert_eq!(near.position, Vec2::new(0.0, 50.0));

        let far = world.resolve(&Location::new("a", -500.0, 50.0));
        assert!(matches!(far, Err(InvalidLocation::OutOfBounds { .. })));

        let nan = world.resolve(&Location::new("a", f32::NAN, 0.0));
        assert!(matches!(nan, Err(InvalidLocation::NonFinite { .. })));

        let unknown = world.resolve(&Location::new("z", 0.0, 0.0));
        assert_eq!(unknown, Err(InvalidLocation::UnknownRegion(RegionId::from("z"))));
    }

    #[test]
    fn test_spawn_defaults_to_center() {
        let world = NavWorld::build(two_rooms(), NavConfig::default()).unwrap();
        assert_eq!(world.spawn(&RegionId::from("b")), Some(Location::new("b", 80.0, 80.0)));
        assert_eq!(world.spawn(&RegionId::from("nowhere")), None);
    }

    #[test]
    fn test_world_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NavWorld>();
    }
}
