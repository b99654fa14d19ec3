pub mod engine;

pub use engine::{Navigation, NavigationPlugin};
pub use engine::config::NavConfig;
pub use engine::error::{InvalidLocation, WorldError};
pub use engine::map::WorldData;
pub use engine::pathfinding::{Location, PathEdge, RegionId};
pub use engine::routing::{Edge, Route, RoutePlan};
pub use engine::world::NavWorld;
