use bevy::prelude::*;
use std::sync::Arc;

pub mod config;
pub mod error;
pub mod map;
pub mod math;
pub mod pathfinding;
pub mod routing;
pub mod world;

use config::NavConfig;
use world::NavWorld;

/// Shared handle to the built world. Cloning is cheap; every clone sees the
/// same immutable model.
#[derive(Resource, Clone, Debug)]
pub struct Navigation(pub Arc<NavWorld>);

impl Navigation {
    pub fn world(&self) -> &NavWorld {
        &self.0
    }
}

/// Makes a prebuilt [`NavWorld`] available to an app as the [`Navigation`]
/// resource, along with its [`NavConfig`].
pub struct NavigationPlugin {
    world: Arc<NavWorld>,
}

impl NavigationPlugin {
    pub fn new(world: NavWorld) -> Self {
        Self { world: Arc::new(world) }
    }

    pub fn shared(world: Arc<NavWorld>) -> Self {
        Self { world }
    }
}

impl Plugin for NavigationPlugin {
    fn build(&self, app: &mut App) {
        info!("[NAVIGATION] Registering world with {} regions", self.world.regions().len());
        app.insert_resource(self.world.config().clone())
            .insert_resource(Navigation(self.world.clone()));
    }
}
