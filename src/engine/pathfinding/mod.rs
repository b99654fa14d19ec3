//! Intra-region navigation: grid mapping, walkability rasters and A*.
//!
//! Each region is rasterized once into [`CELL_SIZE`] cells. Requests inside a
//! region run A* over that raster and return a simplified [`PathEdge`].

mod types;
mod grid;
mod walkability;
mod astar;
mod region;


// ============================================================================
// PUBLIC API
// ============================================================================

pub use types::{Cell, Direction, Location, PathEdge, RegionId, CELL_SIZE, DIAGONAL_COST};
pub use grid::RegionGrid;
pub use walkability::{Walkability, Neighbors, MAX_CELLS};
pub use astar::find_path;
pub use region::Region;
