use bevy::math::Vec2;
use crate::engine::math::Bounds;
use super::types::{Cell, CELL_SIZE};

/// Mapping between a region's continuous coordinates and its raster cells.
///
/// The raster origin is the region's minimum corner. Cell `(0, 0)` covers
/// `[min.x, min.x + CELL_SIZE) × [min.y, min.y + CELL_SIZE)`. When the region
/// size is not a multiple of [`CELL_SIZE`] the last column/row is partial.
///
/// # Lossy Round Trip
///
/// `cell_to_world` returns the cell centre, so `world_to_cell(cell_to_world(c)) == c`
/// holds but `cell_to_world(world_to_cell(p)) == p` does not.
#[derive(Clone, Debug)]
pub struct RegionGrid {
    pub bounds: Bounds,
    pub width: usize,
    pub height: usize,
}

impl RegionGrid {
    pub fn new(bounds: Bounds) -> Self {
        let width = ((bounds.width() / CELL_SIZE).ceil() as usize).max(1);
        let height = ((bounds.height() / CELL_SIZE).ceil() as usize).max(1);
        Self { bounds, width, height }
    }

    /// Cells a raster over `bounds` would need, computed in `f64` so huge
    /// bounds compare as large instead of overflowing.
    pub fn cells_needed(bounds: &Bounds) -> f64 {
        let width = ((bounds.max.x as f64 - bounds.min.x as f64) / CELL_SIZE as f64).ceil().max(1.0);
        let height = ((bounds.max.y as f64 - bounds.min.y as f64) / CELL_SIZE as f64).ceil().max(1.0);
        width * height
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Cell containing `point`. Points outside the region clamp to the nearest
    /// border cell.
    pub fn world_to_cell(&self, point: Vec2) -> Cell {
        let local = self.bounds.clamp(point) - self.bounds.min;

        let x = ((local.x / CELL_SIZE).floor().max(0.0) as usize).min(self.width - 1);
        let y = ((local.y / CELL_SIZE).floor().max(0.0) as usize).min(self.height - 1);

        Cell::new(x, y)
    }

    /// Representative point of a cell (its centre).
    pub fn cell_to_world(&self, cell: Cell) -> Vec2 {
        let offset = CELL_SIZE / 2.0;
        self.bounds.min + Vec2::new(
            cell.x as f32 * CELL_SIZE + offset,
            cell.y as f32 * CELL_SIZE + offset,
        )
    }

    /// World-space box covered by a cell.
    pub fn cell_bounds(&self, cell: Cell) -> Bounds {
        let min = self.bounds.min + Vec2::new(cell.x as f32 * CELL_SIZE, cell.y as f32 * CELL_SIZE);
        Bounds::new(min, min + Vec2::splat(CELL_SIZE))
    }

    #[inline]
    pub fn get_index(&self, cell: Cell) -> usize {
        cell.y * self.width + cell.x
    }

    #[inline]
    pub fn cell_at(&self, index: usize) -> Cell {
        Cell::new(index % self.width, index / self.width)
    }

    #[inline]
    pub fn in_grid(&self, x: isize, y: isize) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Inclusive cell range covered by a world-space box, clamped to the grid.
    pub fn cells_overlapping(&self, area: &Bounds) -> (Cell, Cell) {
        (self.world_to_cell(area.min), self.world_to_cell(area.max))
    }
}
