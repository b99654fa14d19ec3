//! Planar geometry primitives shared by region construction and search.
//!
//! All coordinates are world-space `f32`. Regions are axis-aligned rectangles, so
//! the only shapes needed are bounds, line segments and simple polygons.

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

/// Tolerance used when classifying a point against a line.
pub const EPSILON: f32 = 1e-4;

/// Axis-aligned bounding box
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y
    }

    /// Nearest point inside the bounds.
    pub fn clamp(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min, self.max)
    }

    /// How far `point` lies outside the bounds (0 when inside).
    pub fn distance_outside(&self, point: Vec2) -> f32 {
        point.distance(self.clamp(point))
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }
}

/// A line segment in world space
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub start: Vec2,
    pub end: Vec2,
}

impl LineSegment {
    pub fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    /// Axis-aligned box covering the segment.
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.start.min(self.end), self.start.max(self.end))
    }

    /// Liang-Barsky clip test against a closed axis-aligned box.
    ///
    /// Touching the boundary counts as intersecting, so a wall lying exactly on
    /// a cell border blocks the cells on both sides.
    pub fn intersects_bounds(&self, bounds: &Bounds) -> bool {
        let delta = self.end - self.start;
        let mut t_min = 0.0_f32;
        let mut t_max = 1.0_f32;

        let checks = [
            (-delta.x, self.start.x - bounds.min.x),
            (delta.x, bounds.max.x - self.start.x),
            (-delta.y, self.start.y - bounds.min.y),
            (delta.y, bounds.max.y - self.start.y),
        ];

        for (p, q) in checks {
            if p.abs() < f32::EPSILON {
                // Parallel to this edge: reject when outside the slab
                if q < 0.0 {
                    return false;
                }
                continue;
            }
            let t = q / p;
            if p < 0.0 {
                if t > t_max {
                    return false;
                }
                t_min = t_min.max(t);
            } else {
                if t < t_min {
                    return false;
                }
                t_max = t_max.min(t);
            }
        }
        t_min <= t_max
    }

    /// Signed side of `point`: positive on the left, negative on the right.
    pub fn side(&self, point: Vec2) -> f32 {
        (self.end - self.start).perp_dot(point - self.start)
    }

    /// Proper or touching intersection between two segments.
    pub fn intersects(&self, other: &LineSegment) -> bool {
        let d1 = other.side(self.start);
        let d2 = other.side(self.end);
        let d3 = self.side(other.start);
        let d4 = self.side(other.end);

        if ((d1 > EPSILON && d2 < -EPSILON) || (d1 < -EPSILON && d2 > EPSILON))
            && ((d3 > EPSILON && d4 < -EPSILON) || (d3 < -EPSILON && d4 > EPSILON))
        {
            return true;
        }

        (d1.abs() <= EPSILON && other.bounds().contains(self.start))
            || (d2.abs() <= EPSILON && other.bounds().contains(self.end))
            || (d3.abs() <= EPSILON && self.bounds().contains(other.start))
            || (d4.abs() <= EPSILON && self.bounds().contains(other.end))
    }
}

/// Simple polygon (implicitly closed)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon {
    pub vertices: Vec<Vec2>,
}

impl Polygon {
    pub fn new(vertices: Vec<Vec2>) -> Self {
        Self { vertices }
    }

    /// Even-odd ray cast. Points exactly on an edge may land either way.
    pub fn contains(&self, point: Vec2) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }

        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[j];
            if (a.y > point.y) != (b.y > point.y) {
                let x_cross = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
                if point.x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    pub fn bounds(&self) -> Bounds {
        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for v in &self.vertices {
            min = min.min(*v);
            max = max.max(*v);
        }
        Bounds::new(min, max)
    }
}
