//! Source-frame geometry primitives.
//!
//! All coordinates are in source-frame pixel space, origin at the top-left.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A 2D coordinate in source-frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Midpoint between two points.
    #[inline]
    pub fn midpoint(&self, other: &Point) -> Point {
        Point {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }
}

/// Axis-aligned bounding box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    /// Left edge x-coordinate
    pub x: f64,
    /// Top edge y-coordinate
    pub y: f64,
    /// Box width
    pub width: f64,
    /// Box height
    pub height: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Center x-coordinate.
    #[inline]
    pub fn cx(&self) -> f64 {
        self.x + self.width / 2.0
    }

    /// Center y-coordinate.
    #[inline]
    pub fn cy(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// Center point.
    #[inline]
    pub fn center(&self) -> Point {
        Point::new(self.cx(), self.cy())
    }

    /// Box area in pixels.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Width/height ratio, `None` for a degenerate box.
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.height > 0.0 {
            Some(self.width / self.height)
        } else {
            None
        }
    }

    /// Component-wise linear blend: `alpha * other + (1 - alpha) * self`.
    pub fn blend(&self, other: &BoundingBox, alpha: f64) -> BoundingBox {
        let mix = |current: f64, incoming: f64| alpha * incoming + (1.0 - alpha) * current;
        BoundingBox {
            x: mix(self.x, other.x),
            y: mix(self.y, other.y),
            width: mix(self.width, other.width),
            height: mix(self.height, other.height),
        }
    }
}
