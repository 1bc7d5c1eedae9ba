// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Pagescan scanning pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};
use crate::geometry;

/// A point in image space. Coordinates are in pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point2D) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Multiply both coordinates by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Point2D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Four corners of a document boundary.
///
/// The points are stored in the order they were produced (e.g. contour
/// tracing order). Use [`Quadrilateral::ordered`] to obtain the canonical
/// `[top-left, top-right, bottom-right, bottom-left]` order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quadrilateral {
    points: [Point2D; 4],
}

impl Quadrilateral {
    pub fn new(points: [Point2D; 4]) -> Self {
        Self { points }
    }

    /// Build a quadrilateral from a slice that must hold exactly four points.
    pub fn from_slice(points: &[Point2D]) -> Result<Self> {
        let points: [Point2D; 4] = points.try_into().map_err(|_| {
            ScanError::InvalidArgument(format!(
                "a quadrilateral needs exactly 4 points, got {}",
                points.len()
            ))
        })?;
        Ok(Self { points })
    }

    /// Corners in detection order.
    pub fn points(&self) -> &[Point2D; 4] {
        &self.points
    }

    /// Corners as `[top-left, top-right, bottom-right, bottom-left]`.
    pub fn ordered(&self) -> [Point2D; 4] {
        geometry::order_corners(&self.points)
    }

    /// Map the quadrilateral into another coordinate space by a uniform scale.
    pub fn scaled(&self, ratio: f64) -> Self {
        Self {
            points: self.points.map(|p| p.scaled(ratio)),
        }
    }

    /// Enclosed area (shoelace formula), independent of winding.
    pub fn area(&self) -> f64 {
        geometry::polygon_area(&self.ordered())
    }
}

impl TryFrom<Vec<Point2D>> for Quadrilateral {
    type Error = ScanError;

    fn try_from(points: Vec<Point2D>) -> Result<Self> {
        Self::from_slice(&points)
    }
}
