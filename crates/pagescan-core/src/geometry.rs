// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Planar geometry helpers: canonical corner ordering, polygon area and
// degeneracy checks used by the rectifier.

use crate::error::{Result, ScanError};
use crate::types::Point2D;

/// Minimum edge length / area (in pixels) below which a quadrilateral is
/// considered degenerate.
pub const DEGENERATE_EPSILON: f64 = 1e-6;

/// Order four corner points as `[top-left, top-right, bottom-right, bottom-left]`.
///
/// The smallest `x + y` is top-left and the largest is bottom-right. The
/// smallest `y - x` is top-right and the largest is bottom-left.
///
/// Ties are broken by input order: the first point reaching the extreme value
/// wins. Near-square inputs with exact ties therefore never panic, although
/// the same point may be picked for two corners.
///
/// # Errors
///
/// Returns [`ScanError::InvalidArgument`] unless exactly four points are given.
pub fn order_points(points: &[Point2D]) -> Result<[Point2D; 4]> {
    let corners: &[Point2D; 4] = points.try_into().map_err(|_| {
        ScanError::InvalidArgument(format!(
            "corner ordering needs exactly 4 points, got {}",
            points.len()
        ))
    })?;
    Ok(order_corners(corners))
}

/// Infallible form of [`order_points`] for callers that already hold four points.
pub fn order_corners(points: &[Point2D; 4]) -> [Point2D; 4] {
    let sum = |p: &Point2D| p.x + p.y;
    let diff = |p: &Point2D| p.y - p.x;

    let top_left = extreme(points, sum, |candidate, best| candidate < best);
    let bottom_right = extreme(points, sum, |candidate, best| candidate > best);
    let top_right = extreme(points, diff, |candidate, best| candidate < best);
    let bottom_left = extreme(points, diff, |candidate, best| candidate > best);

    [top_left, top_right, bottom_right, bottom_left]
}

/// First point whose key strictly beats every earlier one.
fn extreme(
    points: &[Point2D; 4],
    key: impl Fn(&Point2D) -> f64,
    beats: impl Fn(f64, f64) -> bool,
) -> Point2D {
    let mut best = points[0];
    let mut best_key = key(&best);
    for p in &points[1..] {
        let k = key(p);
        if beats(k, best_key) {
            best = *p;
            best_key = k;
        }
    }
    best
}

/// Area of a simple polygon using the shoelace formula. Vertices must be in
/// order (CW or CCW); the result is always non-negative.
pub fn polygon_area(points: &[Point2D]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let n = points.len();
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x * points[j].y;
        area -= points[j].x * points[i].y;
    }
    area.abs() / 2.0
}

/// Perimeter of a polygon; `closed` adds the segment from the last point back
/// to the first.
pub fn arc_length(points: &[Point2D], closed: bool) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let mut length: f64 = points.windows(2).map(|w| w[0].distance(&w[1])).sum();
    if closed {
        length += points[points.len() - 1].distance(&points[0]);
    }
    length
}

/// Check that an ordered quadrilateral `[TL, TR, BR, BL]` can be rectified.
///
/// Rejects non-finite coordinates, zero-length edges, any three collinear
/// corners, and a vanishing enclosed area.
pub fn ensure_non_degenerate(corners: &[Point2D; 4]) -> Result<()> {
    if let Some(p) = corners.iter().find(|p| !p.is_finite()) {
        return Err(ScanError::DegenerateGeometry(format!(
            "corner {p:?} is not a finite coordinate"
        )));
    }

    for i in 0..4 {
        let a = corners[i];
        let b = corners[(i + 1) % 4];
        if a.distance(&b) < DEGENERATE_EPSILON {
            return Err(ScanError::DegenerateGeometry(format!(
                "zero-length edge between {a} and {b}"
            )));
        }
    }

    // The doubled triangle area of three points is the cross product; a
    // vanishing value relative to the edge lengths means collinear.
    for skip in 0..4 {
        let tri: Vec<&Point2D> = corners
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != skip)
            .map(|(_, p)| p)
            .collect();
        let cross = (tri[1].x - tri[0].x) * (tri[2].y - tri[0].y)
            - (tri[1].y - tri[0].y) * (tri[2].x - tri[0].x);
        let scale = tri[0].distance(tri[1]) * tri[0].distance(tri[2]);
        if cross.abs() <= scale * 1e-9 {
            return Err(ScanError::DegenerateGeometry(format!(
                "corners {}, {} and {} are collinear",
                tri[0], tri[1], tri[2]
            )));
        }
    }

    let area = polygon_area(corners);
    if area < DEGENERATE_EPSILON {
        return Err(ScanError::DegenerateGeometry(format!(
            "quadrilateral encloses no area ({area:e} px²)"
        )));
    }

    Ok(())
}
