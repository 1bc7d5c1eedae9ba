// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page outline detection — edge map, contour tracing and polygon approximation.
//
// The default detector looks for the largest closed boundary in the photo that
// simplifies to exactly four corners. It assumes a page that contrasts with its
// background and is fully visible.

use image::{DynamicImage, GrayImage};
use imageproc::contours::find_contours;
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::dilate;
use pagescan_core::geometry::{arc_length, polygon_area};
use pagescan_core::{Point2D, Quadrilateral, ScanConfig};
use tracing::{debug, instrument, trace};

/// Something that can find the four corners of a page in an image.
pub trait DocumentDetector {
    /// Corners of the page in detection order, or `None` if no page outline
    /// was found.
    fn detect(&self, image: &DynamicImage) -> Option<Quadrilateral>;
}

/// A closed boundary traced from an edge map.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub points: Vec<Point2D>,
}

impl Contour {
    pub fn new(points: Vec<Point2D>) -> Self {
        Self { points }
    }

    /// Closed arc length.
    pub fn perimeter(&self) -> f64 {
        arc_length(&self.points, true)
    }

    /// Enclosed area (shoelace, absolute).
    pub fn area(&self) -> f64 {
        polygon_area(&self.points)
    }

    /// Simplify the boundary with a tolerance of `ratio` times its perimeter.
    pub fn approximate(&self, ratio: f64) -> Vec<Point2D> {
        approximate_polygon(&self.points, ratio * self.perimeter())
    }
}

// -- Contour detector -----------------------------------------------------------

/// Blur, Canny edges, contour tracing, top-K by area, first 4-vertex polygon.
#[derive(Debug, Clone)]
pub struct ContourDetector {
    blur_sigma: f32,
    canny_low: f32,
    canny_high: f32,
    edge_dilation: u8,
    top_k: usize,
    epsilon_ratio: f64,
}

impl Default for ContourDetector {
    fn default() -> Self {
        Self::from_config(&ScanConfig::default())
    }
}

impl ContourDetector {
    pub fn from_config(config: &ScanConfig) -> Self {
        Self {
            blur_sigma: config.blur_sigma(),
            canny_low: config.canny_low,
            canny_high: config.canny_high,
            edge_dilation: config.edge_dilation,
            top_k: config.top_k,
            epsilon_ratio: config.approx_epsilon_ratio,
        }
    }

    /// Binary edge map (255 = edge) of a grayscale image.
    pub fn edge_map(&self, gray: &GrayImage) -> GrayImage {
        let blurred = gaussian_blur_f32(gray, self.blur_sigma);
        let edges = canny(&blurred, self.canny_low, self.canny_high);
        if self.edge_dilation > 0 {
            dilate(&edges, Norm::LInf, self.edge_dilation)
        } else {
            edges
        }
    }

    /// The `top_k` largest contours of the edge map, largest first.
    pub fn candidates(&self, edges: &GrayImage) -> Vec<Contour> {
        let mut contours: Vec<(f64, Contour)> = find_contours::<u32>(edges)
            .into_iter()
            .map(|c| {
                let contour = Contour::new(
                    c.points
                        .iter()
                        .map(|p| Point2D::new(f64::from(p.x), f64::from(p.y)))
                        .collect(),
                );
                (contour.area(), contour)
            })
            .collect();

        contours.sort_by(|a, b| b.0.total_cmp(&a.0));
        contours.truncate(self.top_k);
        contours.into_iter().map(|(_, c)| c).collect()
    }
}

impl DocumentDetector for ContourDetector {
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    fn detect(&self, image: &DynamicImage) -> Option<Quadrilateral> {
        let gray = image.to_luma8();
        let edges = self.edge_map(&gray);
        let candidates = self.candidates(&edges);
        debug!(candidates = candidates.len(), "Traced contours");

        for (rank, contour) in candidates.iter().enumerate() {
            let approx = contour.approximate(self.epsilon_ratio);
            trace!(
                rank,
                area = contour.area(),
                vertices = approx.len(),
                "Approximated candidate"
            );
            if approx.len() == 4 {
                debug!(rank, area = contour.area(), "Found page outline");
                return Quadrilateral::from_slice(&approx).ok();
            }
        }

        None
    }
}

// -- Polygon approximation ------------------------------------------------------

/// Douglas–Peucker simplification of a closed polygon.
///
/// The ring is split at two far-apart vertices (the point farthest from the
/// first one, and the point farthest from that) and each half is simplified
/// as an open chain. The result starts at the first split vertex and keeps
/// the input's winding.
pub fn approximate_polygon(points: &[Point2D], epsilon: f64) -> Vec<Point2D> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let a = farthest_from(points, &points[0]);
    let b = farthest_from(points, &points[a]);
    if a == b {
        return vec![points[a]];
    }

    let ring = |from: usize, to: usize| -> Vec<Point2D> {
        let len = (to + n - from) % n;
        (0..=len).map(|i| points[(from + i) % n]).collect()
    };

    let first = simplify_open(&ring(a, b), epsilon);
    let second = simplify_open(&ring(b, a), epsilon);

    let mut result = Vec::with_capacity(first.len() + second.len());
    result.extend_from_slice(&first[..first.len() - 1]);
    result.extend_from_slice(&second[..second.len() - 1]);
    result
}

fn farthest_from(points: &[Point2D], origin: &Point2D) -> usize {
    let mut best = 0;
    let mut best_dist = -1.0;
    for (i, p) in points.iter().enumerate() {
        let d = p.distance(origin);
        if d > best_dist {
            best = i;
            best_dist = d;
        }
    }
    best
}

/// Douglas–Peucker on an open chain. Endpoints are always kept.
fn simplify_open(chain: &[Point2D], epsilon: f64) -> Vec<Point2D> {
    if chain.len() <= 2 {
        return chain.to_vec();
    }

    let mut keep = vec![false; chain.len()];
    keep[0] = true;
    keep[chain.len() - 1] = true;

    let mut stack = vec![(0, chain.len() - 1)];
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }

        let mut max_dist = 0.0;
        let mut max_idx = start;
        for i in start + 1..end {
            let d = distance_to_line(&chain[i], &chain[start], &chain[end]);
            if d > max_dist {
                max_dist = d;
                max_idx = i;
            }
        }

        if max_dist > epsilon {
            keep[max_idx] = true;
            stack.push((start, max_idx));
            stack.push((max_idx, end));
        }
    }

    chain
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Perpendicular distance from `p` to the line through `a` and `b`.
fn distance_to_line(p: &Point2D, a: &Point2D, b: &Point2D) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = dx.hypot(dy);
    if len < f64::EPSILON {
        return p.distance(a);
    }
    ((p.x - a.x) * dy - (p.y - a.y) * dx).abs() / len
}
