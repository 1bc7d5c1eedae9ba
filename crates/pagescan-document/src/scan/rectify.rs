// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Four-point perspective rectification.
//
// Given the four corners of a page as seen in a photograph, computes the size
// of the flattened page and warps the photograph into a top-down view.

use image::RgbImage;
use pagescan_core::Point2D;
use pagescan_core::error::Result;
use pagescan_core::geometry::{ensure_non_degenerate, order_points};
use tracing::{debug, instrument};

use super::backend::{ImageprocBackend, PerspectiveBackend};

/// Warps a quadrilateral region of an image into an axis-aligned rectangle.
#[derive(Debug, Clone, Default)]
pub struct Rectifier<B = ImageprocBackend> {
    backend: B,
}

impl Rectifier<ImageprocBackend> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<B: PerspectiveBackend> Rectifier<B> {
    /// Use a specific homography backend.
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Output canvas size for ordered corners `[TL, TR, BR, BL]`: the longer
    /// of each pair of opposite edges, rounded, never below 1.
    pub fn output_size(corners: &[Point2D; 4]) -> (u32, u32) {
        let [tl, tr, br, bl] = corners;
        let width = br.distance(bl).max(tr.distance(tl));
        let height = tr.distance(br).max(tl.distance(bl));
        (to_extent(width), to_extent(height))
    }

    /// Rectify the region bounded by `quad` (any order) into a top-down view.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` unless exactly four points are given;
    /// `DegenerateGeometry` when the corners cannot bound a page.
    #[instrument(skip(self, image, quad), fields(width = image.width(), height = image.height()))]
    pub fn four_point_transform(&self, image: &RgbImage, quad: &[Point2D]) -> Result<RgbImage> {
        let corners = order_points(quad)?;
        ensure_non_degenerate(&corners)?;

        let (width, height) = Self::output_size(&corners);
        let (w, h) = (f64::from(width - 1), f64::from(height - 1));
        let destination = [
            Point2D::new(0.0, 0.0),
            Point2D::new(w, 0.0),
            Point2D::new(w, h),
            Point2D::new(0.0, h),
        ];

        let homography = self.backend.solve(&corners, &destination)?;
        debug!(
            tl = %corners[0],
            tr = %corners[1],
            br = %corners[2],
            bl = %corners[3],
            out_width = width,
            out_height = height,
            "Solved page homography"
        );

        self.backend.warp(image, &homography, width, height)
    }
}

fn to_extent(length: f64) -> u32 {
    length.round().clamp(1.0, f64::from(u32::MAX)) as u32
}

/// Rectify with the default backend.
pub fn four_point_transform(image: &RgbImage, quad: &[Point2D]) -> Result<RgbImage> {
    Rectifier::new().four_point_transform(image, quad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::backend::ReferenceBackend;
    use image::Rgb;
    use imageproc::drawing::draw_polygon_mut;
    use imageproc::point::Point;
    use pagescan_core::ScanError;

    fn pts(raw: &[(f64, f64)]) -> Vec<Point2D> {
        raw.iter().map(|&p| Point2D::from(p)).collect()
    }

    #[test]
    fn axis_aligned_rectangle_keeps_its_size() {
        let image = RgbImage::from_pixel(150, 250, Rgb([255, 255, 255]));
        let quad = pts(&[(0.0, 0.0), (100.0, 0.0), (100.0, 200.0), (0.0, 200.0)]);
        let out = four_point_transform(&image, &quad).unwrap();
        assert_eq!(out.dimensions(), (100, 200));
    }

    #[test]
    fn output_size_uses_longer_opposite_edges() {
        let corners = [
            Point2D::new(10.0, 10.0),
            Point2D::new(110.0, 20.0),
            Point2D::new(120.0, 220.0),
            Point2D::new(0.0, 200.0),
        ];
        let (w, h) = Rectifier::<ImageprocBackend>::output_size(&corners);
        let expected_w = corners[2].distance(&corners[3]).round() as u32;
        let expected_h = corners[1].distance(&corners[2]).round() as u32;
        assert_eq!((w, h), (expected_w, expected_h));
    }

    #[test]
    fn rectifying_a_rectified_page_is_stable() {
        let image = RgbImage::from_fn(120, 80, |x, y| Rgb([(x * 2) as u8, (y * 3) as u8, 90]));
        let quad = pts(&[(0.0, 0.0), (119.0, 0.0), (119.0, 79.0), (0.0, 79.0)]);
        let out = four_point_transform(&image, &quad).unwrap();
        let (w, h) = out.dimensions();
        assert!(w.abs_diff(120) <= 1 && h.abs_diff(80) <= 1, "{w}x{h}");
        // The identity mapping leaves interior pixels (nearly) untouched.
        let (a, b) = (out.get_pixel(40, 30), image.get_pixel(40, 30));
        for c in 0..3 {
            assert!(a[c].abs_diff(b[c]) <= 1, "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn corner_order_does_not_matter() {
        let image = RgbImage::from_fn(200, 200, |x, y| Rgb([x as u8, y as u8, 0]));
        let a = pts(&[(20.0, 30.0), (170.0, 20.0), (180.0, 160.0), (15.0, 170.0)]);
        let b = pts(&[(180.0, 160.0), (20.0, 30.0), (15.0, 170.0), (170.0, 20.0)]);
        let out_a = four_point_transform(&image, &a).unwrap();
        let out_b = four_point_transform(&image, &b).unwrap();
        assert_eq!(out_a, out_b);
    }

    #[test]
    fn skewed_sheet_is_flattened() {
        // White trapezoid on black: after rectification the page fills the frame.
        let mut image = RgbImage::from_pixel(400, 400, Rgb([0, 0, 0]));
        let corners = [(60, 50), (330, 80), (350, 340), (40, 310)];
        let poly: Vec<Point<i32>> = corners.iter().map(|&(x, y)| Point::new(x, y)).collect();
        draw_polygon_mut(&mut image, &poly, Rgb([255, 255, 255]));

        let quad: Vec<Point2D> = corners
            .iter()
            .map(|&(x, y)| Point2D::new(x as f64, y as f64))
            .collect();
        let out = Rectifier::with_backend(ReferenceBackend)
            .four_point_transform(&image, &quad)
            .unwrap();

        let (w, h) = out.dimensions();
        let mut interior = out
            .enumerate_pixels()
            .filter(|(x, y, _)| *x > 3 && *y > 3 && *x < w - 4 && *y < h - 4);
        assert!(interior.all(|(_, _, p)| p[0] > 200));
    }

    #[test]
    fn wrong_point_count_is_rejected() {
        let image = RgbImage::new(10, 10);
        let err = four_point_transform(&image, &pts(&[(0.0, 0.0), (5.0, 0.0), (5.0, 5.0)]))
            .unwrap_err();
        assert!(matches!(err, ScanError::InvalidArgument(_)));
    }

    #[test]
    fn collinear_points_are_degenerate() {
        let image = RgbImage::new(50, 50);
        let quad = pts(&[(0.0, 0.0), (10.0, 10.0), (20.0, 20.0), (30.0, 30.0)]);
        let err = four_point_transform(&image, &quad).unwrap_err();
        assert!(matches!(err, ScanError::DegenerateGeometry(_)));
    }
}
