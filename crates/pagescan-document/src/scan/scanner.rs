// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan orchestrator: shrink the photo for detection, find the page outline,
// map it back to full resolution and rectify the original.

use std::path::Path;

use image::{DynamicImage, GrayImage};
use pagescan_core::error::{Result, ScanError};
use pagescan_core::{Quadrilateral, ScanConfig};
use tracing::{debug, info, info_span, instrument, warn};

use super::backend::{ImageprocBackend, PerspectiveBackend};
use super::detect::{ContourDetector, DocumentDetector};
use super::enhance::Binarizer;
use super::rectify::Rectifier;
use crate::image::processor::{ImageProcessor, resize_to_height};

/// Turns a photographed page into a flat, top-down grayscale scan.
///
/// ```ignore
/// let scanner = Scanner::new(ScanConfig::default())?;
/// let page = scanner.scan_path("receipt.jpg")?;
/// ```
pub struct Scanner<D = ContourDetector, B = ImageprocBackend> {
    config: ScanConfig,
    detector: D,
    rectifier: Rectifier<B>,
}

impl Scanner {
    /// Default detector and backend, tuned by `config`.
    pub fn new(config: ScanConfig) -> Result<Self> {
        config.validate()?;
        let detector = ContourDetector::from_config(&config);
        Ok(Self {
            config,
            detector,
            rectifier: Rectifier::new(),
        })
    }
}

impl<D: DocumentDetector, B: PerspectiveBackend> Scanner<D, B> {
    /// Assemble a scanner from a custom detector and homography backend.
    pub fn with_parts(config: ScanConfig, detector: D, backend: B) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            detector,
            rectifier: Rectifier::with_backend(backend),
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Read an image from disk and scan it.
    pub fn scan_path(&self, path: impl AsRef<Path>) -> Result<GrayImage> {
        let image = ImageProcessor::open(path)?.into_dynamic();
        self.scan(&image)
    }

    /// Find the page outline in full-resolution coordinates, without
    /// rectifying.
    ///
    /// # Errors
    ///
    /// [`ScanError::DocumentNotDetected`] when none of the candidate contours
    /// simplifies to four corners.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn locate(&self, image: &DynamicImage) -> Result<Quadrilateral> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ScanError::Image("image has no pixels".into()));
        }

        let working = resize_to_height(image, self.config.detection_height);
        let ratio = f64::from(image.height()) / f64::from(working.height());
        debug!(
            working_w = working.width(),
            working_h = working.height(),
            ratio,
            "Resized for detection"
        );

        let Some(outline) = self.detector.detect(&working) else {
            warn!(candidates = self.config.top_k, "No page outline found");
            return Err(ScanError::DocumentNotDetected {
                candidates: self.config.top_k,
            });
        };

        let outline = outline.scaled(ratio);
        debug!(corners = ?outline.ordered(), "Page outline at full resolution");
        Ok(outline)
    }

    /// Detect the page in `image` and return it rectified and in grayscale
    /// (binarized when the config asks for it). Nothing is returned on
    /// failure; there are no partial results.
    pub fn scan(&self, image: &DynamicImage) -> Result<GrayImage> {
        let span = info_span!("scan", width = image.width(), height = image.height());
        let _guard = span.enter();

        let outline = self.locate(image)?;

        let original = image.to_rgb8();
        let rectified = self
            .rectifier
            .four_point_transform(&original, outline.points())?;
        let mut page = DynamicImage::ImageRgb8(rectified).to_luma8();

        if self.config.binarize {
            page = Binarizer::from_config(&self.config).apply(&page);
        }

        info!(
            page_w = page.width(),
            page_h = page.height(),
            binarized = self.config.binarize,
            "Page rectified"
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::backend::ReferenceBackend;
    use image::{Luma, Rgb, RgbImage};
    use imageproc::drawing::draw_polygon_mut;
    use imageproc::point::Point;
    use pagescan_core::Point2D;

    /// Corners of a `w` x `h` rectangle centred on `(cx, cy)`, rotated by
    /// `degrees`, rounded to pixels.
    fn rotated_rect(cx: f64, cy: f64, w: f64, h: f64, degrees: f64) -> [(i32, i32); 4] {
        let (sin, cos) = degrees.to_radians().sin_cos();
        [(-w, -h), (w, -h), (w, h), (-w, h)].map(|(dx, dy)| {
            let (dx, dy) = (dx / 2.0, dy / 2.0);
            (
                (cx + dx * cos - dy * sin).round() as i32,
                (cy + dx * sin + dy * cos).round() as i32,
            )
        })
    }

    fn photo(width: u32, height: u32, corners: &[(i32, i32); 4]) -> DynamicImage {
        let mut img = RgbImage::from_pixel(width, height, Rgb([45, 50, 60]));
        let poly: Vec<Point<i32>> = corners.iter().map(|&(x, y)| Point::new(x, y)).collect();
        draw_polygon_mut(&mut img, &poly, Rgb([240, 238, 230]));
        DynamicImage::ImageRgb8(img)
    }

    fn aspect(page: &GrayImage) -> f64 {
        let (w, h) = page.dimensions();
        f64::from(w.max(h)) / f64::from(w.min(h))
    }

    #[test]
    fn skewed_a4_sheet_keeps_paper_proportions() {
        let corners = rotated_rect(750.0, 1000.0, 1050.0, 1485.0, 8.0);
        let image = photo(1500, 2000, &corners);

        let page = Scanner::new(ScanConfig::default()).unwrap().scan(&image).unwrap();

        let expected = 297.0 / 210.0;
        let got = aspect(&page);
        assert!(
            (got - expected).abs() / expected < 0.05,
            "aspect {got:.3}, expected {expected:.3}"
        );
        // Portrait sheet stays portrait.
        assert!(page.height() > page.width());
    }

    #[test]
    fn rotated_card_is_rectified() {
        let corners = rotated_rect(600.0, 500.0, 856.0, 540.0, 12.0);
        let image = photo(1200, 1000, &corners);

        let page = Scanner::new(ScanConfig::default()).unwrap().scan(&image).unwrap();

        let expected = 856.0 / 540.0;
        let got = aspect(&page);
        assert!((got - expected).abs() / expected < 0.03, "aspect {got:.3}");
        // Card size is recovered at full resolution, not detection scale.
        assert!(page.width().abs_diff(856) < 30, "width {}", page.width());

        // The middle of the card is paper, not background.
        let centre = page.get_pixel(page.width() / 2, page.height() / 2)[0];
        assert!(centre > 200, "centre pixel {centre}");
    }

    #[test]
    fn detection_scales_with_resolution() {
        let corners = rotated_rect(500.0, 400.0, 600.0, 420.0, 6.0);
        let full = photo(1000, 800, &corners);
        let half = full.resize_exact(500, 400, image::imageops::FilterType::Triangle);

        let detector = ContourDetector::default();
        let at_full = detector.detect(&full).unwrap().ordered();
        let at_half = detector.detect(&half).unwrap().scaled(2.0).ordered();

        for (a, b) in at_full.iter().zip(at_half.iter()) {
            assert!(a.distance(b) < 8.0, "{a} vs {b}");
        }
    }

    #[test]
    fn locate_returns_full_resolution_corners() {
        let corners = rotated_rect(750.0, 1000.0, 1000.0, 1400.0, 5.0);
        let image = photo(1500, 2000, &corners);
        let scanner = Scanner::new(ScanConfig::default()).unwrap();
        let outline = scanner.locate(&image).unwrap();

        for (x, y) in corners {
            let truth = Point2D::new(f64::from(x), f64::from(y));
            let nearest = outline
                .points()
                .iter()
                .map(|p| p.distance(&truth))
                .fold(f64::INFINITY, f64::min);
            assert!(nearest < 16.0, "corner {truth} off by {nearest:.1}");
        }
    }

    #[test]
    fn blank_photo_is_not_detected() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(800, 600, Rgb([90, 90, 90])));
        let err = Scanner::new(ScanConfig::default()).unwrap().scan(&image).unwrap_err();
        assert!(matches!(err, ScanError::DocumentNotDetected { candidates: 5 }));
    }

    #[test]
    fn reference_backend_gives_the_same_page_size() {
        let corners = rotated_rect(600.0, 500.0, 700.0, 500.0, 10.0);
        let image = photo(1200, 1000, &corners);
        let config = ScanConfig::default();

        let fast = Scanner::new(config.clone()).unwrap().scan(&image).unwrap();
        let reference = Scanner::with_parts(
            config.clone(),
            ContourDetector::from_config(&config),
            ReferenceBackend,
        )
        .unwrap()
        .scan(&image)
        .unwrap();

        assert_eq!(fast.dimensions(), reference.dimensions());
    }

    #[test]
    fn binarize_option_yields_black_and_white() {
        let corners = rotated_rect(600.0, 500.0, 700.0, 500.0, 7.0);
        let image = photo(1200, 1000, &corners);
        let config = ScanConfig {
            binarize: true,
            ..ScanConfig::default()
        };
        let page = Scanner::new(config).unwrap().scan(&image).unwrap();
        assert!(page.pixels().all(|p| *p == Luma([0]) || *p == Luma([255])));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = ScanConfig {
            detection_height: 0,
            ..ScanConfig::default()
        };
        assert!(matches!(Scanner::new(config), Err(ScanError::Config(_))));
    }

    #[test]
    fn scan_path_reports_missing_and_undecodable_files() {
        let dir = tempfile::tempdir().unwrap();
        let scanner = Scanner::new(ScanConfig::default()).unwrap();

        let missing = dir.path().join("missing.jpg");
        assert!(matches!(scanner.scan_path(&missing), Err(ScanError::Io(_))));

        let garbage = dir.path().join("garbage.png");
        std::fs::write(&garbage, b"\x00\x01\x02 not an image").unwrap();
        assert!(matches!(scanner.scan_path(&garbage), Err(ScanError::Image(_))));
    }

    #[test]
    fn scan_path_reads_and_scans_a_photo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("desk.png");
        let corners = rotated_rect(400.0, 300.0, 500.0, 350.0, 4.0);
        photo(800, 600, &corners).save(&path).unwrap();

        let page = Scanner::new(ScanConfig::default()).unwrap().scan_path(&path).unwrap();
        let got = aspect(&page);
        assert!((got - 500.0 / 350.0).abs() < 0.05, "aspect {got:.3}");
    }
}
