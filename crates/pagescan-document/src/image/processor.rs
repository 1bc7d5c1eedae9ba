// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — loading, height-based resizing, encoding and storing page
// images with the `image` crate.

use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use pagescan_core::error::{Result, ScanError};
use tracing::{debug, info, instrument};

/// Image wrapper used at the edges of the scan pipeline.
///
/// Each transformation consumes `self` and returns a new `ImageProcessor`,
/// so calls chain:
///
/// ```ignore
/// ImageProcessor::from_dynamic(page)
///     .limit_height(650)
///     .save("scans/receipt-scan.png")?;
/// ```
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    ///
    /// A missing or unreadable file is `ScanError::Io`; anything the decoder
    /// rejects is `ScanError::Image`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|err| match err {
            image::ImageError::IoError(io) => ScanError::Io(io),
            other => ScanError::Image(format!("failed to open {}: {other}", path.display())),
        })?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Resize to exactly `height` pixels tall, preserving aspect ratio.
    pub fn resize_to_height(self, height: u32) -> Self {
        Self {
            image: resize_to_height(&self.image, height),
        }
    }

    /// Downscale to at most `max_height` pixels tall. Smaller images are
    /// left untouched.
    pub fn limit_height(self, max_height: u32) -> Self {
        if self.image.height() <= max_height {
            return self;
        }
        self.resize_to_height(max_height)
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| ScanError::Image(format!("PNG encoding failed: {err}")))?;
        Ok(buffer)
    }

    /// Write the image to a file, creating missing parent directories. The
    /// format is inferred from the file extension.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        self.image.save(path).map_err(|err| match err {
            image::ImageError::IoError(io) => ScanError::Io(io),
            other => ScanError::Image(format!("failed to save image to {}: {other}", path.display())),
        })?;
        info!(width = self.width(), height = self.height(), "Image saved");
        Ok(())
    }
}

/// Resize `image` to exactly `height` pixels tall, preserving aspect ratio
/// (width rounded, at least 1 px). Uses a triangle (bilinear) filter.
pub fn resize_to_height(image: &DynamicImage, height: u32) -> DynamicImage {
    let height = height.max(1);
    let scale = f64::from(height) / f64::from(image.height().max(1));
    let width = (f64::from(image.width()) * scale).round().max(1.0) as u32;
    debug!(
        from_w = image.width(),
        from_h = image.height(),
        width,
        height,
        "Resizing image"
    );
    image.resize_exact(width, height, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, RgbImage};

    #[test]
    fn resize_to_height_preserves_aspect() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(3000, 4000));
        let small = resize_to_height(&img, 500);
        assert_eq!(small.height(), 500);
        assert_eq!(small.width(), 375);
    }

    #[test]
    fn limit_height_never_upscales() {
        let small = ImageProcessor::from_dynamic(DynamicImage::ImageLuma8(GrayImage::new(40, 60)))
            .limit_height(650);
        assert_eq!((small.width(), small.height()), (40, 60));

        let large = ImageProcessor::from_dynamic(DynamicImage::ImageLuma8(GrayImage::new(1000, 1300)))
            .limit_height(650);
        assert_eq!((large.width(), large.height()), (500, 650));
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/page-scan.png");
        let page = GrayImage::from_pixel(20, 30, Luma([200]));
        ImageProcessor::from_dynamic(DynamicImage::ImageLuma8(page))
            .save(&path)
            .unwrap();

        let reopened = ImageProcessor::open(&path).unwrap();
        assert_eq!((reopened.width(), reopened.height()), (20, 30));
    }

    #[test]
    fn open_reports_missing_and_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.png");
        assert!(matches!(ImageProcessor::open(&missing), Err(ScanError::Io(_))));

        let corrupt = dir.path().join("corrupt.png");
        std::fs::write(&corrupt, b"definitely not a png").unwrap();
        assert!(matches!(ImageProcessor::open(&corrupt), Err(ScanError::Image(_))));
    }

    #[test]
    fn png_bytes_decode_back() {
        let img = ImageProcessor::from_dynamic(DynamicImage::ImageLuma8(GrayImage::new(7, 9)));
        let bytes = img.to_png_bytes().unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (7, 9));
    }
}
