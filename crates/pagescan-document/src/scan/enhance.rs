// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Optional page clean-up: local-mean adaptive thresholding of the rectified
// page, turning uneven lighting into a crisp black-on-white scan.

use image::{GrayImage, Luma};
use pagescan_core::ScanConfig;
use tracing::{debug, instrument};

/// Adaptive (local mean) binarization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binarizer {
    /// Half-size of the square neighbourhood used for the local mean.
    pub block_radius: u32,
    /// Subtracted from the local mean; larger values keep more pixels white.
    pub offset: i32,
}

impl Binarizer {
    pub fn new(block_radius: u32, offset: i32) -> Self {
        Self {
            block_radius,
            offset,
        }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(config.binarize_block_radius, config.binarize_offset)
    }

    /// A pixel darker than `local_mean - offset` becomes black (0), every
    /// other pixel white (255).
    #[instrument(skip(page), fields(width = page.width(), height = page.height()))]
    pub fn apply(&self, page: &GrayImage) -> GrayImage {
        let (width, height) = page.dimensions();
        let integral = IntegralImage::new(page);

        let output = GrayImage::from_fn(width, height, |x, y| {
            let local_mean = integral.region_mean(x, y, self.block_radius);
            let threshold = (local_mean.round() as i32 - self.offset).clamp(0, 255);
            let value = i32::from(page.get_pixel(x, y)[0]);
            if value < threshold { Luma([0]) } else { Luma([255]) }
        });

        debug!(block_radius = self.block_radius, offset = self.offset, "Binarization complete");
        output
    }
}

/// Summed-area table with a zero row and column in front.
struct IntegralImage {
    table: Vec<u64>,
    width: u32,
    height: u32,
}

impl IntegralImage {
    fn new(gray: &GrayImage) -> Self {
        let (width, height) = gray.dimensions();
        let stride = width as usize + 1;
        let mut table = vec![0u64; stride * (height as usize + 1)];

        for y in 0..height as usize {
            let mut row_sum = 0u64;
            for x in 0..width as usize {
                row_sum += u64::from(gray.get_pixel(x as u32, y as u32)[0]);
                table[(y + 1) * stride + x + 1] = row_sum + table[y * stride + x + 1];
            }
        }

        Self {
            table,
            width,
            height,
        }
    }

    /// Mean over the square of `radius` around `(cx, cy)`, clipped to the image.
    fn region_mean(&self, cx: u32, cy: u32, radius: u32) -> f64 {
        let stride = self.width as usize + 1;
        let x1 = cx.saturating_sub(radius) as usize;
        let y1 = cy.saturating_sub(radius) as usize;
        let x2 = (cx.saturating_add(radius).saturating_add(1)).min(self.width) as usize;
        let y2 = (cy.saturating_add(radius).saturating_add(1)).min(self.height) as usize;

        let area = ((x2 - x1) * (y2 - y1)) as f64;
        if area == 0.0 {
            return 128.0;
        }

        let t = &self.table;
        let sum = t[y2 * stride + x2] + t[y1 * stride + x1] - t[y1 * stride + x2] - t[y2 * stride + x1];
        sum as f64 / area
    }
}
