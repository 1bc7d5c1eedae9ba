// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan pipeline configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};

/// Tunable settings for detection, rectification and output.
///
/// Every field has a default matching the classic "document on a contrasting
/// desk" setup. A JSON file may override any subset of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Height (px) of the working copy the detector runs on.
    pub detection_height: u32,
    /// Height (px) the rectified page is downscaled to before it is stored.
    pub storage_height: u32,
    /// Odd Gaussian kernel size applied before edge detection.
    pub blur_kernel_size: u32,
    /// Canny hysteresis low threshold.
    pub canny_low: f32,
    /// Canny hysteresis high threshold.
    pub canny_high: f32,
    /// Radius (px) by which the edge map is dilated to close small gaps. 0 disables it.
    pub edge_dilation: u8,
    /// Number of largest contours considered as page candidates.
    pub top_k: usize,
    /// Polygon approximation tolerance as a fraction of the contour perimeter.
    pub approx_epsilon_ratio: f64,
    /// Apply adaptive thresholding to the rectified page.
    pub binarize: bool,
    /// Neighbourhood radius for adaptive thresholding.
    pub binarize_block_radius: u32,
    /// Constant subtracted from the local mean during adaptive thresholding.
    pub binarize_offset: i32,
    /// Resolution used to size the PDF page from the page image.
    pub pdf_dpi: f32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            detection_height: 500,
            storage_height: 650,
            blur_kernel_size: 5,
            canny_low: 75.0,
            canny_high: 200.0,
            edge_dilation: 1,
            top_k: 5,
            approx_epsilon_ratio: 0.02,
            binarize: false,
            binarize_block_radius: 15,
            binarize_offset: 10,
            pdf_dpi: 150.0,
        }
    }
}

impl ScanConfig {
    /// Load a configuration from a JSON file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Gaussian sigma equivalent to the configured kernel size.
    ///
    /// Uses the OpenCV rule for a zero sigma: `0.3 * ((k - 1) * 0.5 - 1) + 0.8`.
    pub fn blur_sigma(&self) -> f32 {
        let k = self.blur_kernel_size as f32;
        (0.3 * ((k - 1.0) * 0.5 - 1.0) + 0.8).max(0.1)
    }

    /// Check the invariants the pipeline relies on.
    pub fn validate(&self) -> Result<()> {
        if self.detection_height == 0 {
            return Err(ScanError::Config("detection_height must be positive".into()));
        }
        if self.storage_height == 0 {
            return Err(ScanError::Config("storage_height must be positive".into()));
        }
        if self.blur_kernel_size == 0 || self.blur_kernel_size % 2 == 0 {
            return Err(ScanError::Config(format!(
                "blur_kernel_size must be odd, got {}",
                self.blur_kernel_size
            )));
        }
        if !(self.canny_low > 0.0 && self.canny_low <= self.canny_high) {
            return Err(ScanError::Config(format!(
                "canny thresholds must satisfy 0 < low <= high, got {} / {}",
                self.canny_low, self.canny_high
            )));
        }
        if self.top_k == 0 {
            return Err(ScanError::Config("top_k must be at least 1".into()));
        }
        if !(self.approx_epsilon_ratio > 0.0 && self.approx_epsilon_ratio < 1.0) {
            return Err(ScanError::Config(format!(
                "approx_epsilon_ratio must be in (0, 1), got {}",
                self.approx_epsilon_ratio
            )));
        }
        if self.pdf_dpi <= 0.0 {
            return Err(ScanError::Config("pdf_dpi must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = ScanConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.detection_height, 500);
        assert_eq!(config.top_k, 5);
    }

    #[test]
    fn kernel_five_gives_opencv_sigma() {
        let config = ScanConfig::default();
        assert!((config.blur_sigma() - 1.1).abs() < 1e-6);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: ScanConfig =
            serde_json::from_str(r#"{ "canny_low": 50.0, "top_k": 8 }"#).unwrap();
        assert_eq!(config.canny_low, 50.0);
        assert_eq!(config.top_k, 8);
        assert_eq!(config.canny_high, 200.0);
        assert_eq!(config.detection_height, 500);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let even_kernel = ScanConfig {
            blur_kernel_size: 4,
            ..ScanConfig::default()
        };
        assert!(matches!(even_kernel.validate(), Err(ScanError::Config(_))));

        let inverted = ScanConfig {
            canny_low: 250.0,
            ..ScanConfig::default()
        };
        assert!(inverted.validate().is_err());

        let no_candidates = ScanConfig {
            top_k: 0,
            ..ScanConfig::default()
        };
        assert!(no_candidates.validate().is_err());
    }

    #[test]
    fn load_reads_and_validates_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "detection_height": 400, "binarize": true }}"#).unwrap();
        let config = ScanConfig::load(file.path()).unwrap();
        assert_eq!(config.detection_height, 400);
        assert!(config.binarize);

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        writeln!(bad, r#"{{ "approx_epsilon_ratio": 2.0 }}"#).unwrap();
        assert!(ScanConfig::load(bad.path()).is_err());

        let mut garbage = tempfile::NamedTempFile::new().unwrap();
        writeln!(garbage, "not json").unwrap();
        assert!(matches!(
            ScanConfig::load(garbage.path()),
            Err(ScanError::Serialization(_))
        ));
    }
}
