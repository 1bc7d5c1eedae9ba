// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Where scan results are written.
//
// For `photos/receipt.jpg` and the default output directory:
//   scans/receipt-scan.jpg   rectified page
//   scans/receipt.txt        recognised text
//   scans/receipt.pdf        searchable PDF

use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT_DIR: &str = "scans";

/// Extension used for the rectified page when the input has none.
const FALLBACK_EXTENSION: &str = "png";

#[derive(Debug, Clone)]
pub struct OutputLayout {
    dir: PathBuf,
}

impl Default for OutputLayout {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_DIR)
    }
}

impl OutputLayout {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<stem>-scan.<ext>`, keeping the input's image format.
    pub fn scan_image(&self, input: &Path) -> PathBuf {
        let ext = input
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .unwrap_or(FALLBACK_EXTENSION);
        self.dir.join(format!("{}-scan.{ext}", stem(input)))
    }

    /// `<dir>/<stem>.txt`
    pub fn text(&self, input: &Path) -> PathBuf {
        self.dir.join(format!("{}.txt", stem(input)))
    }

    /// `<dir>/<stem>.pdf`
    pub fn pdf(&self, input: &Path) -> PathBuf {
        self.dir.join(format!("{}.pdf", stem(input)))
    }
}

/// File name without its extension; `page` for paths that have none.
pub fn stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "page".to_string())
}
