// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Pagescan.

use thiserror::Error;

/// Top-level error type for all Pagescan operations.
#[derive(Debug, Error)]
pub enum ScanError {
    // -- Geometry errors --
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    // -- Detection errors --
    #[error("no document outline found among the {candidates} largest contours")]
    DocumentNotDetected { candidates: usize },

    // -- Image / document errors --
    #[error("image processing failed: {0}")]
    Image(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("PDF operation failed: {0}")]
    Pdf(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanError>;
