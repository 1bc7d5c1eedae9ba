// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagescan-document — Turning photographed pages into scans.
//
// Finds the page outline in a photo (edges, contours, polygon approximation),
// rectifies it with a four-point perspective transform, optionally cleans it
// up with adaptive thresholding, reads its text (feature `ocr`) and writes a
// searchable PDF.

pub mod image;
pub mod pdf;
pub mod scan;

pub use crate::image::processor::ImageProcessor;
pub use pdf::writer::PdfWriter;
pub use scan::backend::{Homography, ImageprocBackend, PerspectiveBackend, ReferenceBackend};
pub use scan::detect::{ContourDetector, DocumentDetector};
pub use scan::recognize::{RecognizedLine, TextRecognizer};
pub use scan::rectify::{Rectifier, four_point_transform};
pub use scan::scanner::Scanner;

#[cfg(feature = "ocr")]
pub use scan::ocr::OcrEngine;
