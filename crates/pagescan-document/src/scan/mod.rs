// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline — page detection, perspective rectification, adaptive
// binarization and optical character recognition (OCR).

pub mod backend;
pub mod detect;
pub mod enhance;
pub mod recognize;
pub mod rectify;
pub mod scanner;

#[cfg(feature = "ocr")]
pub mod ocr;

pub use detect::{ContourDetector, DocumentDetector};
pub use enhance::Binarizer;
pub use recognize::{LineBounds, RecognizedLine, TextRecognizer, join_lines};
pub use rectify::Rectifier;
pub use scanner::Scanner;

#[cfg(feature = "ocr")]
pub use ocr::{OcrConfig, OcrEngine};
