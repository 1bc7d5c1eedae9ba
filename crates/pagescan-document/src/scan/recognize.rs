// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text recognition seam. The scan pipeline hands a rectified page to a
// `TextRecognizer` and gets lines of text back, optionally with their
// positions so the PDF writer can lay an invisible text layer over the image.

use image::DynamicImage;
use pagescan_core::error::Result;
use serde::{Deserialize, Serialize};

/// Axis-aligned box in page pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineBounds {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl LineBounds {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        (self.right - self.left).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.bottom - self.top).max(0.0)
    }
}

/// One line of recognised text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedLine {
    pub text: String,
    pub bounds: Option<LineBounds>,
}

impl RecognizedLine {
    pub fn new(text: impl Into<String>, bounds: Option<LineBounds>) -> Self {
        Self {
            text: text.into(),
            bounds,
        }
    }
}

/// Anything that can read text off a page image.
pub trait TextRecognizer {
    fn recognize(&self, page: &DynamicImage) -> Result<Vec<RecognizedLine>>;
}

/// Plain text of `lines`, one per row, in reading order.
pub fn join_lines(lines: &[RecognizedLine]) -> String {
    lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedText(Vec<&'static str>);

    impl TextRecognizer for FixedText {
        fn recognize(&self, _page: &DynamicImage) -> Result<Vec<RecognizedLine>> {
            Ok(self.0.iter().map(|t| RecognizedLine::new(*t, None)).collect())
        }
    }

    #[test]
    fn joins_lines_with_newlines() {
        let recognizer = FixedText(vec!["INVOICE 0042", "Total: 18.50"]);
        let page = DynamicImage::new_luma8(10, 10);
        let lines = recognizer.recognize(&page).unwrap();
        assert_eq!(join_lines(&lines), "INVOICE 0042\nTotal: 18.50");
        assert_eq!(join_lines(&[]), "");
    }

    #[test]
    fn bounds_size_is_never_negative() {
        let b = LineBounds::new(10.0, 20.0, 5.0, 40.0);
        assert_eq!(b.width(), 0.0);
        assert_eq!(b.height(), 20.0);
    }
}
