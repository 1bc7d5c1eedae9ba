// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for people running the scanner.
//
// Every technical error is mapped to plain English with a clear suggestion.

use crate::error::ScanError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The user can fix it: retake the photo, fix a path, install models.
    ActionRequired,
    /// The input cannot be processed as given.
    Permanent,
    /// Something inside the scanner went wrong.
    Internal,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    pub severity: Severity,
}

impl std::fmt::Display for HumanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n{}", self.message, self.suggestion)
    }
}

/// Convert a `ScanError` into a `HumanError`.
pub fn humanize_error(err: &ScanError) -> HumanError {
    match err {
        ScanError::DocumentNotDetected { .. } => HumanError {
            message: "We couldn't find the edges of the page in this photo.".into(),
            suggestion: "Retake the photo with all four corners visible, on a background that contrasts with the paper.".into(),
            severity: Severity::ActionRequired,
        },

        ScanError::DegenerateGeometry(_) => HumanError {
            message: "The detected page outline is too thin or flat to straighten.".into(),
            suggestion: "Take the photo more from above so the page is not seen edge-on.".into(),
            severity: Severity::ActionRequired,
        },

        ScanError::InvalidArgument(detail) => HumanError {
            message: "The scanner was given an invalid page outline.".into(),
            suggestion: format!("This is a bug; please report it. ({detail})"),
            severity: Severity::Internal,
        },

        ScanError::Image(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.".into(),
            severity: Severity::Permanent,
        },

        ScanError::Ocr(_) => HumanError {
            message: "Text recognition didn't work on this scan.".into(),
            suggestion: "Check that the OCR models are installed (run `ocrs` once to download them) and that the photo is in focus.".into(),
            severity: Severity::ActionRequired,
        },

        ScanError::Pdf(_) => HumanError {
            message: "The PDF could not be created.".into(),
            suggestion: "The scanned image and text were kept; try again or report the problem.".into(),
            severity: Severity::Internal,
        },

        ScanError::Config(detail) => HumanError {
            message: "The scanner settings are not valid.".into(),
            suggestion: format!("Fix the configuration file and try again. ({detail})"),
            severity: Severity::ActionRequired,
        },

        ScanError::Serialization(_) => HumanError {
            message: "The settings file could not be read.".into(),
            suggestion: "Make sure the configuration file is valid JSON.".into(),
            severity: Severity::ActionRequired,
        },

        ScanError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "Check the path and try again.".into(),
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "The scanner doesn't have permission to use that file or folder.".into(),
                    suggestion: "Check the permissions, or choose a different output folder.".into(),
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                    severity: Severity::Permanent,
                }
            }
        }
    }
}
