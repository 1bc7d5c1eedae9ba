// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR for rectified pages using the `ocrs` crate (neural models run by `rten`).
//
// Only compiled with the `ocr` feature:
//
// ```toml
// pagescan-document = { path = "crates/pagescan-document", features = ["ocr"] }
// ```
//
// The engine needs `text-detection.rten` and `text-recognition.rten`. Running
// the `ocrs` CLI once downloads both to `$XDG_CACHE_HOME/ocrs` (usually
// `~/.cache/ocrs`), which is where `OcrConfig::default()` looks.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams, TextItem};
use pagescan_core::error::{Result, ScanError};
use rten::Model;
use tracing::{debug, info, instrument};

use super::recognize::{LineBounds, RecognizedLine, TextRecognizer};

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// `$XDG_CACHE_HOME/ocrs`, falling back to `~/.cache/ocrs`.
pub fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Where to find the two OCR models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrConfig {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrConfig {
    /// Expect `text-detection.rten` and `text-recognition.rten` inside `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    /// Check that both model files exist.
    pub fn validate(&self) -> Result<()> {
        for (role, path) in [
            ("detection", &self.detection_model_path),
            ("recognition", &self.recognition_model_path),
        ] {
            if !path.exists() {
                return Err(ScanError::Ocr(format!(
                    "{role} model not found at {}; run `ocrs` once to download the models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Line-level OCR engine. Model loading is the expensive step, so build one
/// engine and reuse it for every page.
pub struct OcrEngine {
    engine: OcrsEngine,
}

impl OcrEngine {
    /// Load both models named by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Ocr`] if a model file is missing or cannot be loaded.
    #[instrument(skip_all, fields(
        detection = %config.detection_model_path.display(),
        recognition = %config.recognition_model_path.display(),
    ))]
    pub fn new(config: &OcrConfig) -> Result<Self> {
        config.validate()?;

        info!("Loading OCR models");
        let detection_model = load_model(&config.detection_model_path)?;
        let recognition_model = load_model(&config.recognition_model_path)?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| ScanError::Ocr(format!("failed to initialise OCR engine: {err}")))?;

        info!("OCR engine ready");
        Ok(Self { engine })
    }

    /// Load models from the default cache directory.
    pub fn with_defaults() -> Result<Self> {
        Self::new(&OcrConfig::default())
    }

    pub fn from_model_dir(dir: impl AsRef<Path>) -> Result<Self> {
        Self::new(&OcrConfig::from_dir(dir))
    }
}

fn load_model(path: &Path) -> Result<Model> {
    Model::load_file(path).map_err(|err| {
        ScanError::Ocr(format!("failed to load model from {}: {err}", path.display()))
    })
}

impl TextRecognizer for OcrEngine {
    /// Detect words, group them into lines and recognise each line. Lines
    /// that come back empty are dropped.
    #[instrument(skip_all, fields(width = page.width(), height = page.height()))]
    fn recognize(&self, page: &DynamicImage) -> Result<Vec<RecognizedLine>> {
        let rgb = page.to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            ScanError::Ocr(format!("failed to create image source ({width}x{height}): {err}"))
        })?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| ScanError::Ocr(format!("OCR preprocessing failed: {err}")))?;

        let words = self
            .engine
            .detect_words(&input)
            .map_err(|err| ScanError::Ocr(format!("word detection failed: {err}")))?;
        let line_rects = self.engine.find_text_lines(&input, &words);
        debug!(words = words.len(), lines = line_rects.len(), "Text layout found");

        let recognized = self
            .engine
            .recognize_text(&input, &line_rects)
            .map_err(|err| ScanError::Ocr(format!("line recognition failed: {err}")))?;

        let lines: Vec<RecognizedLine> = recognized
            .iter()
            .flatten()
            .filter_map(|line| {
                let text = line.to_string();
                if text.trim().is_empty() {
                    return None;
                }
                let rect = line.bounding_rect();
                let bounds = LineBounds::new(
                    rect.left() as f32,
                    rect.top() as f32,
                    rect.right() as f32,
                    rect.bottom() as f32,
                );
                Some(RecognizedLine::new(text, Some(bounds)))
            })
            .collect();

        info!(lines = lines.len(), "OCR complete");
        Ok(lines)
    }
}
