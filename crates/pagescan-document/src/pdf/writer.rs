// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — one-page searchable PDFs from a scanned page using `printpdf` 0.8.
//
// The page image fills the whole page. Recognised text is drawn on top in
// the invisible text rendering mode, so viewers can search and select it
// while only the scan is visible.
//
// printpdf 0.8 builds documents from `PdfPage`s holding `Vec<Op>` operation
// lists, serialised with `PdfDocument::save()`.

use std::path::Path;

use image::{DynamicImage, GrayImage};
use pagescan_core::ScanConfig;
use pagescan_core::error::{Result, ScanError};
use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, RawImage,
    RawImageData, RawImageFormat, TextItem, TextRenderingMode, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

use crate::scan::recognize::RecognizedLine;

const POINTS_PER_INCH: f32 = 72.0;
const MM_PER_INCH: f32 = 25.4;
const FONT: BuiltinFont = BuiltinFont::Helvetica;

/// Creates searchable PDFs from rectified pages.
pub struct PdfWriter {
    /// Pixels per inch of the page image; fixes the physical page size.
    dpi: f32,
    /// Title metadata embedded in the PDF /Info dictionary.
    title: String,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new(150.0)
    }
}

impl PdfWriter {
    pub fn new(dpi: f32) -> Self {
        Self {
            dpi,
            title: "Pagescan Document".into(),
        }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(config.pdf_dpi)
    }

    /// Set a title for the PDF metadata.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    fn px_to_pt(&self, px: f32) -> f32 {
        px / self.dpi * POINTS_PER_INCH
    }

    /// Build a one-page PDF: `page` as the visible content and each of
    /// `lines` as invisible text over the region it was read from.
    ///
    /// Lines without bounds are stacked from the top-left corner. With no
    /// lines the PDF holds the image only.
    #[instrument(skip_all, fields(width = page.width(), height = page.height(), lines = lines.len()))]
    pub fn create_searchable(&self, page: &GrayImage, lines: &[RecognizedLine]) -> Result<Vec<u8>> {
        if page.width() == 0 || page.height() == 0 {
            return Err(ScanError::Pdf("page image has no pixels".into()));
        }
        if !(self.dpi.is_finite() && self.dpi > 0.0) {
            return Err(ScanError::Pdf(format!("invalid page resolution {} dpi", self.dpi)));
        }

        let (width_px, height_px) = page.dimensions();
        let page_w = Mm(width_px as f32 / self.dpi * MM_PER_INCH);
        let page_h = Mm(height_px as f32 / self.dpi * MM_PER_INCH);
        let page_h_pt = self.px_to_pt(height_px as f32);

        info!(title = %self.title, dpi = self.dpi, "Creating searchable PDF");

        // printpdf embeds RGB8 most reliably.
        let rgb = DynamicImage::ImageLuma8(page.clone()).to_rgb8();
        let raw = RawImage {
            pixels: RawImageData::U8(rgb.into_raw()),
            width: width_px as usize,
            height: height_px as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };

        let mut doc = PdfDocument::new(&self.title);
        let xobject_id = doc.add_image(&raw);

        let mut ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(0.0)),
                scale_x: Some(1.0),
                scale_y: Some(1.0),
                dpi: Some(self.dpi),
                rotate: None,
            },
        }];

        let fallback_size = self.px_to_pt(height_px as f32 / 60.0).max(6.0);
        let mut stacked = 0usize;
        for line in lines.iter().filter(|l| !l.text.trim().is_empty()) {
            let (x, baseline, size) = match line.bounds {
                Some(b) if b.height() > 0.0 => {
                    let size = self.px_to_pt(b.height());
                    // Baseline sits about a fifth of the line height above the bottom.
                    let baseline = page_h_pt - self.px_to_pt(b.bottom) + size * 0.2;
                    (self.px_to_pt(b.left), baseline, size)
                }
                _ => {
                    stacked += 1;
                    let y = page_h_pt - fallback_size * 1.2 * stacked as f32;
                    (0.0, y, fallback_size)
                }
            };
            push_invisible_text(&mut ops, &line.text, x, baseline, size);
        }

        if stacked > 0 {
            warn!(stacked, "Lines without position were stacked from the top");
        }

        doc.with_pages(vec![PdfPage::new(page_w, page_h, ops)]);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        debug!(bytes = output.len(), warnings = warnings.len(), "PDF serialised");

        Ok(output)
    }

    /// Create a searchable PDF and write it to `path`.
    pub fn write_to_file(
        &self,
        page: &GrayImage,
        lines: &[RecognizedLine],
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let bytes = self.create_searchable(page, lines)?;
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, &bytes)?;
        info!("Wrote searchable PDF to {}", path.display());
        Ok(())
    }
}

fn push_invisible_text(ops: &mut Vec<Op>, text: &str, x: f32, y: f32, size: f32) {
    ops.push(Op::StartTextSection);
    ops.push(Op::SetTextRenderingMode {
        mode: TextRenderingMode::Invisible,
    });
    ops.push(Op::SetFontSizeBuiltinFont {
        size: Pt(size),
        font: FONT,
    });
    ops.push(Op::SetTextCursor {
        pos: Point {
            x: Pt(x),
            y: Pt(y),
        },
    });
    ops.push(Op::WriteTextBuiltinFont {
        items: vec![TextItem::Text(text.to_string())],
        font: FONT,
    });
    ops.push(Op::EndTextSection);
}
