// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pagescan — scan a photographed document from the command line.
//
// Entry point. Initialises logging, scans the page, stores the rectified
// image, reads its text and writes a searchable PDF next to it.

mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use image::DynamicImage;
use pagescan_core::ScanConfig;
use pagescan_core::error::Result;
use pagescan_core::human_errors::humanize_error;
use pagescan_document::scan::{RecognizedLine, join_lines};
use pagescan_document::{ImageProcessor, PdfWriter, Scanner};
use tracing::{error, info};

use output::{DEFAULT_OUTPUT_DIR, OutputLayout, stem};

#[derive(Debug, Parser)]
#[command(name = "pagescan")]
#[command(about = "Turn a photo of a document into a flat scan, its text and a searchable PDF", long_about = None)]
struct Cli {
    /// Photo of the document to scan
    image: PathBuf,

    /// JSON file overriding scan settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory the results are written to
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Directory holding text-detection.rten and text-recognition.rten
    #[arg(long)]
    models: Option<PathBuf>,

    /// Convert the page to black and white before saving
    #[arg(long)]
    binarize: bool,
}

/// Paths written by a successful run.
#[derive(Debug)]
struct Written {
    scan: PathBuf,
    text: Option<PathBuf>,
    pdf: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!(image = %cli.image.display(), "Pagescan starting");

    match run(&cli) {
        Ok(written) => {
            info!(
                scan = %written.scan.display(),
                text = ?written.text,
                pdf = %written.pdf.display(),
                "Done"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(%err, "Scan failed");
            eprintln!("{}", humanize_error(&err));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<Written> {
    let mut config = match &cli.config {
        Some(path) => ScanConfig::load(path)?,
        None => ScanConfig::default(),
    };
    if cli.binarize {
        config.binarize = true;
    }

    // Scan first: a failed scan must not leave any output behind.
    let scanner = Scanner::new(config.clone())?;
    let page = scanner.scan_path(&cli.image)?;

    let layout = OutputLayout::new(&cli.output_dir);
    let scan_path = layout.scan_image(&cli.image);
    let stored = ImageProcessor::from_dynamic(DynamicImage::ImageLuma8(page))
        .limit_height(config.storage_height);
    stored.save(&scan_path)?;
    let page = stored.into_dynamic();

    let lines = recognize(cli, &page)?;

    let text_path = match &lines {
        Some(lines) => {
            let text = join_lines(lines);
            let path = layout.text(&cli.image);
            std::fs::write(&path, &text)?;
            println!("Scan Text Result:");
            println!("{text}");
            Some(path)
        }
        None => None,
    };

    let pdf_path = layout.pdf(&cli.image);
    PdfWriter::from_config(&config)
        .with_title(stem(&cli.image))
        .write_to_file(&page.to_luma8(), lines.as_deref().unwrap_or_default(), &pdf_path)?;

    Ok(Written {
        scan: scan_path,
        text: text_path,
        pdf: pdf_path,
    })
}

/// Read the page's text. `None` when this build has no OCR engine.
#[cfg(feature = "ocr")]
fn recognize(cli: &Cli, page: &DynamicImage) -> Result<Option<Vec<RecognizedLine>>> {
    use pagescan_document::{OcrEngine, TextRecognizer};

    let engine = match &cli.models {
        Some(dir) => OcrEngine::from_model_dir(dir)?,
        None => OcrEngine::with_defaults()?,
    };
    engine.recognize(page).map(Some)
}

#[cfg(not(feature = "ocr"))]
fn recognize(cli: &Cli, _page: &DynamicImage) -> Result<Option<Vec<RecognizedLine>>> {
    tracing::warn!(
        models = ?cli.models.as_deref().map(std::path::Path::display),
        "Built without the `ocr` feature: no text file or PDF text layer will be produced"
    );
    Ok(None)
}
