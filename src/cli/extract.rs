//! Transcription command: file in, labeled plain text out.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use sha2::{Digest, Sha256};

use crate::config::{FileConfig, SegmentationMode, Settings};
use crate::ocr::{self, BackendKind, PageStatus, Transcription};

#[derive(Args)]
pub struct ExtractArgs {
    /// File to transcribe (PNG, JPEG, or PDF)
    pub file: PathBuf,

    /// Extraction backend: tesseract, paddleocr, or groq
    #[arg(short, long)]
    pub backend: Option<String>,

    /// Recognition language (repeatable)
    #[arg(short, long = "lang")]
    pub languages: Vec<String>,

    /// Confidence threshold in [0, 1]; fragments scoring below it are
    /// excluded from the text output
    #[arg(short, long)]
    pub threshold: Option<f32>,

    /// Disable image preprocessing
    #[arg(long)]
    pub no_preprocess: bool,

    /// Page segmentation mode: auto, auto-osd, single-column, single-block,
    /// single-line, sparse-text
    #[arg(long)]
    pub psm: Option<String>,

    /// Rasterization DPI for PDF pages
    #[arg(long)]
    pub dpi: Option<u32>,

    /// Pages to process, e.g. "1,3,5-10" (PDF only)
    #[arg(long)]
    pub pages: Option<String>,

    /// Write the transcription to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write annotated page previews into this directory
    #[arg(long)]
    pub annotate_dir: Option<PathBuf>,

    /// Vision model override for the groq backend
    #[arg(long)]
    pub model: Option<String>,
}

pub async fn cmd_extract(args: ExtractArgs, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let settings = build_settings(&args, config_path)?;
    settings.validate()?;

    let upload = std::fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let content_hash = format!("{:x}", Sha256::digest(&upload));

    let backend = settings.backend.create()?;

    // Configuration problems halt here, before any page is touched.
    if !backend.is_available() {
        anyhow::bail!("{}", backend.availability_hint());
    }

    println!(
        "{} {} ({} bytes, sha256 {})",
        style("→").cyan(),
        args.file.display(),
        upload.len(),
        &content_hash[..8]
    );
    println!(
        "  backend: {}  languages: {}  threshold: {}",
        settings.backend,
        settings.languages.join("+"),
        settings.confidence_threshold
    );

    let run_settings = settings.clone();
    let pages_arg = args.pages.clone();

    let (document, transcription) = tokio::task::spawn_blocking(
        move || -> anyhow::Result<(ocr::Document, Transcription)> {
            let mut document = ocr::paginate(&upload, None, run_settings.dpi)?;

            if let Some(range) = pages_arg {
                let indices = parse_page_range(&range, document.page_count() as u32);
                if indices.is_empty() {
                    anyhow::bail!("page range '{}' selects no pages", range);
                }
                document = document.subset(&indices);
            }

            let progress = ProgressBar::new(document.page_count() as u64);
            progress.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
                    .unwrap()
                    .progress_chars("█▓░"),
            );
            progress.set_message(if run_settings.backend.is_remote() {
                "Calling vision API..."
            } else {
                "Extracting text..."
            });

            let transcription = ocr::assemble_with_progress(
                &document,
                backend.as_ref(),
                &run_settings,
                |outcome| {
                    progress.inc(1);
                    if outcome.failed() {
                        progress.set_message(format!("page {} failed", outcome.index));
                    }
                },
            )?;
            progress.finish_and_clear();

            Ok((document, transcription))
        },
    )
    .await??;

    print_page_report(&transcription);

    if let Some(dir) = &args.annotate_dir {
        write_annotated_pages(dir, &document, &transcription)?;
    }

    if transcription.outcomes.iter().all(|o| o.failed()) {
        anyhow::bail!("extraction failed on every page");
    }

    match &args.output {
        Some(path) => {
            std::fs::write(path, &transcription.text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!(
                "{} transcription saved to {} ({})",
                style("✓").green(),
                path.display(),
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
            );
        }
        None => {
            println!();
            print!("{}", transcription.text);
        }
    }

    Ok(())
}

/// Resolve settings: defaults, then the config file, then CLI flags.
fn build_settings(args: &ExtractArgs, config_path: Option<PathBuf>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let file = match config_path {
        Some(path) => Some(
            FileConfig::load(&path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
        ),
        None => FileConfig::discover()
            .map(|path| FileConfig::load(&path))
            .transpose()?,
    };
    if let Some(file) = file {
        file.apply(&mut settings)?;
    }

    if let Some(backend) = &args.backend {
        settings.backend = BackendKind::from_str(backend).ok_or_else(|| {
            anyhow::anyhow!(
                "unknown backend '{}' (expected tesseract, paddleocr, or groq)",
                backend
            )
        })?;
    }
    if !args.languages.is_empty() {
        settings.languages = args.languages.clone();
    }
    if let Some(threshold) = args.threshold {
        settings.confidence_threshold = threshold;
    }
    if args.no_preprocess {
        settings.preprocess = false;
    }
    if let Some(psm) = &args.psm {
        settings.segmentation = SegmentationMode::from_str(psm)
            .ok_or_else(|| anyhow::anyhow!("unknown segmentation mode '{}'", psm))?;
    }
    if let Some(dpi) = args.dpi {
        settings.dpi = dpi;
    }
    if let Some(model) = &args.model {
        settings.vision_model = model.clone();
    }

    Ok(settings)
}

/// Print the per-page outcome table. Failed pages are reported, never
/// silently absent.
fn print_page_report(transcription: &Transcription) {
    println!();
    for outcome in &transcription.outcomes {
        match &outcome.status {
            PageStatus::Extracted { kept, dropped } => {
                if *dropped > 0 {
                    println!(
                        "  {} page {}: {} fragments kept, {} below threshold",
                        style("✓").green(),
                        outcome.index,
                        kept,
                        dropped
                    );
                } else {
                    println!(
                        "  {} page {}: {} fragments",
                        style("✓").green(),
                        outcome.index,
                        kept
                    );
                }
            }
            PageStatus::Failed(e) => {
                println!("  {} page {}: {}", style("✗").red(), outcome.index, e);
            }
        }
    }

    let failed = transcription.failed_page_count();
    if failed > 0 {
        println!(
            "  {} {} of {} pages failed",
            style("!").yellow(),
            failed,
            transcription.outcomes.len()
        );
    }
}

/// Write annotated previews for pages whose backend reported geometry.
fn write_annotated_pages(
    dir: &Path,
    document: &ocr::Document,
    transcription: &Transcription,
) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)?;

    let mut written = 0usize;
    for outcome in &transcription.outcomes {
        if !outcome.fragments.iter().any(|f| f.region.is_some()) {
            continue;
        }
        let Some(page) = document.pages().iter().find(|p| p.index == outcome.index) else {
            continue;
        };
        let canvas = ocr::annotate_page(page, &outcome.fragments);
        let path = dir.join(format!("page-{}.png", outcome.index));
        canvas
            .save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        written += 1;
    }

    if written > 0 {
        println!(
            "  {} wrote {} annotated page previews to {}",
            style("✓").green(),
            written,
            dir.display()
        );
    }
    Ok(())
}

/// Parse a page range string like "1", "1-5", "1,3,5-10" into a sorted list
/// of page numbers within [1, max_pages].
fn parse_page_range(range_str: &str, max_pages: u32) -> Vec<u32> {
    let mut pages = Vec::new();

    for part in range_str.split(',') {
        let part = part.trim();
        if part.contains('-') {
            let mut iter = part.split('-');
            let start: u32 = iter.next().and_then(|s| s.trim().parse().ok()).unwrap_or(1);
            let end: u32 = iter
                .next()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(max_pages);
            for p in start..=end.min(max_pages) {
                if p >= 1 && !pages.contains(&p) {
                    pages.push(p);
                }
            }
        } else if let Ok(p) = part.parse::<u32>() {
            if p >= 1 && p <= max_pages && !pages.contains(&p) {
                pages.push(p);
            }
        }
    }

    pages.sort();
    pages
}
