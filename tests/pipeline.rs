//! End-to-end pipeline tests using a stub extraction backend.
//!
//! Exercises pagination, preprocessing selection, confidence filtering and
//! assembly through the public API, without network access or external
//! binaries.

use std::sync::Mutex;
use std::time::Instant;

use image::{DynamicImage, Rgb, RgbImage};

use handscribe::config::Settings;
use handscribe::ocr::{
    assemble, paginate, BackendKind, Document, ExtractionResult, Fragment, OcrBackend, OcrError,
    Page,
};

enum StubPage {
    Fragments(Vec<Fragment>),
    Unavailable,
}

/// Deterministic backend that replays scripted fragments per page and
/// records the pixel bytes it was handed.
struct StubBackend {
    script: Vec<StubPage>,
    seen_pages: Mutex<Vec<Vec<u8>>>,
}

impl StubBackend {
    fn new(script: Vec<StubPage>) -> Self {
        Self {
            script,
            seen_pages: Mutex::new(Vec::new()),
        }
    }
}

impl OcrBackend for StubBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Tesseract
    }

    fn is_available(&self) -> bool {
        true
    }

    fn availability_hint(&self) -> String {
        "stub backend is always available".to_string()
    }

    fn extract(&self, page: &Page, _settings: &Settings) -> Result<ExtractionResult, OcrError> {
        self.seen_pages
            .lock()
            .unwrap()
            .push(page.image.as_bytes().to_vec());

        match &self.script[(page.index - 1) as usize] {
            StubPage::Fragments(fragments) => Ok(ExtractionResult::timed(
                fragments.clone(),
                self.kind(),
                None,
                Instant::now(),
            )),
            StubPage::Unavailable => Err(OcrError::BackendUnavailable(
                "stubbed outage".to_string(),
            )),
        }
    }
}

fn png_upload() -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb([240, 240, 240])));
    let mut buf = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn synthetic_document(pages: usize) -> Document {
    Document::from_pages(
        (1..=pages)
            .map(|i| Page {
                index: i as u32,
                image: DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([255, 255, 255]))),
            })
            .collect(),
    )
}

fn scored(text: &str, confidence: f32) -> Fragment {
    Fragment {
        text: text.to_string(),
        confidence: Some(confidence),
        region: None,
    }
}

fn settings(threshold: f32, preprocess: bool) -> Settings {
    Settings {
        confidence_threshold: threshold,
        preprocess,
        ..Settings::default()
    }
}

#[test]
fn png_upload_becomes_single_page_transcription() {
    let doc = paginate(&png_upload(), None, 300).unwrap();
    assert_eq!(doc.page_count(), 1);
    assert_eq!(doc.pages()[0].index, 1);

    let backend = StubBackend::new(vec![StubPage::Fragments(vec![Fragment::plain(
        "the quick brown fox\n",
    )])]);
    let result = assemble(&doc, &backend, &settings(0.2, false)).unwrap();
    assert_eq!(result.text, "--- PAGE 1 ---\nthe quick brown fox\n");
    assert!(result.is_complete());
}

#[test]
fn disabled_preprocessing_hands_backend_original_pixels() {
    let upload = png_upload();
    let doc = paginate(&upload, Some("image/png"), 300).unwrap();
    let original = doc.pages()[0].image.as_bytes().to_vec();

    let backend = StubBackend::new(vec![StubPage::Fragments(vec![Fragment::plain("x")])]);
    assemble(&doc, &backend, &settings(0.2, false)).unwrap();

    let seen = backend.seen_pages.lock().unwrap();
    assert_eq!(seen[0], original);
}

#[test]
fn confidence_threshold_drops_text_but_keeps_label() {
    let doc = synthetic_document(3);
    let backend = StubBackend::new(vec![
        StubPage::Fragments(vec![scored("page one text", 0.9)]),
        StubPage::Fragments(vec![scored("too faint", 0.3), scored("also faint", 0.1)]),
        StubPage::Fragments(vec![scored("page three text", 0.7)]),
    ]);

    let result = assemble(&doc, &backend, &settings(0.5, false)).unwrap();

    assert_eq!(
        result.text,
        "--- PAGE 1 ---\npage one text\n\n--- PAGE 2 ---\n\n--- PAGE 3 ---\npage three text\n"
    );
    // the page-2 section exists but carries no text lines
    let page2 = result
        .text
        .split("--- PAGE 2 ---")
        .nth(1)
        .unwrap()
        .split("--- PAGE 3 ---")
        .next()
        .unwrap();
    assert!(page2.trim().is_empty());
}

#[test]
fn unscored_fragments_always_pass_the_filter() {
    let doc = synthetic_document(1);
    let backend = StubBackend::new(vec![StubPage::Fragments(vec![
        Fragment::plain("whole page"),
        scored("noise", 0.01),
    ])]);

    let result = assemble(&doc, &backend, &settings(1.0, false)).unwrap();
    assert_eq!(result.text, "--- PAGE 1 ---\nwhole page\n");
}

#[test]
fn backend_outage_on_one_page_does_not_abort_the_batch() {
    let doc = synthetic_document(3);
    let backend = StubBackend::new(vec![
        StubPage::Fragments(vec![Fragment::plain("one")]),
        StubPage::Unavailable,
        StubPage::Fragments(vec![Fragment::plain("three")]),
    ]);

    let result = assemble(&doc, &backend, &settings(0.2, false)).unwrap();

    assert_eq!(result.text, "--- PAGE 1 ---\none\n\n--- PAGE 3 ---\nthree\n");
    assert_eq!(result.failed_page_count(), 1);
    assert_eq!(result.failures().next().unwrap().index, 2);
}

#[test]
fn identical_input_and_settings_yield_identical_output() {
    let doc = synthetic_document(2);
    let script = || {
        StubBackend::new(vec![
            StubPage::Fragments(vec![scored("alpha", 0.8), scored("beta", 0.1)]),
            StubPage::Fragments(vec![Fragment::plain("gamma")]),
        ])
    };

    let settings = settings(0.2, false);
    let first = assemble(&doc, &script(), &settings).unwrap();
    let second = assemble(&doc, &script(), &settings).unwrap();
    assert_eq!(first.text, second.text);
}

#[test]
fn labels_cover_every_processed_page_in_order() {
    let doc = synthetic_document(5);
    let backend = StubBackend::new(
        (0..5)
            .map(|i| StubPage::Fragments(vec![Fragment::plain(format!("page {}", i + 1))]))
            .collect(),
    );

    let result = assemble(&doc, &backend, &settings(0.2, false)).unwrap();

    let labels: Vec<&str> = result
        .text
        .lines()
        .filter(|l| l.starts_with("--- PAGE"))
        .collect();
    assert_eq!(
        labels,
        vec![
            "--- PAGE 1 ---",
            "--- PAGE 2 ---",
            "--- PAGE 3 ---",
            "--- PAGE 4 ---",
            "--- PAGE 5 ---"
        ]
    );
}

#[test]
fn unsupported_upload_halts_before_extraction() {
    let err = paginate(b"PK\x03\x04 zip archive bytes", None, 300).unwrap_err();
    assert!(matches!(err, OcrError::UnsupportedFormat(_)));
    assert!(err.is_fatal());
}
