//! Document assembly: drive every page through preprocessing and the active
//! backend, filter fragments by confidence, and concatenate labeled page
//! sections into the final transcription.

use tracing::warn;

use super::backend::{Fragment, OcrBackend, OcrError};
use super::pages::Document;
use super::preprocess::{self, PreprocessStrategy};
use crate::config::Settings;

/// Outcome of processing one page.
#[derive(Debug)]
pub struct PageOutcome {
    pub index: u32,
    pub status: PageStatus,
    /// Every fragment the backend emitted, before threshold filtering.
    /// Annotation previews draw all detections; only the text output
    /// respects the confidence threshold.
    pub fragments: Vec<Fragment>,
}

impl PageOutcome {
    pub fn failed(&self) -> bool {
        matches!(self.status, PageStatus::Failed(_))
    }
}

/// Per-page status in the final report.
#[derive(Debug)]
pub enum PageStatus {
    /// Backend ran; `kept` fragments passed the confidence threshold,
    /// `dropped` did not.
    Extracted { kept: usize, dropped: usize },
    /// Backend call failed; the error is isolated to this page.
    Failed(OcrError),
}

/// Final transcription plus the per-page report.
///
/// Every paginated page appears in `outcomes`: failed pages carry their
/// error instead of silently vanishing from the output text.
#[derive(Debug)]
pub struct Transcription {
    pub text: String,
    pub outcomes: Vec<PageOutcome>,
}

impl Transcription {
    /// Pages whose backend call failed.
    pub fn failures(&self) -> impl Iterator<Item = &PageOutcome> {
        self.outcomes.iter().filter(|o| o.failed())
    }

    pub fn failed_page_count(&self) -> usize {
        self.failures().count()
    }

    /// Whether every page produced text without error.
    pub fn is_complete(&self) -> bool {
        self.failed_page_count() == 0
    }
}

/// Assemble a document into a transcription.
///
/// Fatal errors (configuration, format, conversion) return `Err` and halt
/// the request; backend failures on individual pages are recorded in the
/// transcription and do not stop the remaining pages.
pub fn assemble(
    document: &Document,
    backend: &dyn OcrBackend,
    settings: &Settings,
) -> Result<Transcription, OcrError> {
    assemble_with_progress(document, backend, settings, |_| {})
}

/// Like [`assemble`], invoking `on_page` after each page completes.
pub fn assemble_with_progress(
    document: &Document,
    backend: &dyn OcrBackend,
    settings: &Settings,
    mut on_page: impl FnMut(&PageOutcome),
) -> Result<Transcription, OcrError> {
    let strategy = PreprocessStrategy::for_backend(backend.kind(), settings.preprocess);

    let mut sections: Vec<String> = Vec::with_capacity(document.page_count());
    let mut outcomes: Vec<PageOutcome> = Vec::with_capacity(document.page_count());

    for page in document.pages() {
        let prepared = preprocess::preprocess(page, strategy);

        let outcome = match backend.extract(&prepared, settings) {
            Ok(result) => {
                let kept: Vec<&Fragment> = result
                    .fragments
                    .iter()
                    .filter(|f| f.passes(settings.confidence_threshold))
                    .collect();
                let dropped = result.fragments.len() - kept.len();

                let body = kept
                    .iter()
                    .map(|f| f.text.trim_end())
                    .collect::<Vec<_>>()
                    .join("\n");

                let mut section = format!("--- PAGE {} ---", page.index);
                if !body.trim().is_empty() {
                    section.push('\n');
                    section.push_str(&body);
                }
                sections.push(section);

                PageOutcome {
                    index: page.index,
                    status: PageStatus::Extracted {
                        kept: kept.len(),
                        dropped,
                    },
                    fragments: result.fragments,
                }
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("page {} extraction failed: {}", page.index, e);
                PageOutcome {
                    index: page.index,
                    status: PageStatus::Failed(e),
                    fragments: Vec::new(),
                }
            }
        };

        on_page(&outcome);
        outcomes.push(outcome);
    }

    let mut text = sections.join("\n\n");
    if !text.is_empty() {
        text.push('\n');
    }

    Ok(Transcription { text, outcomes })
}
