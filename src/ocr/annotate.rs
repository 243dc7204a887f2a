//! Annotated page previews: bounding boxes drawn around detected fragments.
//!
//! Every detection is drawn, including fragments the confidence threshold
//! excluded from the text output; the preview shows what the detector saw,
//! the text shows what passed the filter.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;

use super::backend::Fragment;
use super::pages::Page;

/// Confidence above which a box is drawn in the high-confidence color.
pub const HIGH_CONFIDENCE: f32 = 0.5;

const HIGH_COLOR: Rgb<u8> = Rgb([0, 170, 0]);
const LOW_COLOR: Rgb<u8> = Rgb([200, 30, 30]);

/// Draw each fragment's bounding quadrilateral onto a copy of the page
/// image, color-coded by confidence. Fragments without geometry are
/// skipped.
pub fn annotate_page(page: &Page, fragments: &[Fragment]) -> RgbImage {
    let mut canvas = page.image.to_rgb8();

    for fragment in fragments {
        let Some(region) = fragment.region else {
            continue;
        };
        let color = if fragment.confidence.map_or(false, |c| c > HIGH_CONFIDENCE) {
            HIGH_COLOR
        } else {
            LOW_COLOR
        };
        for i in 0..4 {
            let start = region[i];
            let end = region[(i + 1) % 4];
            draw_line_segment_mut(&mut canvas, start, end, color);
        }
    }

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;

    fn white_page() -> Page {
        Page {
            index: 1,
            image: DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 20, Rgb([255, 255, 255]))),
        }
    }

    fn boxed(confidence: f32) -> Fragment {
        Fragment {
            text: "x".to_string(),
            confidence: Some(confidence),
            region: Some([(2.0, 2.0), (12.0, 2.0), (12.0, 12.0), (2.0, 12.0)]),
        }
    }

    #[test]
    fn test_high_confidence_drawn_green() {
        let canvas = annotate_page(&white_page(), &[boxed(0.9)]);
        assert_eq!(*canvas.get_pixel(6, 2), HIGH_COLOR);
    }

    #[test]
    fn test_low_confidence_drawn_red() {
        let canvas = annotate_page(&white_page(), &[boxed(0.3)]);
        assert_eq!(*canvas.get_pixel(6, 2), LOW_COLOR);
    }

    #[test]
    fn test_fragment_without_region_leaves_page_untouched() {
        let canvas = annotate_page(&white_page(), &[Fragment::plain("no box")]);
        assert!(canvas.pixels().all(|&p| p == Rgb([255, 255, 255])));
    }
}
