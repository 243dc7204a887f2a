//! MIME type detection and classification for uploads.

/// Sniff the MIME type from file content.
pub fn sniff(bytes: &[u8]) -> Option<&'static str> {
    infer::get(bytes).map(|t| t.mime_type())
}

/// Whether this MIME type is a PDF document.
pub fn is_pdf(mime: &str) -> bool {
    mime.eq_ignore_ascii_case("application/pdf")
}

/// Whether this MIME type is a supported raster image upload.
pub fn is_raster_image(mime: &str) -> bool {
    matches!(
        mime.to_ascii_lowercase().as_str(),
        "image/png" | "image/jpeg"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_png() {
        let png_magic = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert_eq!(sniff(&png_magic), Some("image/png"));
    }

    #[test]
    fn test_sniff_pdf() {
        assert_eq!(sniff(b"%PDF-1.7 rest of file"), Some("application/pdf"));
    }

    #[test]
    fn test_sniff_unknown() {
        assert_eq!(sniff(b"hello world"), None);
    }

    #[test]
    fn test_classification() {
        assert!(is_pdf("application/pdf"));
        assert!(!is_pdf("image/png"));
        assert!(is_raster_image("image/png"));
        assert!(is_raster_image("image/jpeg"));
        assert!(!is_raster_image("image/gif"));
        assert!(!is_raster_image("application/pdf"));
    }
}
