//! Backend and tool availability checks.

use console::style;

use crate::ocr::{check_binary, GroqBackend, OcrBackend, TesseractBackend};

pub async fn cmd_check() -> anyhow::Result<()> {
    println!("\n{}", style("Extraction Tool Status").bold());
    println!("{}", "-".repeat(50));

    println!("\n{}", style("PDF tools:").cyan());
    let pdftoppm_status = if check_binary("pdftoppm") {
        style("✓ found").green()
    } else {
        style("✗ not found").red()
    };
    println!("  {:<15} {}", "pdftoppm", pdftoppm_status);

    println!("\n{}", style("Backends:").cyan());

    let tesseract = TesseractBackend::new();
    let tesseract_status = if tesseract.is_available() {
        style("✓ available").green()
    } else {
        style("✗ not available").red()
    };
    println!("  {:<15} {}", "tesseract", tesseract_status);
    if !tesseract.is_available() {
        println!("                  {}", style(tesseract.availability_hint()).dim());
    }

    #[cfg(feature = "ocr-paddle")]
    {
        use crate::ocr::PaddleBackend;
        let paddle = PaddleBackend::new();
        let paddle_status = if paddle.is_available() {
            style("✓ available").green()
        } else {
            style("○ models will auto-download").yellow()
        };
        println!("  {:<15} {}", "paddleocr", paddle_status);
        println!("                  {}", style(paddle.availability_hint()).dim());
    }
    #[cfg(not(feature = "ocr-paddle"))]
    {
        println!(
            "  {:<15} {}",
            "paddleocr",
            style("not compiled (enable ocr-paddle feature)").dim()
        );
    }

    let groq = GroqBackend::new();
    let groq_status = if groq.is_available() {
        style("✓ available").green()
    } else {
        style("○ no API key").yellow()
    };
    println!("  {:<15} {}", "groq", groq_status);
    if !groq.is_available() {
        println!("                  {}", style(groq.availability_hint()).dim());
    }

    println!();
    if check_binary("pdftoppm") && tesseract.is_available() {
        println!(
            "{} Default pipeline (PDF + tesseract) is ready",
            style("✓").green()
        );
    } else {
        println!(
            "{} Some tools are missing. Install them for full support:",
            style("!").yellow()
        );
        println!("  - pdftoppm: poppler-utils package");
        println!("  - tesseract: tesseract-ocr package");
    }

    Ok(())
}
