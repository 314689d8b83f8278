//! Tool availability check.

use console::style;

use crate::config::Settings;
use crate::ocr::{check_tools, OcrBackend, TesseractBackend};

/// Show which parser and OCR tools are installed.
pub async fn cmd_check(settings: &Settings) -> anyhow::Result<()> {
    println!("\n{}", style("Tool Status").bold());
    println!("{}", "-".repeat(50));

    let mut all_found = true;
    for (tool, path) in check_tools() {
        match path {
            Some(path) => println!(
                "  {:<15} {} {}",
                tool,
                style("✓ found").green(),
                style(path.display()).dim()
            ),
            None => {
                all_found = false;
                println!("  {:<15} {}", tool, style("✗ not found").red());
            }
        }
    }

    let config = settings.extraction.ocr.clone();
    println!("\n{}", style("OCR:").cyan());
    println!("  {:<15} {}", "Configured", config.languages.join("+"));

    let initialized = tokio::task::spawn_blocking(move || TesseractBackend::initialize(&config))
        .await?;
    match initialized {
        Ok(backend) => println!(
            "  {:<15} {}",
            "Languages",
            style(backend.languages()).green()
        ),
        Err(e) => println!("  {:<15} {}", "Languages", style(e).red()),
    }

    if !settings.extraction.ocr_enabled {
        println!("  {}", style("OCR fallback disabled in config").yellow());
    }

    if !all_found {
        println!(
            "\n{} Install missing tools: apt install poppler-utils tesseract-ocr",
            style("!").yellow()
        );
    }

    Ok(())
}
