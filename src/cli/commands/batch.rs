//! Directory batch extraction command.

use std::sync::Arc;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use crate::config::Settings;
use crate::models::ExtractionMethod;
use crate::services::{
    discover_documents, BatchEvent, BatchService, BatchSummary, ExtractionOrchestrator,
    LabelStructure, SidecarWriter,
};

/// Extract every document in the input directory, writing sidecars.
pub async fn cmd_batch(settings: &Settings) -> anyhow::Result<()> {
    let input_dir = &settings.input_dir;
    if !input_dir.is_dir() {
        anyhow::bail!("Input directory not found: {}", input_dir.display());
    }

    let labels = match settings.label_structure {
        Some(ref path) => Some(Arc::new(LabelStructure::load(path)?)),
        None => None,
    };

    let files = match labels {
        Some(ref structure) => structure.discover(input_dir)?,
        None => discover_documents(input_dir)?,
    };
    if files.is_empty() {
        println!(
            "{} No documents found in {}",
            style("!").yellow(),
            input_dir.display()
        );
        return Ok(());
    }

    println!(
        "{} Input: {}  Output: {}  Workers: {}  OCR: {}",
        style("→").cyan(),
        input_dir.display(),
        settings.output_dir.display(),
        settings.workers,
        if settings.extraction.ocr_enabled {
            "on"
        } else {
            "off"
        }
    );

    if let Some(ref structure) = labels {
        println!(
            "{} Labels: {} domains, {} categories",
            style("→").cyan(),
            structure.domain_count(),
            structure.category_count()
        );
    }

    let orchestrator = Arc::new(ExtractionOrchestrator::new(&settings.extraction));
    let writer = SidecarWriter::new(&settings.output_dir).with_input_root(input_dir);
    let mut service = BatchService::new(orchestrator).with_writer(writer);
    if let Some(structure) = labels {
        service = service.with_labels(structure);
    }

    let (event_tx, mut event_rx) = mpsc::channel::<BatchEvent>(100);

    let event_handler = tokio::spawn(async move {
        let mut progress: Option<ProgressBar> = None;

        while let Some(event) = event_rx.recv().await {
            match event {
                BatchEvent::Started { total_documents } => {
                    let pb = ProgressBar::new(total_documents as u64);
                    pb.set_style(
                        ProgressStyle::default_bar()
                            .template(
                                "{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}",
                            )
                            .unwrap_or_else(|_| ProgressStyle::default_bar())
                            .progress_chars("█▓░"),
                    );
                    pb.set_message("Extracting text...");
                    progress = Some(pb);
                }
                BatchEvent::DocumentStarted { source_file } => {
                    if let Some(ref pb) = progress {
                        pb.set_message(source_file);
                    }
                }
                BatchEvent::DocumentCompleted {
                    source_file,
                    method,
                    ..
                } => {
                    if let Some(ref pb) = progress {
                        if method == ExtractionMethod::Ocr {
                            pb.println(format!(
                                "  {} {} (improved by OCR)",
                                style("✓").green(),
                                source_file
                            ));
                        }
                        pb.inc(1);
                    }
                }
                BatchEvent::DocumentFailed { source_file, error }
                | BatchEvent::SidecarFailed { source_file, error } => {
                    if let Some(ref pb) = progress {
                        pb.println(format!(
                            "  {} {}: {}",
                            style("✗").red(),
                            source_file,
                            error
                        ));
                        pb.inc(1);
                    }
                }
                BatchEvent::Finished { .. } => {
                    if let Some(pb) = progress.take() {
                        pb.finish_and_clear();
                    }
                }
            }
        }
    });

    let summary = service.process(files, settings.workers, event_tx).await?;

    // Wait for event handler to finish
    let _ = event_handler.await;

    print_report(&summary);

    if !summary.all_succeeded() {
        anyhow::bail!("{} of {} documents failed", summary.failed, summary.total);
    }
    Ok(())
}

fn print_report(summary: &BatchSummary) {
    println!("\n{}", style("Extraction Report").bold());
    println!("{}", "-".repeat(50));
    println!("  {:<18} {}", "Total:", summary.total);
    println!(
        "  {:<18} {}",
        "Succeeded:",
        style(summary.succeeded).green()
    );
    let failed = if summary.failed > 0 {
        style(summary.failed).red()
    } else {
        style(summary.failed).dim()
    };
    println!("  {:<18} {}", "Failed:", failed);
    println!("  {:<18} {}", "Improved by OCR:", summary.ocr_improved);
    println!(
        "  {:<18} {:.1}s",
        "Elapsed:",
        summary.elapsed.as_secs_f64()
    );
    println!("  {:<18} {:.1}%", "Success rate:", summary.success_rate());

    if !summary.failures.is_empty() {
        println!("\n{}", style("Failed files:").cyan());
        for (file, error) in &summary.failures {
            println!("  {} {}: {}", style("✗").red(), file, error);
        }
    }
}
