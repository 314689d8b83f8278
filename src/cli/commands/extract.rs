//! Single-document extraction command.

use std::path::Path;

use console::style;

use crate::config::Settings;
use crate::models::ExtractionMethod;
use crate::services::{ExtractionOrchestrator, LabelStructure, SidecarDocument};

/// Extract one document and print its text (or its sidecar JSON).
pub async fn cmd_extract(settings: &Settings, file: &Path, json: bool) -> anyhow::Result<()> {
    let orchestrator = ExtractionOrchestrator::new(&settings.extraction);
    let path = file.to_path_buf();

    let result = tokio::task::spawn_blocking(move || orchestrator.run(&path)).await?;

    if !result.is_success() {
        eprintln!(
            "{} {}: {}",
            style("✗").red(),
            result.source_file(),
            result.error_message().unwrap_or_default()
        );
        anyhow::bail!("Extraction failed for {}", file.display());
    }

    if json {
        let labels = match settings.label_structure {
            Some(ref path) => LabelStructure::load(path)?.labels_for(file),
            None => None,
        };
        let document = SidecarDocument::from_result(&result, file)?.with_labels(labels);
        println!("{}", document.to_json()?);
        return Ok(());
    }

    let method = result.method().unwrap_or(ExtractionMethod::Native);
    eprintln!(
        "{} {} ({} chars via {}{})",
        style("✓").green(),
        result.source_file(),
        result.content_length(),
        method.as_str(),
        result
            .quality_score()
            .map(|score| format!(", quality {}", score))
            .unwrap_or_default()
    );
    println!("{}", result.content());

    Ok(())
}
