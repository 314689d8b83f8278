//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod batch;
mod check;
mod extract;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "docsift")]
#[command(about = "Extract text from PDF, DOCX, CSV and XLSX documents with OCR fallback")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Resolve relative paths from current working directory instead of config file location
    #[arg(long, global = true)]
    cwd: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text from a single document
    Extract {
        /// PDF, DOCX, CSV or XLSX file
        file: PathBuf,
        /// Skip the OCR fallback
        #[arg(long)]
        no_ocr: bool,
        /// Print the full JSON sidecar document instead of the text
        #[arg(long)]
        json: bool,
    },

    /// Extract every document in a directory and write JSON sidecars
    Batch {
        /// Input directory (defaults to the configured input_dir)
        input_dir: Option<PathBuf>,
        /// Output directory for sidecars (defaults to the configured output_dir)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Number of extraction workers
        #[arg(short, long)]
        workers: Option<usize>,
        /// Domain/category structure JSON; crawls DOMAIN/CATEGORY folders
        #[arg(short, long)]
        labels: Option<PathBuf>,
        /// Skip the OCR fallback
        #[arg(long)]
        no_ocr: bool,
    },

    /// Show parser and OCR tool status
    Check,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        use_cwd: cli.cwd,
    };
    let (mut settings, _config) = load_settings_with_options(options).await;

    match cli.command {
        Commands::Extract { file, no_ocr, json } => {
            if no_ocr {
                settings.extraction.ocr_enabled = false;
            }
            extract::cmd_extract(&settings, &file, json).await
        }
        Commands::Batch {
            input_dir,
            output_dir,
            workers,
            labels,
            no_ocr,
        } => {
            if let Some(path) = labels {
                settings.label_structure = Some(path);
            }
            if let Some(dir) = input_dir {
                settings.input_dir = dir;
            }
            if let Some(dir) = output_dir {
                settings.output_dir = dir;
            }
            if let Some(workers) = workers {
                settings.workers = workers.max(1);
            }
            if no_ocr {
                settings.extraction.ocr_enabled = false;
            }
            batch::cmd_batch(&settings).await
        }
        Commands::Check => check::cmd_check(&settings).await,
    }
}
