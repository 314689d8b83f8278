//! Embedded image extraction from DOCX containers.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use super::backend::OcrError;

const MEDIA_PREFIX: &str = "word/media/";

/// Image formats Tesseract can read.
fn is_ocr_image(name: &str) -> bool {
    let ext = name.rsplit('.').next().unwrap_or("").to_lowercase();
    matches!(
        ext.as_str(),
        "png" | "jpg" | "jpeg" | "gif" | "bmp" | "tif" | "tiff"
    )
}

/// Turn an archive entry name into a safe file name.
fn sanitize_filename(entry_path: &str) -> String {
    let filename = entry_path
        .rsplit('/')
        .next()
        .unwrap_or(entry_path)
        .replace('\\', "_")
        .replace("..", "_")
        .trim_start_matches('.')
        .to_string();

    if filename.is_empty() {
        "extracted_image".to_string()
    } else {
        filename
    }
}

/// Names of the embedded images under `word/media/`, sorted by name.
pub fn list_media_images(docx_path: &Path) -> Result<Vec<String>, OcrError> {
    let archive = ZipArchive::new(File::open(docx_path)?)?;

    let mut names: Vec<String> = archive
        .file_names()
        .filter(|name| name.starts_with(MEDIA_PREFIX) && is_ocr_image(name))
        .map(str::to_string)
        .collect();
    names.sort();
    Ok(names)
}

/// Copy one embedded image into `output_dir`.
pub fn extract_media_image(
    docx_path: &Path,
    entry_path: &str,
    output_dir: &Path,
) -> Result<PathBuf, OcrError> {
    let mut archive = ZipArchive::new(File::open(docx_path)?)?;
    let mut entry = archive.by_name(entry_path)?;

    let file_path = output_dir.join(sanitize_filename(entry_path));
    let mut outfile = File::create(&file_path)?;
    io::copy(&mut entry, &mut outfile)?;

    Ok(file_path)
}
