//! OCR as a fallback text source.
//!
//! [`OcrProvider`] never fails: every internal error is logged and turned
//! into an empty string, which the orchestrator reads as "OCR did not help".

use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use tempfile::TempDir;

use super::archive::{extract_media_image, list_media_images};
use super::backend::{regions_to_text, OcrBackend, OcrConfig, OcrError};
use super::pdf_utils::{PageRenderer, PopplerRenderer};
use super::tesseract::TesseractBackend;
use crate::extract::DocumentFormat;

/// Separator between page (or image) texts.
const PAGE_SEPARATOR: &str = "\n\n";

/// Source of OCR text for a document.
pub trait OcrProvider: Send + Sync {
    /// Whether an OCR engine can be used at all.
    fn available(&self) -> bool;

    /// OCR the document. Returns an empty string on any failure.
    fn extract(&self, path: &Path, max_pages: usize) -> String;
}

type BackendFactory = dyn Fn(&OcrConfig) -> Result<Arc<dyn OcrBackend>, OcrError> + Send + Sync;

/// [`OcrProvider`] backed by an [`OcrBackend`] that is initialized on first use.
pub struct EngineOcrProvider {
    config: OcrConfig,
    engine: OnceLock<Option<Arc<dyn OcrBackend>>>,
    factory: Box<BackendFactory>,
    renderer: Arc<dyn PageRenderer>,
}

impl EngineOcrProvider {
    /// Provider using Tesseract.
    pub fn new(config: OcrConfig) -> Self {
        Self::with_factory(config, |config| {
            let backend: Arc<dyn OcrBackend> = Arc::new(TesseractBackend::initialize(config)?);
            Ok(backend)
        })
    }

    /// Provider using an already-built engine.
    pub fn with_backend(config: OcrConfig, backend: Arc<dyn OcrBackend>) -> Self {
        Self::with_factory(config, move |_| Ok(backend.clone()))
    }

    /// Provider whose engine is built by `factory` on first use.
    pub fn with_factory<F>(config: OcrConfig, factory: F) -> Self
    where
        F: Fn(&OcrConfig) -> Result<Arc<dyn OcrBackend>, OcrError> + Send + Sync + 'static,
    {
        Self {
            config,
            engine: OnceLock::new(),
            factory: Box::new(factory),
            renderer: Arc::new(PopplerRenderer),
        }
    }

    /// Render PDF pages with `renderer` instead of Poppler.
    pub fn with_renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    /// The engine, initializing it once. `None` if initialization failed.
    pub fn engine(&self) -> Option<&Arc<dyn OcrBackend>> {
        self.engine
            .get_or_init(|| match (self.factory)(&self.config) {
                Ok(engine) => Some(engine),
                Err(e) => {
                    tracing::warn!("OCR disabled: {}", e);
                    None
                }
            })
            .as_ref()
    }

    /// Fresh scratch directory for one call, removed when dropped.
    fn scratch_dir(&self) -> Result<TempDir, OcrError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("docsift-ocr-");
        let dir = match &self.config.scratch_dir {
            Some(root) => {
                fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        Ok(dir)
    }

    fn try_extract(
        &self,
        engine: &dyn OcrBackend,
        path: &Path,
        max_pages: usize,
    ) -> Result<String, OcrError> {
        let format = DocumentFormat::from_path(path)
            .filter(DocumentFormat::supports_ocr)
            .ok_or_else(|| {
                OcrError::EngineFailure(format!("no OCR route for {}", path.display()))
            })?;

        let scratch = self.scratch_dir()?;
        let texts = match format {
            DocumentFormat::Pdf => self.ocr_pdf(engine, path, max_pages, scratch.path())?,
            DocumentFormat::Docx => self.ocr_docx(engine, path, scratch.path())?,
            DocumentFormat::Csv | DocumentFormat::Xlsx => Vec::new(),
        };

        Ok(texts.join(PAGE_SEPARATOR))
    }

    fn ocr_pdf(
        &self,
        engine: &dyn OcrBackend,
        path: &Path,
        max_pages: usize,
        scratch: &Path,
    ) -> Result<Vec<String>, OcrError> {
        let page_count = self.renderer.page_count(path)?;

        let pages = page_count.min(max_pages);
        if pages < page_count {
            tracing::info!(
                "OCR limited to first {} of {} pages: {}",
                pages,
                page_count,
                path.display()
            );
        }

        let dpi = self.config.render_dpi();
        let mut texts = Vec::new();
        for page in 1..=pages {
            let recognized = self
                .renderer
                .render_page(path, page, dpi, scratch)
                .and_then(|image| {
                    let text = self.recognize(engine, &image);
                    // Rendered pages are large; drop each one as soon as it is read
                    let _ = fs::remove_file(&image);
                    text
                });

            match recognized {
                Ok(text) if !text.is_empty() => texts.push(text),
                Ok(_) => {}
                Err(e @ OcrError::Unavailable(_)) => return Err(e),
                Err(e) => tracing::warn!("OCR failed on page {} of {}: {}", page, path.display(), e),
            }
        }

        Ok(texts)
    }

    fn ocr_docx(
        &self,
        engine: &dyn OcrBackend,
        path: &Path,
        scratch: &Path,
    ) -> Result<Vec<String>, OcrError> {
        let images = list_media_images(path)?;
        tracing::debug!("{} embedded images in {}", images.len(), path.display());

        let mut texts = Vec::new();
        for entry in &images {
            let recognized = extract_media_image(path, entry, scratch).and_then(|image| {
                let text = self.recognize(engine, &image);
                let _ = fs::remove_file(&image);
                text
            });

            match recognized {
                Ok(text) if !text.is_empty() => texts.push(text),
                Ok(_) => {}
                Err(e @ OcrError::Unavailable(_)) => return Err(e),
                Err(e) => tracing::warn!("OCR failed on {} in {}: {}", entry, path.display(), e),
            }
        }

        Ok(texts)
    }

    fn recognize(&self, engine: &dyn OcrBackend, image: &Path) -> Result<String, OcrError> {
        let regions = engine.recognize(image)?;
        Ok(regions_to_text(&regions, self.config.min_confidence))
    }
}

impl OcrProvider for EngineOcrProvider {
    fn available(&self) -> bool {
        self.engine().is_some()
    }

    fn extract(&self, path: &Path, max_pages: usize) -> String {
        let Some(engine) = self.engine() else {
            return String::new();
        };

        match self.try_extract(engine.as_ref(), path, max_pages) {
            Ok(text) => {
                tracing::debug!(
                    "{} recognized {} chars in {}",
                    engine.name(),
                    text.chars().count(),
                    path.display()
                );
                text
            }
            Err(e) => {
                tracing::warn!("OCR failed for {}: {}", path.display(), e);
                String::new()
            }
        }
    }
}
