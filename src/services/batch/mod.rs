//! Batch extraction service.
//!
//! Runs a directory of documents through the orchestrator on Tokio's blocking
//! pool and writes a sidecar per success, labelled when a label structure is
//! configured. Separated from UI concerns - emits events for progress
//! tracking.

mod types;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};

use super::extraction::{source_name, ExtractionOrchestrator};
use super::labels::LabelStructure;
use super::sidecar::SidecarWriter;
use crate::models::ExtractionMethod;

pub use types::{BatchEvent, BatchSummary};

/// Regular, non-hidden files directly inside `dir`, sorted by name.
///
/// Every file is returned regardless of extension; unsupported formats fail
/// in the orchestrator and are reported like any other failure.
pub fn discover_documents(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if !hidden && entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Outcome of one worker task: input position and failure, if any.
type TaskOutcome = (usize, Option<(String, String)>);

/// A spawned worker with the input it was given.
struct PendingTask {
    index: usize,
    source_file: String,
    handle: JoinHandle<TaskOutcome>,
}

/// Service for batch extraction.
pub struct BatchService {
    orchestrator: Arc<ExtractionOrchestrator>,
    writer: Option<SidecarWriter>,
    labels: Option<Arc<LabelStructure>>,
}

impl BatchService {
    /// Create a new batch service. Without a writer no sidecars are written.
    pub fn new(orchestrator: Arc<ExtractionOrchestrator>) -> Self {
        Self {
            orchestrator,
            writer: None,
            labels: None,
        }
    }

    pub fn with_writer(mut self, writer: SidecarWriter) -> Self {
        self.writer = Some(writer);
        self
    }

    /// Attach domain/category labels to sidecars of documents in known folders.
    pub fn with_labels(mut self, labels: Arc<LabelStructure>) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Process `files` with at most `workers` documents in flight.
    pub async fn process(
        &self,
        files: Vec<PathBuf>,
        workers: usize,
        event_tx: mpsc::Sender<BatchEvent>,
    ) -> anyhow::Result<BatchSummary> {
        let start = Instant::now();
        let workers = workers.max(1);
        let total = files.len();

        let _ = event_tx
            .send(BatchEvent::Started {
                total_documents: total,
            })
            .await;

        let succeeded = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicUsize::new(0));
        let ocr_improved = Arc::new(AtomicUsize::new(0));

        let mut outcomes: Vec<TaskOutcome> = Vec::with_capacity(total);
        let mut pending: Vec<PendingTask> = Vec::with_capacity(workers);

        for (index, path) in files.into_iter().enumerate() {
            let orchestrator = self.orchestrator.clone();
            let writer = self.writer.clone();
            let labels = self.labels.clone();
            let succeeded = succeeded.clone();
            let task_failed = failed.clone();
            let ocr_improved = ocr_improved.clone();
            let task_event_tx = event_tx.clone();
            let source_file = source_name(&path);
            let task_source_file = source_file.clone();

            let handle = tokio::task::spawn_blocking(move || {
                let source_file = task_source_file;

                // Send start event (blocking send since we're in spawn_blocking)
                let _ = futures::executor::block_on(task_event_tx.send(BatchEvent::DocumentStarted {
                    source_file: source_file.clone(),
                }));

                let result = orchestrator.run(&path);

                if !result.is_success() {
                    let error = result
                        .error_message()
                        .unwrap_or("Unknown extraction error")
                        .to_string();
                    task_failed.fetch_add(1, Ordering::Relaxed);
                    let _ = futures::executor::block_on(task_event_tx.send(
                        BatchEvent::DocumentFailed {
                            source_file: source_file.clone(),
                            error: error.clone(),
                        },
                    ));
                    return (index, Some((source_file, error)));
                }

                if let Some(writer) = writer {
                    let labels = labels.and_then(|l| l.labels_for(&path));
                    if let Err(e) = writer.write(&result, &path, labels) {
                        tracing::warn!("Failed to write sidecar for {}: {}", source_file, e);
                        let error = format!("Failed to write sidecar: {}", e);
                        task_failed.fetch_add(1, Ordering::Relaxed);
                        let _ = futures::executor::block_on(task_event_tx.send(
                            BatchEvent::SidecarFailed {
                                source_file: source_file.clone(),
                                error: error.clone(),
                            },
                        ));
                        return (index, Some((source_file, error)));
                    }
                }

                let method = result.method().unwrap_or(ExtractionMethod::Native);
                if method == ExtractionMethod::Ocr {
                    ocr_improved.fetch_add(1, Ordering::Relaxed);
                }
                succeeded.fetch_add(1, Ordering::Relaxed);
                let _ = futures::executor::block_on(task_event_tx.send(
                    BatchEvent::DocumentCompleted {
                        source_file,
                        method,
                        content_length: result.content_length(),
                    },
                ));
                (index, None)
            });

            pending.push(PendingTask {
                index,
                source_file,
                handle,
            });

            if pending.len() >= workers {
                for task in pending.drain(..) {
                    task.finish(&mut outcomes, &failed, &event_tx).await;
                }
            }
        }

        for task in pending {
            task.finish(&mut outcomes, &failed, &event_tx).await;
        }

        outcomes.sort_by_key(|(index, _)| *index);
        let summary = BatchSummary {
            total,
            succeeded: succeeded.load(Ordering::Relaxed),
            failed: failed.load(Ordering::Relaxed),
            ocr_improved: ocr_improved.load(Ordering::Relaxed),
            failures: outcomes
                .into_iter()
                .filter_map(|(_, failure)| failure)
                .collect(),
            elapsed: start.elapsed(),
        };

        tracing::info!(
            "Batch finished: {}/{} succeeded, {} via OCR, {:.1}s",
            summary.succeeded,
            summary.total,
            summary.ocr_improved,
            summary.elapsed.as_secs_f64()
        );

        let _ = event_tx
            .send(BatchEvent::Finished {
                succeeded: summary.succeeded,
                failed: summary.failed,
                ocr_improved: summary.ocr_improved,
            })
            .await;

        Ok(summary)
    }
}

impl PendingTask {
    async fn finish(
        self,
        outcomes: &mut Vec<TaskOutcome>,
        failed: &AtomicUsize,
        event_tx: &mpsc::Sender<BatchEvent>,
    ) {
        let joined = self.handle.await;
        collect_outcome(self.index, self.source_file, joined, outcomes, failed, event_tx).await;
    }
}

/// Record a finished worker. A task that died (panic or cancellation) counts
/// as a failure of the document it was given.
async fn collect_outcome(
    index: usize,
    source_file: String,
    joined: Result<TaskOutcome, JoinError>,
    outcomes: &mut Vec<TaskOutcome>,
    failed: &AtomicUsize,
    event_tx: &mpsc::Sender<BatchEvent>,
) {
    match joined {
        Ok(outcome) => outcomes.push(outcome),
        Err(e) => {
            tracing::error!("Batch worker task failed for {}: {}", source_file, e);
            let error = format!("Worker task failed: {}", e);
            failed.fetch_add(1, Ordering::Relaxed);
            let _ = event_tx
                .send(BatchEvent::DocumentFailed {
                    source_file: source_file.clone(),
                    error: error.clone(),
                })
                .await;
            outcomes.push((index, Some((source_file, error))));
        }
    }
}
