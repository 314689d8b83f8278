//! Service layer for business logic.
//!
//! Services sit between the CLI and the extraction machinery; they report
//! progress through events instead of printing.

pub mod batch;
pub mod extraction;
pub mod labels;
pub mod sidecar;

pub use batch::{discover_documents, BatchEvent, BatchService, BatchSummary};
pub use extraction::{arbitrate, ExtractionOrchestrator, PipelineState};
pub use labels::{DocumentLabels, LabelError, LabelStructure};
pub use sidecar::{compute_file_hash, SidecarDocument, SidecarError, SidecarWriter};
