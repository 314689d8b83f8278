//! Data models for docsift.

mod result;

pub use result::{ExtractionMethod, ExtractionResult};
