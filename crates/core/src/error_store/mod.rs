//! Bounded per-stage error buffers.

mod store;
mod types;

pub use store::ErrorStore;
pub use types::{ErrorMessage, ErrorRecord, IngestRecord, PipelineErrors};
