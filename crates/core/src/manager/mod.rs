//! Pipeline manager.
//!
//! [`PipelineManager`] is the single entry point for everything the
//! REST surface does to a pipeline: lifecycle, offsets, snapshots,
//! error buffers and metrics.

mod runner;
mod types;

pub use runner::PipelineManager;
pub use types::ManagerError;
