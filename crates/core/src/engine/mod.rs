//! Execution engine abstraction.
//!
//! The manager drives a pipeline through the [`ExecutionEngine`] trait
//! and never talks to the data plane directly. [`NullEngine`] is the
//! default implementation used when no real engine is embedded.

mod null;
mod traits;
mod types;

pub use null::NullEngine;
pub use traits::ExecutionEngine;
pub use types::{EngineError, MetricsSnapshot};
