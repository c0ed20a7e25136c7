//! Pipeline definitions and their storage backends.

mod fs;
mod store;
mod types;

pub use fs::FsDefinitionStore;
pub use store::{DefinitionError, DefinitionStore, InMemoryDefinitionStore};
pub use types::{PipelineDefinition, StageDef};
