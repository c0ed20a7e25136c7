use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

use super::types::PipelineDefinition;

#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Malformed definition: {0}")]
    Malformed(String),
}

/// Read-only access to stored pipeline definitions.
pub trait DefinitionStore: Send + Sync {
    /// Looks up a definition by name and revision. Returns `None` when
    /// no definition with that identity exists.
    fn get(&self, name: &str, rev: &str) -> Result<Option<PipelineDefinition>, DefinitionError>;
}

/// In-memory definition store, used in tests and embedded setups.
#[derive(Default)]
pub struct InMemoryDefinitionStore {
    definitions: RwLock<HashMap<(String, String), PipelineDefinition>>,
}

impl InMemoryDefinitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, definition: PipelineDefinition) {
        let key = (definition.name.clone(), definition.rev.clone());
        if let Ok(mut definitions) = self.definitions.write() {
            definitions.insert(key, definition);
        }
    }
}

impl DefinitionStore for InMemoryDefinitionStore {
    fn get(&self, name: &str, rev: &str) -> Result<Option<PipelineDefinition>, DefinitionError> {
        let definitions = self
            .definitions
            .read()
            .map_err(|e| DefinitionError::Storage(e.to_string()))?;
        Ok(definitions.get(&(name.to_string(), rev.to_string())).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing_returns_none() {
        let store = InMemoryDefinitionStore::new();
        assert!(store.get("logs", "0").unwrap().is_none());
    }

    #[test]
    fn test_insert_then_get() {
        let store = InMemoryDefinitionStore::new();
        store.insert(PipelineDefinition::new("logs", "0"));

        let def = store.get("logs", "0").unwrap().unwrap();
        assert_eq!(def.name, "logs");
        assert!(store.get("logs", "1").unwrap().is_none());
    }
}
