use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::debug;

use super::store::{DefinitionError, DefinitionStore};
use super::types::PipelineDefinition;

/// Definition store backed by a directory tree.
///
/// Each definition lives at `<dir>/<name>/<rev>.json`, which keeps
/// revisions of the same pipeline side by side and makes definitions
/// editable with nothing but a text editor.
pub struct FsDefinitionStore {
    dir: PathBuf,
}

impl FsDefinitionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, name: &str, rev: &str) -> PathBuf {
        self.dir.join(name).join(format!("{rev}.json"))
    }
}

impl DefinitionStore for FsDefinitionStore {
    fn get(&self, name: &str, rev: &str) -> Result<Option<PipelineDefinition>, DefinitionError> {
        let path = self.path_for(name, rev);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(name, rev, "No definition file at {}", path.display());
                return Ok(None);
            }
            Err(e) => return Err(DefinitionError::Storage(e.to_string())),
        };

        let definition: PipelineDefinition = serde_json::from_str(&raw)
            .map_err(|e| DefinitionError::Malformed(format!("{}: {e}", path.display())))?;
        Ok(Some(definition))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_definition(dir: &TempDir, name: &str, rev: &str, body: &str) {
        let pipeline_dir = dir.path().join(name);
        fs::create_dir_all(&pipeline_dir).unwrap();
        fs::write(pipeline_dir.join(format!("{rev}.json")), body).unwrap();
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FsDefinitionStore::new(dir.path());
        assert!(store.get("logs", "0").unwrap().is_none());
    }

    #[test]
    fn test_reads_definition_file() {
        let dir = TempDir::new().unwrap();
        write_definition(
            &dir,
            "logs",
            "0",
            r#"{"name":"logs","rev":"0","stages":[{"instance_name":"s1","stage_type":"dir-spooler"}]}"#,
        );
        let store = FsDefinitionStore::new(dir.path());

        let def = store.get("logs", "0").unwrap().unwrap();
        assert_eq!(def.stages.len(), 1);
        assert_eq!(def.stages[0].instance_name, "s1");
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = TempDir::new().unwrap();
        write_definition(&dir, "logs", "0", "not json");
        let store = FsDefinitionStore::new(dir.path());

        assert!(matches!(
            store.get("logs", "0"),
            Err(DefinitionError::Malformed(_))
        ));
    }

    #[test]
    fn test_revisions_are_separate_files() {
        let dir = TempDir::new().unwrap();
        write_definition(&dir, "logs", "0", r#"{"name":"logs","rev":"0"}"#);
        write_definition(&dir, "logs", "1", r#"{"name":"logs","rev":"1","description":"v1"}"#);
        let store = FsDefinitionStore::new(dir.path());

        assert_eq!(store.get("logs", "0").unwrap().unwrap().description, "");
        assert_eq!(store.get("logs", "1").unwrap().unwrap().description, "v1");
    }
}
