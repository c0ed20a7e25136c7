use super::types::SnapshotError;

/// Persistence for at most one captured snapshot payload per pipeline
/// revision. A new capture overwrites the previous payload.
pub trait SnapshotStore: Send + Sync {
    fn put(&self, name: &str, rev: &str, payload: &[u8]) -> Result<(), SnapshotError>;

    fn get(&self, name: &str, rev: &str) -> Result<Option<Vec<u8>>, SnapshotError>;

    fn exists(&self, name: &str, rev: &str) -> Result<bool, SnapshotError>;

    /// Removes the stored payload. Deleting a snapshot that does not
    /// exist is not an error.
    fn delete(&self, name: &str, rev: &str) -> Result<(), SnapshotError>;
}
