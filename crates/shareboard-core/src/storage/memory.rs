//! In-memory storage implementation.

use super::{BoardSnapshot, BoxFuture, Storage, StorageResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryStorage {
    boards: RwLock<HashMap<String, BoardSnapshot>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn save(&self, uid: &str, snapshot: &BoardSnapshot) -> BoxFuture<'_, StorageResult<()>> {
        let uid = uid.to_string();
        let snapshot = snapshot.clone();
        Box::pin(async move {
            let mut boards = self
                .boards
                .write()
                .map_err(|e| super::StorageError::Other(format!("lock error: {e}")))?;
            boards.insert(uid, snapshot);
            Ok(())
        })
    }

    fn load(&self, uid: &str) -> BoxFuture<'_, StorageResult<Option<BoardSnapshot>>> {
        let uid = uid.to_string();
        Box::pin(async move {
            let boards = self
                .boards
                .read()
                .map_err(|e| super::StorageError::Other(format!("lock error: {e}")))?;
            Ok(boards.get(&uid).cloned())
        })
    }

    fn delete(&self, uid: &str) -> BoxFuture<'_, StorageResult<()>> {
        let uid = uid.to_string();
        Box::pin(async move {
            let mut boards = self
                .boards
                .write()
                .map_err(|e| super::StorageError::Other(format!("lock error: {e}")))?;
            boards.remove(&uid);
            Ok(())
        })
    }

    fn exists(&self, uid: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let uid = uid.to_string();
        Box::pin(async move {
            let boards = self
                .boards
                .read()
                .map_err(|e| super::StorageError::Other(format!("lock error: {e}")))?;
            Ok(boards.contains_key(&uid))
        })
    }
}
