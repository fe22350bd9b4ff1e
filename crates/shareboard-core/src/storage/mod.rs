//! Persistence collaborator: identity-keyed board snapshots.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use memory::MemoryStorage;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

use crate::elements::CanvasElement;
use crate::identity::UserIdentity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("not signed in")]
    NotSignedIn,
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async storage operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// A saved board: every element in plain-data form, stamped with the save
/// time (serialized as an ISO-8601 string).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub saved_at: DateTime<Utc>,
    pub elements: Vec<CanvasElement>,
}

impl BoardSnapshot {
    /// Snapshot the given elements as of now.
    pub fn now(elements: Vec<CanvasElement>) -> Self {
        Self {
            saved_at: Utc::now(),
            elements,
        }
    }
}

/// Snapshot storage backend, keyed by user id.
pub trait Storage: Send + Sync {
    /// Save a user's board, overwriting any previous save (last write wins).
    fn save(&self, uid: &str, snapshot: &BoardSnapshot) -> BoxFuture<'_, StorageResult<()>>;

    /// Load a user's board; `Ok(None)` when they have never saved one.
    fn load(&self, uid: &str) -> BoxFuture<'_, StorageResult<Option<BoardSnapshot>>>;

    /// Delete a user's board.
    fn delete(&self, uid: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// Check whether a user has a saved board.
    fn exists(&self, uid: &str) -> BoxFuture<'_, StorageResult<bool>>;
}

/// Front door for persistence: gates every call on a signed-in identity and
/// wraps elements into timestamped snapshots.
pub struct BoardStore<S: Storage> {
    storage: S,
}

impl<S: Storage> BoardStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Save the user's board. Fails with a descriptive, recoverable error
    /// when nobody is signed in.
    pub fn save<'a>(
        &'a self,
        user: Option<&UserIdentity>,
        elements: &[CanvasElement],
    ) -> BoxFuture<'a, StorageResult<()>> {
        let Some(user) = user else {
            return Box::pin(async { Err(StorageError::NotSignedIn) });
        };
        let uid = user.uid.clone();
        let snapshot = BoardSnapshot::now(elements.to_vec());
        Box::pin(async move { self.storage.save(&uid, &snapshot).await })
    }

    /// Load the user's board, or `None` when they have never saved one.
    pub fn load<'a>(
        &'a self,
        user: Option<&UserIdentity>,
    ) -> BoxFuture<'a, StorageResult<Option<BoardSnapshot>>> {
        let Some(user) = user else {
            return Box::pin(async { Err(StorageError::NotSignedIn) });
        };
        let uid = user.uid.clone();
        Box::pin(async move { self.storage.load(&uid).await })
    }
}
