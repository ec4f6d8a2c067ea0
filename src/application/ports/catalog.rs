//! Recording catalog port interfaces

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::recording::{CatalogHandle, RecordingSession};

/// Catalog errors
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Failed to create catalog entry: {0}")]
    InsertFailed(String),

    #[error("Catalog entry {0} not found")]
    NotFound(CatalogHandle),

    #[error("Failed to update catalog: {0}")]
    WriteFailed(String),
}

/// Destination the capture handle writes encoded audio to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSink {
    pub path: PathBuf,
}

impl OutputSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Persistent store of recorded artifacts
#[async_trait]
pub trait MediaCatalog: Send + Sync {
    /// Register a new entry marked pending and return its output sink
    async fn insert_pending(
        &self,
        name: &str,
        creation_time: i64,
    ) -> Result<(CatalogHandle, OutputSink), CatalogError>;

    /// Clear the pending marker of a finished entry
    async fn mark_completed(&self, handle: CatalogHandle) -> Result<(), CatalogError>;

    /// Remove an entry and its artifact
    async fn delete(&self, handle: CatalogHandle) -> Result<(), CatalogError>;
}

/// Index of finished recordings keyed by subject phone number
#[async_trait]
pub trait RecordingIndex: Send + Sync {
    async fn put_recording(&self, session: &RecordingSession) -> Result<(), CatalogError>;
}
