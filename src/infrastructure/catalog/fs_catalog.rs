//! Filesystem media catalog
//!
//! Artifacts live in one directory next to a `catalog.json` manifest that
//! records every entry and whether it is still pending.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::ports::{CatalogError, MediaCatalog, OutputSink};
use crate::domain::recording::CatalogHandle;

const MANIFEST_FILE: &str = "catalog.json";

/// One catalog entry as stored in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: CatalogHandle,
    pub name: String,
    pub creation_time: i64,
    pub pending: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Manifest {
    next_id: u64,
    entries: Vec<CatalogEntry>,
}

/// Catalog backed by a directory and a JSON manifest
pub struct FsCatalog {
    dir: PathBuf,
    /// Serializes manifest read-modify-write cycles
    lock: Mutex<()>,
}

impl FsCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    /// All entries currently in the manifest
    pub async fn entries(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.entries)
    }

    async fn load(&self) -> Result<Manifest, CatalogError> {
        match fs::read_to_string(self.manifest_path()).await {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| CatalogError::WriteFailed(format!("corrupt manifest: {}", e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Manifest::default()),
            Err(e) => Err(CatalogError::WriteFailed(e.to_string())),
        }
    }

    async fn save(&self, manifest: &Manifest) -> Result<(), CatalogError> {
        let content = serde_json::to_string_pretty(manifest)
            .map_err(|e| CatalogError::WriteFailed(e.to_string()))?;
        let tmp = self.dir.join(format!("{}.tmp", MANIFEST_FILE));
        fs::write(&tmp, content)
            .await
            .map_err(|e| CatalogError::WriteFailed(e.to_string()))?;
        fs::rename(&tmp, self.manifest_path())
            .await
            .map_err(|e| CatalogError::WriteFailed(e.to_string()))
    }
}

#[async_trait]
impl MediaCatalog for FsCatalog {
    async fn insert_pending(
        &self,
        name: &str,
        creation_time: i64,
    ) -> Result<(CatalogHandle, OutputSink), CatalogError> {
        let _guard = self.lock.lock().await;
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CatalogError::InsertFailed(format!("{}: {}", self.dir.display(), e)))?;

        let mut manifest = self.load().await?;
        manifest.next_id += 1;
        let id = CatalogHandle(manifest.next_id);
        manifest.entries.push(CatalogEntry {
            id,
            name: name.to_string(),
            creation_time,
            pending: true,
        });
        self.save(&manifest)
            .await
            .map_err(|e| CatalogError::InsertFailed(e.to_string()))?;

        debug!("Catalog entry {} created for {}", id, name);
        Ok((id, OutputSink::new(self.dir.join(name))))
    }

    async fn mark_completed(&self, handle: CatalogHandle) -> Result<(), CatalogError> {
        let _guard = self.lock.lock().await;
        let mut manifest = self.load().await?;
        let entry = manifest
            .entries
            .iter_mut()
            .find(|e| e.id == handle)
            .ok_or(CatalogError::NotFound(handle))?;
        entry.pending = false;
        self.save(&manifest).await
    }

    async fn delete(&self, handle: CatalogHandle) -> Result<(), CatalogError> {
        let _guard = self.lock.lock().await;
        let mut manifest = self.load().await?;
        let position = manifest
            .entries
            .iter()
            .position(|e| e.id == handle)
            .ok_or(CatalogError::NotFound(handle))?;
        let entry = manifest.entries.remove(position);
        self.save(&manifest).await?;

        match fs::remove_file(self.dir.join(&entry.name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CatalogError::WriteFailed(e.to_string())),
        }
    }
}
