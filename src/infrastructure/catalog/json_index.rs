//! Number-indexed store of finished recordings

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::ports::{CatalogError, RecordingIndex};
use crate::domain::recording::RecordingSession;

const INDEX_FILE: &str = "recordings.json";

type Index = BTreeMap<String, Vec<RecordingSession>>;

/// Recordings grouped by subject phone number in a JSON file
pub struct JsonRecordingIndex {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonRecordingIndex {
    /// Index stored inside the recordings directory
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::with_path(dir.as_ref().join(INDEX_FILE))
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Recordings made with the given number
    pub async fn recordings_for(&self, number: &str) -> Result<Vec<RecordingSession>, CatalogError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(number).unwrap_or_default())
    }

    async fn load(&self) -> Result<Index, CatalogError> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| CatalogError::WriteFailed(format!("corrupt index: {}", e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Index::new()),
            Err(e) => Err(CatalogError::WriteFailed(e.to_string())),
        }
    }
}

#[async_trait]
impl RecordingIndex for JsonRecordingIndex {
    async fn put_recording(&self, session: &RecordingSession) -> Result<(), CatalogError> {
        let number = session.phone_number.clone().ok_or_else(|| {
            CatalogError::InsertFailed("recording has no phone number".to_string())
        })?;

        let _guard = self.lock.lock().await;
        let mut index = self.load().await?;
        index.entry(number).or_default().push(session.clone());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CatalogError::WriteFailed(e.to_string()))?;
        }
        let content = serde_json::to_string_pretty(&index)
            .map_err(|e| CatalogError::WriteFailed(e.to_string()))?;
        fs::write(&self.path, content)
            .await
            .map_err(|e| CatalogError::WriteFailed(e.to_string()))?;

        debug!("Indexed recording {}", session);
        Ok(())
    }
}
