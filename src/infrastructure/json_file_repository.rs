// JSON file repository implementation
use crate::application::dashboard_repository::{is_valid_dashboard_id, DashboardRepository};
use crate::domain::dashboard::Dashboard;
use crate::domain::repair::DashboardDraft;
use crate::infrastructure::blueprint::{into_draft, to_document, DashboardDocument};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("invalid dashboard id '{0}'")]
    InvalidId(String),
    #[error("dashboard '{0}' not found")]
    NotFound(String),
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed dashboard document: {0}")]
    Serde(#[from] serde_json::Error),
}

/// One pretty-printed `<id>.json` document per dashboard.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    dir: PathBuf,
}

impl JsonFileRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, RepositoryError> {
        if !is_valid_dashboard_id(id) {
            return Err(RepositoryError::InvalidId(id.to_string()));
        }
        Ok(self.dir.join(format!("{id}.json")))
    }

    pub async fn read_document(&self, id: &str) -> Result<DashboardDocument, RepositoryError> {
        let path = self.path_for(id)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RepositoryError::NotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn write_document(
        &self,
        id: &str,
        document: &DashboardDocument,
    ) -> Result<(), RepositoryError> {
        let path = self.path_for(id)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        // Write aside and rename so readers never see a torn file.
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(document)?;
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[async_trait]
impl DashboardRepository for JsonFileRepository {
    async fn list_ids(&self) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to list {}", self.dir.display()));
            }
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if is_valid_dashboard_id(stem) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn load(&self, id: &str) -> Result<Option<DashboardDraft>> {
        match self.read_document(id).await {
            Ok(document) => Ok(Some(into_draft(document))),
            Err(RepositoryError::NotFound(_)) => Ok(None),
            Err(e) => {
                tracing::error!("Failed to load dashboard {}: {}", id, e);
                Err(e).with_context(|| format!("Failed to load dashboard {id}"))
            }
        }
    }

    async fn save(&self, id: &str, dashboard: &Dashboard) -> Result<()> {
        self.write_document(id, &to_document(dashboard))
            .await
            .map_err(|e| {
                tracing::error!("Failed to save dashboard {}: {}", id, e);
                e
            })
            .with_context(|| format!("Failed to save dashboard {id}"))
    }
}
