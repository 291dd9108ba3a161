// In-memory repository for tests and ephemeral runs
use crate::application::dashboard_repository::DashboardRepository;
use crate::domain::dashboard::Dashboard;
use crate::domain::repair::DashboardDraft;
use crate::infrastructure::blueprint::{into_draft, to_document, DashboardDocument};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Stores documents rather than dashboards so loads go through the same
/// draft and repair path as the file adapter.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    documents: RwLock<BTreeMap<String, DashboardDocument>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_document(&self, id: impl Into<String>, document: DashboardDocument) {
        self.documents.write().await.insert(id.into(), document);
    }
}

#[async_trait]
impl DashboardRepository for InMemoryRepository {
    async fn list_ids(&self) -> Result<Vec<String>> {
        Ok(self.documents.read().await.keys().cloned().collect())
    }

    async fn load(&self, id: &str) -> Result<Option<DashboardDraft>> {
        Ok(self.documents.read().await.get(id).cloned().map(into_draft))
    }

    async fn save(&self, id: &str, dashboard: &Dashboard) -> Result<()> {
        self.documents
            .write()
            .await
            .insert(id.to_string(), to_document(dashboard));
        Ok(())
    }
}
