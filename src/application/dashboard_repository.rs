// Repository trait for dashboard document persistence
use crate::domain::dashboard::Dashboard;
use crate::domain::repair::DashboardDraft;
use async_trait::async_trait;

#[async_trait]
pub trait DashboardRepository: Send + Sync {
    /// List the ids of all stored dashboards
    async fn list_ids(&self) -> anyhow::Result<Vec<String>>;

    /// Load a stored dashboard as an unchecked draft; `None` if it does not exist.
    /// Repair happens in the layout manager, not here.
    async fn load(&self, id: &str) -> anyhow::Result<Option<DashboardDraft>>;

    /// Persist the full dashboard, replacing any previous version
    async fn save(&self, id: &str, dashboard: &Dashboard) -> anyhow::Result<()>;
}

/// Dashboard ids double as file names, so keep them to a safe alphabet.
pub fn is_valid_dashboard_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
