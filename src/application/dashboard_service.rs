// Dashboard service - Use cases over open dashboards and their persistence
use crate::application::dashboard_repository::DashboardRepository;
use crate::application::events::LayoutEvent;
use crate::application::layout_manager::{LayoutManager, LayoutOptions};
use crate::domain::repair::Diagnostic;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

const EVENT_CHANNEL_CAPACITY: usize = 100;

/// A dashboard held in memory together with its load diagnostics and the
/// channel its events are fanned out on.
pub struct OpenDashboard {
    pub manager: LayoutManager,
    pub diagnostics: Vec<Diagnostic>,
    events: broadcast::Sender<LayoutEvent>,
    saved_revision: u64,
    stored: bool,
}

impl OpenDashboard {
    pub fn subscribe(&self) -> broadcast::Receiver<LayoutEvent> {
        self.events.subscribe()
    }

    /// Created for commands that changed nothing, with nobody listening.
    fn untouched(&self) -> bool {
        !self.stored && self.manager.revision() == 0 && self.events.receiver_count() == 0
    }
}

#[derive(Clone)]
pub struct DashboardService {
    repository: Arc<dyn DashboardRepository>,
    options: LayoutOptions,
    viewport_width: f64,
    open: Arc<Mutex<HashMap<String, Arc<Mutex<OpenDashboard>>>>>,
}

impl DashboardService {
    pub fn new(
        repository: Arc<dyn DashboardRepository>,
        options: LayoutOptions,
        viewport_width: f64,
    ) -> Self {
        Self {
            repository,
            options,
            viewport_width,
            open: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn list_dashboards(&self) -> anyhow::Result<Vec<String>> {
        let mut ids = self.repository.list_ids().await?;
        for id in self.open.lock().await.keys() {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Open a dashboard, loading and repairing it if stored, or creating an
    /// empty one otherwise.
    pub async fn open(&self, id: &str) -> anyhow::Result<Arc<Mutex<OpenDashboard>>> {
        match self.open_with(id, true).await? {
            Some(entry) => Ok(entry),
            None => anyhow::bail!("dashboard {id} could not be created"),
        }
    }

    /// Like [`Self::open`] but `None` for dashboards that are neither open
    /// nor stored.
    pub async fn open_existing(
        &self,
        id: &str,
    ) -> anyhow::Result<Option<Arc<Mutex<OpenDashboard>>>> {
        self.open_with(id, false).await
    }

    async fn open_with(
        &self,
        id: &str,
        create: bool,
    ) -> anyhow::Result<Option<Arc<Mutex<OpenDashboard>>>> {
        let mut open = self.open.lock().await;
        if let Some(existing) = open.get(id) {
            return Ok(Some(existing.clone()));
        }

        let stored_draft = self.repository.load(id).await?;
        let stored = stored_draft.is_some();
        let (mut manager, diagnostics) = match stored_draft {
            Some(draft) => {
                let (manager, diagnostics) =
                    LayoutManager::load(draft, self.options, self.viewport_width);
                tracing::info!(
                    "Loaded dashboard {} with {} panels ({} repairs)",
                    id,
                    manager.dashboard().panels().len(),
                    diagnostics.len()
                );
                (manager, diagnostics)
            }
            None if create => {
                tracing::debug!("Creating new dashboard {}", id);
                (
                    LayoutManager::new(self.options, self.viewport_width),
                    Vec::new(),
                )
            }
            None => return Ok(None),
        };

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let sender = events.clone();
        manager.subscribe(Box::new(move |event: &LayoutEvent| {
            // no subscribers is fine
            let _ = sender.send(event.clone());
        }));

        let entry = Arc::new(Mutex::new(OpenDashboard {
            manager,
            diagnostics,
            events,
            saved_revision: 0,
            stored,
        }));
        open.insert(id.to_string(), entry.clone());
        Ok(Some(entry))
    }

    /// Run `command` against the dashboard and persist the result if it
    /// committed a change. Every committed change is a save point.
    ///
    /// A failed save leaves the change in memory and is retried by the next
    /// command on the same dashboard, so persistence is at-least-once.
    pub async fn execute<T>(
        &self,
        id: &str,
        command: impl FnOnce(&mut LayoutManager) -> T,
    ) -> anyhow::Result<T> {
        let entry = self.open(id).await?;
        let mut open = entry.lock().await;

        let result = command(&mut open.manager);

        let revision = open.manager.revision();
        if revision != open.saved_revision {
            if let Err(e) = self.repository.save(id, open.manager.dashboard()).await {
                tracing::error!(
                    "Failed to save dashboard {} at revision {} (last saved {}): {:#}",
                    id,
                    revision,
                    open.saved_revision,
                    e
                );
                return Err(e.context(format!(
                    "dashboard {id} changed to revision {revision} but was not saved"
                )));
            }
            tracing::debug!("Saved dashboard {} at revision {}", id, revision);
            open.saved_revision = revision;
            open.stored = true;
        }

        let untouched = open.untouched();
        drop(open);
        if untouched {
            self.release(id, entry).await;
        }
        Ok(result)
    }

    /// Forget an entry nobody else holds that has nothing worth keeping.
    async fn release(&self, id: &str, entry: Arc<Mutex<OpenDashboard>>) {
        let mut open = self.open.lock().await;
        // the map and `entry` itself; any other holder may be about to mutate it
        if Arc::strong_count(&entry) > 2 {
            return;
        }
        let Ok(dashboard) = entry.try_lock() else {
            return;
        };
        if dashboard.untouched() {
            tracing::debug!("Releasing unused dashboard {}", id);
            open.remove(id);
        }
    }

    /// Read-only access; never saves. `None` for unknown dashboards.
    pub async fn inspect<T>(
        &self,
        id: &str,
        query: impl FnOnce(&OpenDashboard) -> T,
    ) -> anyhow::Result<Option<T>> {
        let Some(entry) = self.open_existing(id).await? else {
            return Ok(None);
        };
        let open = entry.lock().await;
        Ok(Some(query(&open)))
    }

    pub async fn subscribe(
        &self,
        id: &str,
    ) -> anyhow::Result<Option<broadcast::Receiver<LayoutEvent>>> {
        self.inspect(id, OpenDashboard::subscribe).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::breakpoint::Breakpoint;
    use crate::domain::panel::PanelTemplate;
    use crate::domain::dashboard::Dashboard;
    use crate::domain::repair::DashboardDraft;
    use crate::infrastructure::memory_repository::InMemoryRepository;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Memory repository whose saves can be switched off.
    #[derive(Default)]
    struct FlakyRepository {
        inner: InMemoryRepository,
        failing: AtomicBool,
    }

    #[async_trait]
    impl DashboardRepository for FlakyRepository {
        async fn list_ids(&self) -> anyhow::Result<Vec<String>> {
            self.inner.list_ids().await
        }

        async fn load(&self, id: &str) -> anyhow::Result<Option<DashboardDraft>> {
            self.inner.load(id).await
        }

        async fn save(&self, id: &str, dashboard: &Dashboard) -> anyhow::Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                anyhow::bail!("disk full");
            }
            self.inner.save(id, dashboard).await
        }
    }

    fn service(repository: Arc<InMemoryRepository>) -> DashboardService {
        DashboardService::new(repository, LayoutOptions::default(), 1280.0)
    }

    #[tokio::test]
    async fn test_unknown_dashboard_is_created_on_first_change() {
        let service = service(Arc::new(InMemoryRepository::new()));
        let count = |open: &OpenDashboard| open.manager.dashboard().panels().len();

        assert_eq!(service.inspect("fresh", count).await.unwrap(), None);
        service
            .execute("fresh", |m| m.add_panel(PanelTemplate::new("kpi", "Users", 2, 1)))
            .await
            .unwrap();
        assert_eq!(service.inspect("fresh", count).await.unwrap(), Some(1));
        assert_eq!(service.list_dashboards().await.unwrap(), vec!["fresh"]);
    }

    #[tokio::test]
    async fn test_commands_that_change_nothing_leave_no_dashboard_behind() {
        let service = service(Arc::new(InMemoryRepository::new()));

        for id in ["ghost-1", "ghost-2", "ghost-3"] {
            assert!(service.execute(id, |m| m.commit_session()).await.unwrap().is_none());
            assert!(!service.execute(id, |m| m.select(None)).await.unwrap());
        }

        assert!(service.list_dashboards().await.unwrap().is_empty());
        assert!(service.open.lock().await.is_empty());
        assert!(service.subscribe("ghost-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_committed_changes_are_saved() {
        let repository = Arc::new(InMemoryRepository::new());
        let service = service(repository.clone());

        let id = service
            .execute("sales", |m| m.add_panel(PanelTemplate::new("bar", "Revenue", 4, 2)))
            .await
            .unwrap();

        let draft = repository.load("sales").await.unwrap().expect("saved");
        assert_eq!(draft.panels.len(), 1);
        assert_eq!(draft.panels[0].panel.id, id);

        // a fresh service sees the persisted panel
        let reopened = DashboardService::new(repository, LayoutOptions::default(), 1280.0);
        let rect = reopened
            .inspect("sales", |open| open.manager.dashboard().placement(Breakpoint::Lg, &id))
            .await
            .unwrap()
            .flatten();
        assert_eq!(rect.map(|r| (r.x, r.y, r.w, r.h)), Some((0, 0, 4, 2)));
    }

    #[tokio::test]
    async fn test_reads_do_not_save() {
        let repository = Arc::new(InMemoryRepository::new());
        let service = service(repository.clone());

        service.execute("quiet", |m| m.revision()).await.unwrap();
        assert!(repository.load("quiet").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_events_are_broadcast() {
        let service = service(Arc::new(InMemoryRepository::new()));
        assert!(service.subscribe("live").await.unwrap().is_none());

        service
            .execute("live", |m| m.add_panel(PanelTemplate::new("kpi", "Users", 2, 1)))
            .await
            .unwrap();
        let mut rx = service.subscribe("live").await.unwrap().expect("open");

        service
            .execute("live", |m| m.add_panel(PanelTemplate::new("kpi", "Orders", 2, 1)))
            .await
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.name(), "layout:change");
    }

    #[tokio::test]
    async fn test_failed_save_is_retried_by_next_command() {
        let repository = Arc::new(FlakyRepository::default());
        repository.failing.store(true, Ordering::SeqCst);
        let service = DashboardService::new(repository.clone(), LayoutOptions::default(), 1280.0);

        let err = service
            .execute("ops", |m| m.add_panel(PanelTemplate::new("bar", "Latency", 4, 2)))
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("disk full"));
        assert!(repository.load("ops").await.unwrap().is_none());

        // the change stays live in memory
        let live = service
            .inspect("ops", |open| open.manager.dashboard().panels().len())
            .await
            .unwrap();
        assert_eq!(live, Some(1));

        repository.failing.store(false, Ordering::SeqCst);
        service.execute("ops", |m| m.revision()).await.unwrap();

        let draft = repository.load("ops").await.unwrap().expect("saved on retry");
        assert_eq!(draft.panels.len(), 1);
    }
}
