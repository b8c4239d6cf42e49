use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::list::{run_load, FilteredList, ListSnapshot};
use super::segment::Unfiltered;
use crate::error::AppError;
use crate::models::dispatch::{DispatchRecord, NewDispatch};
use crate::notify::Notifier;
use crate::observability::metrics::Metrics;
use crate::services::directory::{Directory, FormOptions};
use crate::services::dispatch::{DispatchFilter, DispatchService};

const VIEW: &str = "route_manager";

#[derive(Debug, Clone, Serialize)]
pub struct RouteManagerSnapshot {
    pub filter: DispatchFilter,
    #[serde(flatten)]
    pub list: ListSnapshot<DispatchRecord, Unfiltered>,
}

/// Administrative dispatch list. Filtering happens in the backend query, so
/// every filter change is a reload.
pub struct RouteManager {
    dispatches: DispatchService,
    directory: Directory,
    notifier: Notifier,
    metrics: Metrics,
    filter: Mutex<DispatchFilter>,
    list: Mutex<FilteredList<DispatchRecord, Unfiltered>>,
    options: Mutex<Option<FormOptions>>,
}

impl RouteManager {
    pub fn new(
        dispatches: DispatchService,
        directory: Directory,
        notifier: Notifier,
        metrics: Metrics,
    ) -> Self {
        Self {
            dispatches,
            directory,
            notifier,
            metrics,
            filter: Mutex::new(DispatchFilter::default()),
            list: Mutex::new(FilteredList::new(Unfiltered)),
            options: Mutex::new(None),
        }
    }

    pub async fn load(&self) -> Result<(), AppError> {
        let filter = self.filter.lock().await.clone();
        run_load(&self.list, VIEW, &self.metrics, &self.notifier, || {
            self.dispatches.search(&filter)
        })
        .await
    }

    pub async fn reset(&self) {
        *self.filter.lock().await = DispatchFilter::default();
        self.list.lock().await.clear();
        self.forget_options().await;
    }

    pub async fn ensure_loaded(&self) -> Result<(), AppError> {
        if self.list.lock().await.never_loaded() {
            self.load().await?;
        }
        Ok(())
    }

    /// Validates the filter before it replaces the active one; a bad date
    /// leaves both the filter and the list as they were.
    pub async fn apply_filters(&self, filter: DispatchFilter) -> Result<(), AppError> {
        if let Err(err) = filter.to_query() {
            warn!(error = %err, "filter rejected");
            self.notifier.danger(err.notice_text());
            return Err(err);
        }
        *self.filter.lock().await = filter;
        self.load().await
    }

    pub async fn reset_filters(&self) -> Result<(), AppError> {
        *self.filter.lock().await = DispatchFilter::default();
        self.load().await
    }

    pub async fn create(&self, input: NewDispatch) -> Result<String, AppError> {
        let id = match self.dispatches.create(input).await {
            Ok(id) => id,
            Err(err) => return Err(self.mutation_failed("create", err)),
        };
        self.notifier.success("Dispatch created");
        self.load().await?;
        Ok(id)
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        if let Err(err) = self.dispatches.delete(id).await {
            return Err(self.mutation_failed("delete", err));
        }
        self.notifier.success("Dispatch deleted");
        self.load().await
    }

    /// Drops the cached form options; the next `options` call reads them
    /// again.
    pub async fn forget_options(&self) {
        *self.options.lock().await = None;
    }

    /// Selection lists for the dispatch form, read once and kept until
    /// `forget_options` or `reset`.
    pub async fn options(&self) -> Result<FormOptions, AppError> {
        if let Some(options) = self.options.lock().await.as_ref() {
            return Ok(options.clone());
        }

        let options = self.directory.form_options().await.map_err(|err| {
            self.notifier.danger(err.notice_text());
            err
        })?;
        info!("form options cached");
        *self.options.lock().await = Some(options.clone());
        Ok(options)
    }

    pub async fn snapshot(&self) -> RouteManagerSnapshot {
        RouteManagerSnapshot {
            filter: self.filter.lock().await.clone(),
            list: self.list.lock().await.snapshot(),
        }
    }

    fn mutation_failed(&self, action: &str, err: AppError) -> AppError {
        warn!(action, error = %err, "dispatch mutation failed");
        self.notifier.danger(err.notice_text());
        err
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;
    use crate::backend::collections::DRIVERS;
    use crate::backend::memory::InMemoryStore;
    use crate::backend::DocumentStore;
    use crate::services::reader::CollectionReader;
    use crate::view::list::ViewState;

    fn manager() -> (Arc<InMemoryStore>, RouteManager) {
        let store = Arc::new(InMemoryStore::new());
        let metrics = Metrics::new();
        let reader = CollectionReader::new(store.clone(), metrics.clone());
        let manager = RouteManager::new(
            DispatchService::new(reader.clone(), metrics.clone()),
            Directory::new(reader),
            Notifier::new(16),
            metrics,
        );
        (store, manager)
    }

    fn input(driver: &str, day: u32) -> NewDispatch {
        NewDispatch {
            driver: driver.to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 4, day, 10, 0, 0).unwrap(),
            load_type: "Frozen".to_string(),
            store: "Cd 429".to_string(),
            vehicle: "GWCL77".to_string(),
            shift: "Day".to_string(),
            round: "First".to_string(),
            management: "Delivery".to_string(),
        }
    }

    #[tokio::test]
    async fn create_and_delete_reload_the_list() {
        let (_store, manager) = manager();
        manager.ensure_loaded().await.unwrap();
        assert_eq!(manager.snapshot().await.list.total, 0);

        let first = manager.create(input("Ana", 1)).await.unwrap();
        manager.create(input("Bo", 2)).await.unwrap();
        let snapshot = manager.snapshot().await;
        assert_eq!(snapshot.list.total, 2);
        assert_eq!(snapshot.list.items[0].driver, "Bo");

        manager.delete(&first).await.unwrap();
        let snapshot = manager.snapshot().await;
        assert_eq!(snapshot.list.total, 1);
        assert!(snapshot.list.items.iter().all(|r| r.id != first));
    }

    #[tokio::test]
    async fn filters_apply_and_reset() {
        let (_store, manager) = manager();
        manager.create(input("Ana", 1)).await.unwrap();
        manager.create(input("Ana", 2)).await.unwrap();
        manager.create(input("Bo", 2)).await.unwrap();

        manager
            .apply_filters(DispatchFilter {
                driver: Some("Ana".to_string()),
                shift: None,
                date: Some("2025-04-02".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(manager.snapshot().await.list.total, 1);

        manager.reset_filters().await.unwrap();
        let snapshot = manager.snapshot().await;
        assert_eq!(snapshot.list.total, 3);
        assert_eq!(snapshot.filter, DispatchFilter::default());
    }

    #[tokio::test]
    async fn invalid_date_keeps_previous_filter() {
        let (store, manager) = manager();
        manager.ensure_loaded().await.unwrap();
        let reads = store.read_count();

        let result = manager
            .apply_filters(DispatchFilter {
                date: Some("not a date".to_string()),
                ..DispatchFilter::default()
            })
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert_eq!(store.read_count(), reads);
        assert_eq!(manager.snapshot().await.filter, DispatchFilter::default());
    }

    #[tokio::test]
    async fn failed_create_keeps_the_list() {
        let (store, manager) = manager();
        manager.create(input("Ana", 1)).await.unwrap();
        store.set_offline(true);

        assert!(manager.create(input("Bo", 2)).await.is_err());

        let snapshot = manager.snapshot().await;
        assert_eq!(snapshot.list.state, ViewState::Loaded);
        assert_eq!(snapshot.list.total, 1);
    }

    #[tokio::test]
    async fn options_are_cached_after_the_first_read() {
        let (store, manager) = manager();
        manager.options().await.unwrap();
        store.set_offline(true);
        assert!(manager.options().await.is_ok());
    }

    #[tokio::test]
    async fn forgotten_options_are_read_again() {
        let (store, manager) = manager();
        assert!(manager.options().await.unwrap().drivers.is_empty());
        let driver = json!({ "name": "Cata Soto", "national_id": "3-3", "license": "A4" });
        store
            .set(DRIVERS, "u-cata", driver.as_object().unwrap().clone())
            .await
            .unwrap();
        assert!(manager.options().await.unwrap().drivers.is_empty());

        manager.forget_options().await;
        assert_eq!(manager.options().await.unwrap().drivers.len(), 1);

        store.set(DRIVERS, "u-dan", driver.as_object().unwrap().clone()).await.unwrap();
        manager.reset().await;
        assert_eq!(manager.options().await.unwrap().drivers.len(), 2);
    }
}
