use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use super::list::{run_load, FilteredList, ViewState};
use super::segment::{PeriodSegment, Segment};
use crate::error::AppError;
use crate::models::dispatch::{DispatchRecord, Timestamped};
use crate::models::driver::DriverProfile;
use crate::models::reference::{ReferenceItem, ReferenceKind};
use crate::models::store::Store;
use crate::notify::Notifier;
use crate::observability::metrics::Metrics;
use crate::services::directory::Directory;
use crate::services::dispatch::DispatchService;

const VIEW: &str = "dashboard";
pub const PAGE_SIZE: usize = 20;

/// Dispatch row with its references resolved to display values.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DispatchDetail {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub status: String,
    pub driver: String,
    pub driver_national_id: String,
    pub vehicle: String,
    pub load_type: String,
    pub store: String,
}

impl Timestamped for DispatchDetail {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PeriodCounts {
    pub total: usize,
    pub weekly: usize,
    pub monthly: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub state: ViewState,
    pub loading: bool,
    pub error: Option<String>,
    pub view: PeriodSegment,
    pub counts: PeriodCounts,
    /// Rows in the active view, of which `records` are shown.
    pub matching: usize,
    pub records: Vec<DispatchDetail>,
}

struct Lookups {
    drivers: Vec<DriverProfile>,
    vehicles: Vec<ReferenceItem>,
    load_types: Vec<ReferenceItem>,
    statuses: Vec<ReferenceItem>,
    stores: Vec<Store>,
}

impl Lookups {
    fn detail(&self, record: DispatchRecord) -> DispatchDetail {
        let driver = self
            .drivers
            .iter()
            .find(|d| d.id == record.driver || d.name == record.driver);
        let status = record.status.as_str().to_string();

        DispatchDetail {
            id: record.id,
            timestamp: record.timestamp,
            status: name_of(&self.statuses, &status).unwrap_or(status),
            driver: driver
                .map(|d| d.name.clone())
                .unwrap_or_else(|| record.driver.clone()),
            driver_national_id: driver.map(|d| d.national_id.clone()).unwrap_or_default(),
            vehicle: name_of(&self.vehicles, &record.vehicle).unwrap_or(record.vehicle),
            load_type: name_of(&self.load_types, &record.load_type).unwrap_or(record.load_type),
            store: self
                .stores
                .iter()
                .find(|s| s.id == record.store)
                .map(|s| s.name.clone())
                .unwrap_or(record.store),
        }
    }
}

fn name_of(items: &[ReferenceItem], id: &str) -> Option<String> {
    items
        .iter()
        .find(|item| item.id == id)
        .map(|item| item.name.clone())
}

/// Every dispatch, newest first, joined with reference data and counted per
/// period.
pub struct Dashboard {
    dispatches: DispatchService,
    directory: Directory,
    notifier: Notifier,
    metrics: Metrics,
    list: Mutex<FilteredList<DispatchDetail, PeriodSegment>>,
    visible: Mutex<usize>,
}

impl Dashboard {
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
            list: Mutex::new(FilteredList::new(PeriodSegment::Total)),
            visible: Mutex::new(PAGE_SIZE),
        }
    }

    pub async fn load(&self) -> Result<(), AppError> {
        run_load(&self.list, VIEW, &self.metrics, &self.notifier, || {
            self.fetch_details()
        })
        .await
    }

    pub async fn reset(&self) {
        self.list.lock().await.clear();
        *self.visible.lock().await = PAGE_SIZE;
    }

    pub async fn ensure_loaded(&self) -> Result<(), AppError> {
        if self.list.lock().await.never_loaded() {
            self.load().await?;
        }
        Ok(())
    }

    /// Switches the view and goes back to the first page. Selecting the
    /// active view keeps the current page.
    pub async fn select_view(&self, view: PeriodSegment) {
        let mut list = self.list.lock().await;
        if list.segment() == view {
            return;
        }
        list.select(view, Utc::now());
        drop(list);
        *self.visible.lock().await = PAGE_SIZE;
    }

    pub async fn show_more(&self) {
        *self.visible.lock().await += PAGE_SIZE;
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        let visible = *self.visible.lock().await;
        let list = self.list.lock().await;
        let now = Utc::now();

        let count = |period: PeriodSegment| {
            list.items()
                .iter()
                .filter(|detail| period.admits(*detail, now))
                .count()
        };
        let counts = PeriodCounts {
            total: list.items().len(),
            weekly: count(PeriodSegment::Weekly),
            monthly: count(PeriodSegment::Monthly),
        };
        let snapshot = list.snapshot();

        DashboardSnapshot {
            state: snapshot.state,
            loading: snapshot.loading,
            error: snapshot.error,
            view: snapshot.segment,
            counts,
            matching: snapshot.count,
            records: snapshot.items.into_iter().take(visible).collect(),
        }
    }

    async fn fetch_details(&self) -> Result<Vec<DispatchDetail>, AppError> {
        let (records, drivers, vehicles, load_types, statuses, stores) = futures::try_join!(
            self.dispatches.all(),
            self.directory.drivers(),
            self.directory.reference(ReferenceKind::Vehicle),
            self.directory.reference(ReferenceKind::LoadType),
            self.directory.reference(ReferenceKind::StatusLabel),
            self.directory.stores(),
        )?;

        let lookups = Lookups {
            drivers,
            vehicles,
            load_types,
            statuses,
            stores,
        };
        Ok(records
            .into_iter()
            .map(|record| lookups.detail(record))
            .collect())
    }
}
