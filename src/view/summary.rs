use chrono::Utc;
use tokio::sync::Mutex;

use super::driver_board::fetch_driver_dispatches;
use super::list::{run_load, FilteredList, ListSnapshot};
use super::segment::PeriodSegment;
use crate::auth::SessionResolver;
use crate::error::AppError;
use crate::models::dispatch::DispatchRecord;
use crate::notify::Notifier;
use crate::observability::metrics::Metrics;
use crate::services::dispatch::DispatchService;

const VIEW: &str = "driver_summary";

/// How many dispatches the signed-in driver handled this week, this month, or
/// ever.
pub struct DriverSummary {
    session: SessionResolver,
    dispatches: DispatchService,
    notifier: Notifier,
    metrics: Metrics,
    list: Mutex<FilteredList<DispatchRecord, PeriodSegment>>,
}

impl DriverSummary {
    pub fn new(
        session: SessionResolver,
        dispatches: DispatchService,
        notifier: Notifier,
        metrics: Metrics,
    ) -> Self {
        Self {
            session,
            dispatches,
            notifier,
            metrics,
            list: Mutex::new(FilteredList::new(PeriodSegment::default())),
        }
    }

    pub async fn load(&self) -> Result<(), AppError> {
        run_load(&self.list, VIEW, &self.metrics, &self.notifier, || {
            fetch_driver_dispatches(&self.session, &self.dispatches)
        })
        .await
    }

    pub async fn reset(&self) {
        self.list.lock().await.clear();
    }

    pub async fn ensure_loaded(&self) -> Result<(), AppError> {
        if self.list.lock().await.never_loaded() {
            self.load().await?;
        }
        Ok(())
    }

    pub async fn select_period(&self, period: PeriodSegment) {
        self.list.lock().await.select(period, Utc::now());
    }

    pub async fn snapshot(&self) -> ListSnapshot<DispatchRecord, PeriodSegment> {
        self.list.lock().await.snapshot()
    }
}
