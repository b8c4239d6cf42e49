use chrono::Utc;
use tokio::sync::Mutex;
use tracing::warn;

use super::list::{run_load, FilteredList, ListSnapshot};
use super::segment::StatusSegment;
use crate::auth::SessionResolver;
use crate::error::AppError;
use crate::models::dispatch::DispatchRecord;
use crate::notify::Notifier;
use crate::observability::metrics::Metrics;
use crate::services::dispatch::DispatchService;

const VIEW: &str = "driver_board";

/// The signed-in driver's dispatches, split into pending / completed /
/// rejected.
pub struct DriverBoard {
    session: SessionResolver,
    dispatches: DispatchService,
    notifier: Notifier,
    metrics: Metrics,
    list: Mutex<FilteredList<DispatchRecord, StatusSegment>>,
}

impl DriverBoard {
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
            list: Mutex::new(FilteredList::new(StatusSegment::default())),
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

    /// Loads on first use, then serves the in-memory list.
    pub async fn ensure_loaded(&self) -> Result<(), AppError> {
        if self.list.lock().await.never_loaded() {
            self.load().await?;
        }
        Ok(())
    }

    pub async fn select_segment(&self, segment: StatusSegment) {
        self.list.lock().await.select(segment, Utc::now());
    }

    pub async fn snapshot(&self) -> ListSnapshot<DispatchRecord, StatusSegment> {
        self.list.lock().await.snapshot()
    }

    pub async fn deliver(&self, id: &str) -> Result<(), AppError> {
        if let Err(err) = self.dispatches.mark_delivered(id).await {
            return Err(self.mutation_failed("deliver", id, err));
        }
        self.notifier.success("Delivered");
        self.load().await
    }

    /// Rejection needs a reason; without one nothing is written.
    pub async fn reject(&self, id: &str, reason: Option<&str>) -> Result<(), AppError> {
        if let Err(err) = self.dispatches.mark_rejected(id, reason).await {
            return Err(self.mutation_failed("reject", id, err));
        }
        self.notifier.warning("Rejected");
        self.load().await
    }

    fn mutation_failed(&self, action: &str, id: &str, err: AppError) -> AppError {
        warn!(action, dispatch_id = %id, error = %err, "dispatch mutation failed");
        self.notifier.danger(err.notice_text());
        err
    }
}

/// Resolves the signed-in driver's name, then reads the records carrying it.
pub(crate) async fn fetch_driver_dispatches(
    session: &SessionResolver,
    dispatches: &DispatchService,
) -> Result<Vec<DispatchRecord>, AppError> {
    let profile = session.driver_profile().await?;
    dispatches.for_driver(&profile.name).await
}
