use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map};
use tracing::{info, warn};

use super::reader::CollectionReader;
use crate::backend::collections::DISPATCH_RECORDS;
use crate::backend::query::parse_calendar_date;
use crate::backend::{Direction, Query};
use crate::error::AppError;
use crate::models::dispatch::{fields, DispatchRecord, DispatchStatus, NewDispatch};
use crate::observability::metrics::Metrics;

/// Server-side filters of the administrative dispatch list. Blank values mean
/// "no filter".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchFilter {
    #[serde(default)]
    pub driver: Option<String>,
    #[serde(default)]
    pub shift: Option<String>,
    /// Calendar date, `YYYY-MM-DD`, matched against the UTC day.
    #[serde(default)]
    pub date: Option<String>,
}

impl DispatchFilter {
    pub fn to_query(&self) -> Result<Query, AppError> {
        let mut query = Query::new().order_by(fields::TIMESTAMP, Direction::Descending);

        if let Some(driver) = non_blank(&self.driver) {
            query = query.where_eq(fields::DRIVER, driver);
        }
        if let Some(shift) = non_blank(&self.shift) {
            query = query.where_eq(fields::SHIFT, shift);
        }
        if let Some(raw) = non_blank(&self.date) {
            query = query.within_day(fields::TIMESTAMP, parse_calendar_date(raw)?);
        }

        Ok(query)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct DispatchService {
    reader: CollectionReader,
    metrics: Metrics,
}

impl DispatchService {
    pub fn new(reader: CollectionReader, metrics: Metrics) -> Self {
        Self { reader, metrics }
    }

    /// Records assigned to a driver, matched by the denormalized driver name.
    pub async fn for_driver(&self, driver_name: &str) -> Result<Vec<DispatchRecord>, AppError> {
        self.reader
            .list(
                DISPATCH_RECORDS,
                &Query::new()
                    .where_eq(fields::DRIVER, driver_name)
                    .order_by(fields::TIMESTAMP, Direction::Descending),
            )
            .await
    }

    pub async fn search(&self, filter: &DispatchFilter) -> Result<Vec<DispatchRecord>, AppError> {
        let query = filter.to_query()?;
        self.reader.list(DISPATCH_RECORDS, &query).await
    }

    /// Every dated record, newest first. Records without a timestamp are left
    /// out.
    pub async fn all(&self) -> Result<Vec<DispatchRecord>, AppError> {
        let query = Query::new().order_by(fields::TIMESTAMP, Direction::Descending);
        self.reader.list(DISPATCH_RECORDS, &query).await
    }

    pub async fn get(&self, id: &str) -> Result<DispatchRecord, AppError> {
        self.reader
            .get(DISPATCH_RECORDS, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("dispatch {id} not found")))
    }

    pub async fn create(&self, input: NewDispatch) -> Result<String, AppError> {
        input.validate()?;
        let record = input.into_record();
        let id = self.reader.create(DISPATCH_RECORDS, &record).await?;
        info!(dispatch_id = %id, driver = %record.driver, "dispatch created");
        Ok(id)
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.reader.delete(DISPATCH_RECORDS, id).await?;
        info!(dispatch_id = %id, "dispatch deleted");
        Ok(())
    }

    pub async fn mark_delivered(&self, id: &str) -> Result<(), AppError> {
        self.ensure_transition(id, DispatchStatus::Delivered).await?;

        let mut patch = Map::new();
        patch.insert(fields::STATUS.to_string(), json!(DispatchStatus::Delivered));
        patch.insert(fields::DELIVERED_AT.to_string(), json!(Utc::now()));
        self.reader.update(DISPATCH_RECORDS, id, patch).await?;

        self.count_transition(DispatchStatus::Delivered);
        info!(dispatch_id = %id, "dispatch delivered");
        Ok(())
    }

    /// The reason is checked before anything reaches the backend.
    pub async fn mark_rejected(&self, id: &str, reason: Option<&str>) -> Result<(), AppError> {
        let reason = reason
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
            .ok_or_else(|| AppError::BadRequest("a rejection reason is required".to_string()))?;

        self.ensure_transition(id, DispatchStatus::Rejected).await?;

        let mut patch = Map::new();
        patch.insert(fields::STATUS.to_string(), json!(DispatchStatus::Rejected));
        patch.insert(fields::REJECTION_REASON.to_string(), json!(reason));
        patch.insert(fields::REJECTED_AT.to_string(), json!(Utc::now()));
        self.reader.update(DISPATCH_RECORDS, id, patch).await?;

        self.count_transition(DispatchStatus::Rejected);
        info!(dispatch_id = %id, reason, "dispatch rejected");
        Ok(())
    }

    async fn ensure_transition(&self, id: &str, next: DispatchStatus) -> Result<(), AppError> {
        let current = self.get(id).await?;
        current.status.transition_to(next).map_err(|err| {
            warn!(dispatch_id = %id, from = %current.status, to = %next, "transition refused");
            err
        })?;
        Ok(())
    }

    fn count_transition(&self, status: DispatchStatus) {
        self.metrics
            .dispatch_transitions_total
            .with_label_values(&[&status.as_str().to_lowercase()])
            .inc();
    }
}
