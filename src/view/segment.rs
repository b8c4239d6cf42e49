use chrono::{DateTime, Months, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::models::dispatch::{DispatchRecord, DispatchStatus, Timestamped};

/// Client-side predicate selecting the displayed subset of a list.
pub trait Segment<T>: Copy + PartialEq + std::fmt::Debug + Send + Sync {
    fn admits(&self, item: &T, now: DateTime<Utc>) -> bool;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusSegment {
    #[default]
    Pending,
    Completed,
    Rejected,
}

impl StatusSegment {
    pub fn status(&self) -> DispatchStatus {
        match self {
            StatusSegment::Pending => DispatchStatus::Pending,
            StatusSegment::Completed => DispatchStatus::Delivered,
            StatusSegment::Rejected => DispatchStatus::Rejected,
        }
    }
}

impl Segment<DispatchRecord> for StatusSegment {
    fn admits(&self, item: &DispatchRecord, _now: DateTime<Utc>) -> bool {
        item.status == self.status()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodSegment {
    Weekly,
    Monthly,
    #[default]
    Total,
}

impl PeriodSegment {
    /// Earliest admitted timestamp, inclusive.
    pub fn lower_bound(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            PeriodSegment::Weekly => Some(now - TimeDelta::days(7)),
            PeriodSegment::Monthly => now.checked_sub_months(Months::new(1)),
            PeriodSegment::Total => None,
        }
    }
}

impl<T: Timestamped> Segment<T> for PeriodSegment {
    fn admits(&self, item: &T, now: DateTime<Utc>) -> bool {
        self.lower_bound(now)
            .is_none_or(|bound| item.timestamp() >= bound)
    }
}

/// Admits everything; for lists filtered on the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unfiltered;

impl<T> Segment<T> for Unfiltered {
    fn admits(&self, _item: &T, _now: DateTime<Utc>) -> bool {
        true
    }
}
