use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Field names of a stored dispatch record.
pub mod fields {
    pub const DRIVER: &str = "driver";
    pub const STATUS: &str = "status";
    pub const TIMESTAMP: &str = "timestamp";
    pub const SHIFT: &str = "shift";
    pub const REJECTION_REASON: &str = "rejection_reason";
    pub const DELIVERED_AT: &str = "delivered_at";
    pub const REJECTED_AT: &str = "rejected_at";
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DispatchStatus {
    Pending,
    Delivered,
    Rejected,
}

impl DispatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchStatus::Pending => "Pending",
            DispatchStatus::Delivered => "Delivered",
            DispatchStatus::Rejected => "Rejected",
        }
    }

    /// Pending is the only state that can move, and only forward.
    pub fn transition_to(self, next: DispatchStatus) -> Result<DispatchStatus, AppError> {
        match (self, next) {
            (DispatchStatus::Pending, DispatchStatus::Delivered)
            | (DispatchStatus::Pending, DispatchStatus::Rejected) => Ok(next),
            (current, next) => Err(AppError::Conflict(format!(
                "dispatch cannot move from {current} to {next}"
            ))),
        }
    }
}

impl fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything that can be placed in a time window.
pub trait Timestamped {
    fn timestamp(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchRecord {
    pub id: String,
    /// Driver display name, not a reference to the driver profile.
    pub driver: String,
    pub status: DispatchStatus,
    pub timestamp: DateTime<Utc>,
    pub load_type: String,
    /// Destination store display name.
    pub store: String,
    pub vehicle: String,
    pub shift: String,
    pub round: String,
    #[serde(default)]
    pub management: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_at: Option<DateTime<Utc>>,
}

impl Timestamped for DispatchRecord {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Administrative input for a new dispatch record. New records always start
/// as Pending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDispatch {
    pub driver: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub load_type: String,
    #[serde(default)]
    pub store: String,
    #[serde(default)]
    pub vehicle: String,
    #[serde(default)]
    pub shift: String,
    #[serde(default)]
    pub round: String,
    #[serde(default)]
    pub management: String,
}

impl NewDispatch {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.driver.trim().is_empty() {
            return Err(AppError::BadRequest("driver cannot be empty".to_string()));
        }
        if self.store.trim().is_empty() {
            return Err(AppError::BadRequest("store cannot be empty".to_string()));
        }
        Ok(())
    }

    pub fn into_record(self) -> DispatchRecord {
        DispatchRecord {
            id: String::new(),
            driver: self.driver.trim().to_string(),
            status: DispatchStatus::Pending,
            timestamp: self.timestamp,
            load_type: self.load_type,
            store: self.store.trim().to_string(),
            vehicle: self.vehicle,
            shift: self.shift,
            round: self.round,
            management: self.management,
            rejection_reason: None,
            delivered_at: None,
            rejected_at: None,
        }
    }
}
