use std::fmt;

use serde::{Deserialize, Serialize};

use crate::backend::collections;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Vehicle,
    LoadType,
    Shift,
    Round,
    ManagementType,
    StatusLabel,
}

impl ReferenceKind {
    pub const ALL: [ReferenceKind; 6] = [
        ReferenceKind::Vehicle,
        ReferenceKind::LoadType,
        ReferenceKind::Shift,
        ReferenceKind::Round,
        ReferenceKind::ManagementType,
        ReferenceKind::StatusLabel,
    ];

    pub fn collection(&self) -> &'static str {
        match self {
            ReferenceKind::Vehicle => collections::VEHICLES,
            ReferenceKind::LoadType => collections::LOAD_TYPES,
            ReferenceKind::Shift => collections::SHIFTS,
            ReferenceKind::Round => collections::ROUNDS,
            ReferenceKind::ManagementType => collections::MANAGEMENT_TYPES,
            ReferenceKind::StatusLabel => collections::STATUSES,
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

/// Lookup entry used to populate selection inputs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceItem {
    pub id: String,
    pub name: String,
}
